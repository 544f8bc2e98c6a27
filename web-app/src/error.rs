use std::io::Cursor;

use rocket::{
    http::{ContentType, Status},
    response::{self, Responder},
    Request, Response,
};
use shared::data::ErrorBody;
use thiserror::Error;

use crate::service::ServiceError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Invalid username or password")]
    LoginFailed,
    #[error("Admin login is not configured")]
    LoginDisabled,
    #[error("Admin credentials are required")]
    Unauthorized,
    #[error("The admin gate was not initialised")]
    AdminGateMissing,
}

pub trait ErrorResponder {
    fn response(&self) -> (Status, String);
}

impl ErrorResponder for Error {
    fn response(&self) -> (Status, String) {
        (
            match self {
                Error::Service(service) => return service.response(),
                Error::LoginFailed | Error::LoginDisabled | Error::Unauthorized => {
                    Status::Unauthorized
                }
                Error::AdminGateMissing => Status::InternalServerError,
            },
            self.to_string(),
        )
    }
}

impl ErrorResponder for ServiceError {
    fn response(&self) -> (Status, String) {
        (
            match self {
                ServiceError::Validation(_) => Status::BadRequest,
                ServiceError::Conflict(_) => Status::Conflict,
                ServiceError::NotFound(_) => Status::NotFound,
                ServiceError::StorageUnavailable(_) => Status::InternalServerError,
            },
            // Only the generic message, the store error stays in the log.
            self.to_string(),
        )
    }
}

pub fn json_body(status: Status, error: String) -> response::Result<'static> {
    let body = serde_json::to_string(&ErrorBody { error }).map_err(|e| {
        error!("Failed to serialize error body: {e}");
        Status::InternalServerError
    })?;
    Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(body.len(), Cursor::new(body))
        .ok()
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        if let Error::Service(ServiceError::StorageUnavailable(source)) = &self {
            error!("{} {}: {source}", request.method(), request.uri());
        }
        let (status, body) = self.response();
        json_body(status, body)
    }
}
