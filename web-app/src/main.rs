#![allow(clippy::no_effect_underscore_binding)]
use authentication::{Admin, Authentication};
use rocket::{
    figment::Figment,
    http::Status,
    serde::json::Json,
    Build, Catcher, Request, Rocket, Route, State,
};
use shared::data::{
    Created, DeleteRegistration, ErrorBody, Message, NewRegistration, Page, Registration,
    UpdateRegistration,
};

use database::fairing::DatabaseFairing;
use error::Error;
use service::{RegistrationService, SearchQuery};

mod authentication;
mod config;
mod database;
mod error;
mod migrator;
mod service;

#[cfg(test)]
mod tests;

#[macro_use]
extern crate rocket;

#[get("/registrations")]
async fn list_registrations(
    service: &State<RegistrationService>,
) -> Result<Json<Vec<Registration>>, Error> {
    Ok(Json(service.list().await?))
}

#[get("/registrations/search?<q>&<page>&<per_page>")]
async fn search_registrations(
    q: Option<String>,
    page: Option<usize>,
    per_page: Option<usize>,
    service: &State<RegistrationService>,
) -> Result<Json<Page<Registration>>, Error> {
    let query = SearchQuery {
        query: q,
        page,
        per_page,
    };
    Ok(Json(service.search(&query).await?))
}

#[post("/registrations", data = "<registration>")]
async fn post_registration(
    registration: Json<NewRegistration>,
    service: &State<RegistrationService>,
) -> Result<Json<Created>, Error> {
    let created = service
        .register(
            registration.plate_number.as_deref(),
            registration.owner_name.as_deref(),
        )
        .await?;
    info!("Registered plate {}", created.plate_number);

    Ok(Json(Created {
        message: "Plate registered successfully".into(),
        id: created.id,
    }))
}

#[put("/registrations", data = "<registration>")]
async fn put_registration(
    _admin: Admin,
    registration: Json<UpdateRegistration>,
    service: &State<RegistrationService>,
) -> Result<Json<Message>, Error> {
    service
        .update(
            registration.id.as_deref(),
            registration.plate_number.as_deref(),
            registration.owner_name.as_deref(),
        )
        .await?;
    Ok(Json(Message::new("Plate updated successfully")))
}

#[delete("/registrations", data = "<registration>")]
async fn delete_registration(
    _admin: Admin,
    registration: Json<DeleteRegistration>,
    service: &State<RegistrationService>,
) -> Result<Json<Message>, Error> {
    service.remove(registration.id.as_deref()).await?;
    Ok(Json(Message::new("Plate deleted successfully")))
}

/// Errors raised before a handler runs (guards, unparsable bodies, unknown
/// routes) are answered in the same JSON shape as handler errors. A body that
/// is not valid JSON counts as a bad request.
#[catch(default)]
fn default_catcher(status: Status, _: &Request<'_>) -> (Status, Json<ErrorBody>) {
    let (status, error) = match status.code {
        401 => (status, "Admin credentials are required".to_string()),
        400 | 422 => (Status::BadRequest, "Malformed request body".to_string()),
        _ => (status, status.reason_lossy().to_string()),
    };
    (status, Json(ErrorBody { error }))
}

fn routes() -> Vec<Route> {
    routes![
        list_registrations,
        search_registrations,
        post_registration,
        put_registration,
        delete_registration,
    ]
}

fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

fn build(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(DatabaseFairing::fairing())
        .attach(Authentication::fairing())
        .mount("/", routes())
        .register("/", catchers())
}

#[launch]
fn rocket() -> _ {
    build(rocket::Config::figment())
}
