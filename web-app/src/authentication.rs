use argon2::{Argon2, PasswordHash, PasswordVerifier};
use base64::{engine::general_purpose::STANDARD, Engine};
use rocket::{
    fairing::{self, Fairing, Info, Kind},
    http::Status,
    request::{FromRequest, Outcome},
    serde::json::Json,
    Build, Request, Rocket, State,
};
use shared::data::{Credentials, Message};

use crate::{config::AdminConfig, error::Error};

/// Verifies admin credentials against the configured Argon2 hash. No session
/// or token is issued; every admin request carries its credentials.
pub struct AdminGate {
    admin: Option<AdminConfig>,
}

impl AdminGate {
    pub fn new(admin: Option<AdminConfig>) -> Self {
        Self { admin }
    }

    pub fn is_enabled(&self) -> bool {
        self.admin.is_some()
    }

    /// Surrounding whitespace in the username is ignored, the password is
    /// compared as given.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Some(admin) = &self.admin else {
            return false;
        };
        if admin.username != username.trim() {
            return false;
        }

        match PasswordHash::new(&admin.password_hash) {
            Ok(hash) => Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok(),
            Err(e) => {
                error!("The configured admin password hash is invalid: {e}");
                false
            }
        }
    }
}

pub struct Authentication {}

impl Authentication {
    pub(crate) fn fairing() -> Self {
        Self {}
    }
}

#[rocket::async_trait]
impl Fairing for Authentication {
    fn info(&self) -> Info {
        Info {
            name: "Authentication",
            kind: Kind::Ignite | Kind::Singleton,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        let admin = match rocket.figment().extract_inner::<Option<AdminConfig>>("admin") {
            Ok(admin) => admin,
            Err(e) if e.missing() => None,
            Err(e) => {
                error!("Invalid admin configuration: {e}");
                return Err(rocket);
            }
        };

        if let Some(admin) = &admin {
            if let Err(e) = PasswordHash::new(&admin.password_hash) {
                error!("The configured admin password hash is invalid: {e}");
                return Err(rocket);
            }
            info!("Admin routes require credentials for '{}'.", admin.username);
        } else {
            warn!("No admin configured, admin routes are open.");
        }

        Ok(rocket
            .manage(AdminGate::new(admin))
            .mount("/", routes![login]))
    }
}

#[post("/login", data = "<credentials>")]
fn login(credentials: Json<Credentials>, gate: &State<AdminGate>) -> Result<Json<Message>, Error> {
    if !gate.is_enabled() {
        return Err(Error::LoginDisabled);
    }

    let username = credentials.username.as_deref().unwrap_or_default();
    let password = credentials.password.as_deref().unwrap_or_default();
    if gate.verify(username, password) {
        Ok(Json(Message::new("Login successful")))
    } else {
        Err(Error::LoginFailed)
    }
}

/// Request guard for admin-only routes. Succeeds without credentials when no
/// admin is configured.
pub struct Admin;

/// Auth schemes are case-insensitive (RFC 9110).
fn basic_credentials(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.into(), password.into()))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Admin {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(gate) = req.rocket().state::<AdminGate>() else {
            return Outcome::Error((Status::InternalServerError, Error::AdminGateMissing));
        };
        if !gate.is_enabled() {
            return Outcome::Success(Admin);
        }

        let Some((username, password)) = req
            .headers()
            .get_one("Authorization")
            .and_then(basic_credentials)
        else {
            return Outcome::Error((Status::Unauthorized, Error::Unauthorized));
        };

        if gate.verify(&username, &password) {
            Outcome::Success(Admin)
        } else {
            Outcome::Error((Status::Unauthorized, Error::Unauthorized))
        }
    }
}
