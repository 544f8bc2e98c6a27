use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use rocket::{
    http::{ContentType, Header, Status},
    local::asynchronous::{Client, LocalResponse},
};
use serde_json::{json, Value};
use shared::data::Registration;
use uuid::Uuid;

use crate::{
    config::AdminConfig,
    database::{RegistrationStore, StoreError},
    service::RegistrationService,
};

fn memory_figment() -> rocket::figment::Figment {
    rocket::Config::figment()
        .merge(("storage", "memory"))
        .merge(("log_level", "off"))
}

async fn open_client() -> Client {
    Client::tracked(super::build(memory_figment()))
        .await
        .expect("valid rocket instance")
}

async fn admin_client(password: &str) -> Client {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string();
    let figment = memory_figment().merge((
        "admin",
        AdminConfig {
            username: "admin".into(),
            password_hash,
        },
    ));
    Client::tracked(super::build(figment))
        .await
        .expect("valid rocket instance")
}

fn basic(username: &str, password: &str) -> Header<'static> {
    Header::new(
        "Authorization",
        format!("Basic {}", STANDARD.encode(format!("{username}:{password}"))),
    )
}

async fn body_json(response: LocalResponse<'_>) -> Value {
    response.into_json::<Value>().await.expect("json body")
}

async fn register(client: &Client, plate: &str, owner: &str) -> (Status, Value) {
    let response = client
        .post("/registrations")
        .header(ContentType::JSON)
        .body(json!({ "plateNumber": plate, "ownerName": owner }).to_string())
        .dispatch()
        .await;
    (response.status(), body_json(response).await)
}

async fn list(client: &Client) -> Vec<Registration> {
    let response = client.get("/registrations").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    response.into_json().await.expect("registration list")
}

#[rocket::async_test]
async fn register_then_list() {
    let client = open_client().await;

    let (status, body) = register(&client, "ABC1234", "John Doe").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["message"], "Plate registered successfully");
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    let all = list(&client).await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].plate_number, "ABC1234");
    assert_eq!(all[0].owner_name, "John Doe");
}

#[rocket::async_test]
async fn listing_serializes_iso_timestamps() {
    let client = open_client().await;
    register(&client, "ABC1234", "John Doe").await;

    let response = client.get("/registrations").dispatch().await;
    let body = body_json(response).await;
    let created_at = body[0]["createdAt"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
    assert!(body[0]["plateNumber"].is_string());
}

#[rocket::async_test]
async fn register_trims_plate_number() {
    let client = open_client().await;
    let (status, _) = register(&client, "  XYZ999  ", "Jane Roe").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(list(&client).await[0].plate_number, "XYZ999");
}

#[rocket::async_test]
async fn duplicate_plate_conflicts() {
    let client = open_client().await;
    register(&client, "ABC1234", "John Doe").await;

    let (status, body) = register(&client, "ABC1234 ", "Jane Roe").await;
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "Plate number already registered");
    assert_eq!(list(&client).await.len(), 1);
}

#[rocket::async_test]
async fn missing_or_blank_fields_are_rejected() {
    let client = open_client().await;

    let (status, _) = register(&client, "ABC1234", "   ").await;
    assert_eq!(status, Status::BadRequest);

    let response = client
        .post("/registrations")
        .header(ContentType::JSON)
        .body(r#"{"plateNumber": "ABC1234"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let response = client
        .post("/registrations")
        .header(ContentType::JSON)
        .body("not json")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert!(body_json(response).await["error"].is_string());

    assert!(list(&client).await.is_empty());
}

#[rocket::async_test]
async fn update_and_delete_lifecycle() {
    let client = open_client().await;
    let (_, body) = register(&client, "ABC1234", "John Doe").await;
    let id = body["id"].as_str().unwrap().to_string();

    let response = client
        .put("/registrations")
        .header(ContentType::JSON)
        .body(json!({ "id": id, "plateNumber": "NEW1", "ownerName": " Jane Roe " }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(body_json(response).await["message"], "Plate updated successfully");

    let all = list(&client).await;
    assert_eq!(all[0].plate_number, "NEW1");
    assert_eq!(all[0].owner_name, "Jane Roe");

    let delete = || {
        client
            .delete("/registrations")
            .header(ContentType::JSON)
            .body(json!({ "id": id }).to_string())
            .dispatch()
    };
    let response = delete().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(body_json(response).await["message"], "Plate deleted successfully");
    assert!(list(&client).await.is_empty());

    assert_eq!(delete().await.status(), Status::NotFound);
}

#[rocket::async_test]
async fn update_unknown_id_is_not_found() {
    let client = open_client().await;
    register(&client, "ABC1234", "John Doe").await;
    let before = list(&client).await;

    for id in [Uuid::new_v4().to_string(), "garbage".to_string()] {
        let response = client
            .put("/registrations")
            .header(ContentType::JSON)
            .body(json!({ "id": id, "plateNumber": "XYZ999", "ownerName": "Jane" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    let response = client
        .put("/registrations")
        .header(ContentType::JSON)
        .body(json!({ "plateNumber": "XYZ999", "ownerName": "Jane" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    assert_eq!(list(&client).await, before);
}

#[rocket::async_test]
async fn update_onto_taken_plate_conflicts() {
    let client = open_client().await;
    register(&client, "ABC1234", "John Doe").await;
    let (_, body) = register(&client, "XYZ999", "Jane Roe").await;

    let response = client
        .put("/registrations")
        .header(ContentType::JSON)
        .body(json!({ "id": body["id"], "plateNumber": "ABC1234", "ownerName": "Jane Roe" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let plates: Vec<String> = list(&client)
        .await
        .into_iter()
        .map(|r| r.plate_number)
        .collect();
    assert_eq!(plates, vec!["ABC1234", "XYZ999"]);
}

#[rocket::async_test]
async fn delete_without_id_is_bad_request() {
    let client = open_client().await;
    let response = client
        .delete("/registrations")
        .header(ContentType::JSON)
        .body("{}")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn search_pages_results() {
    let client = open_client().await;
    for i in 0..12 {
        register(&client, &format!("CAR{i:02}"), "Owner").await;
    }
    register(&client, "BIKE1", "Alice").await;

    let response = client
        .get("/registrations/search?q=car&page=2&per_page=5")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body = body_json(response).await;
    assert_eq!(body["total"], 12);
    assert_eq!(body["page"], 2);
    assert_eq!(body["perPage"], 5);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["items"][0]["plateNumber"], "CAR05");

    let response = client.get("/registrations/search").dispatch().await;
    assert_eq!(body_json(response).await["total"], 13);
}

#[rocket::async_test]
async fn admin_routes_require_credentials_when_configured() {
    let client = admin_client("s3cret").await;
    let (_, body) = register(&client, "ABC1234", "John Doe").await;
    let payload = json!({ "id": body["id"] }).to_string();

    let response = client
        .delete("/registrations")
        .header(ContentType::JSON)
        .body(payload.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(
        body_json(response).await["error"],
        "Admin credentials are required"
    );

    let response = client
        .delete("/registrations")
        .header(ContentType::JSON)
        .header(basic("admin", "wrong"))
        .body(payload.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(list(&client).await.len(), 1);

    let response = client
        .delete("/registrations")
        .header(ContentType::JSON)
        .header(basic("admin", "s3cret"))
        .body(payload)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert!(list(&client).await.is_empty());
}

#[rocket::async_test]
async fn guard_and_login_normalise_credentials_alike() {
    let client = admin_client("s3cret").await;
    let (_, body) = register(&client, "ABC1234", "John Doe").await;

    let response = client
        .post("/login")
        .header(ContentType::JSON)
        .body(json!({ "username": " admin ", "password": "s3cret" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .delete("/registrations")
        .header(ContentType::JSON)
        .header(Header::new(
            "Authorization",
            format!("basic {}", STANDARD.encode(" admin :s3cret")),
        ))
        .body(json!({ "id": body["id"] }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert!(list(&client).await.is_empty());
}

#[rocket::async_test]
async fn login_checks_credentials() {
    let client = admin_client("s3cret").await;
    let login = |password: &'static str| {
        client
            .post("/login")
            .header(ContentType::JSON)
            .body(json!({ "username": "admin", "password": password }).to_string())
            .dispatch()
    };

    assert_eq!(login("s3cret").await.status(), Status::Ok);
    assert_eq!(login("admin123").await.status(), Status::Unauthorized);

    let client = open_client().await;
    let response = client
        .post("/login")
        .header(ContentType::JSON)
        .body(json!({ "username": "admin", "password": "admin123" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

struct UnavailableStore;

#[rocket::async_trait]
impl RegistrationStore for UnavailableStore {
    async fn find_all(&self) -> Result<Vec<Registration>, StoreError> {
        Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_plate_number(&self, _: &str) -> Result<Option<Registration>, StoreError> {
        Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
    }

    async fn insert(&self, _: &str, _: &str) -> Result<Registration, StoreError> {
        Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
    }

    async fn update_by_id(&self, _: Uuid, _: &str, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
    }

    async fn delete_by_id(&self, _: Uuid) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
    }
}

#[rocket::async_test]
async fn storage_failures_are_generic_server_errors() {
    let rocket = rocket::custom(memory_figment())
        .manage(RegistrationService::new(Arc::new(UnavailableStore)))
        .mount("/", super::routes())
        .register("/", super::catchers());
    let client = Client::tracked(rocket).await.expect("valid rocket instance");

    let response = client.get("/registrations").dispatch().await;
    assert_eq!(response.status(), Status::InternalServerError);
    assert_eq!(body_json(response).await["error"], "Database error");

    let (status, body) = register(&client, "ABC1234", "John Doe").await;
    assert_eq!(status, Status::InternalServerError);
    assert_eq!(body["error"], "Database error");
}
