use shared::data::Registration;
use thiserror::Error;
use uuid::Uuid;

pub mod convert;
pub mod entities;
pub mod fairing;
pub mod memory;
pub mod postgres;

pub use memory::MemoryRegistrationStore;
pub use postgres::PgRegistrationStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A registration with that plate number already exists.")]
    DuplicateKey,
    #[error("No registration matched the given id.")]
    NotFound,
    #[error("An error occured whilst trying to access the database: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// Keyed storage of plate registrations.
///
/// Implementations must enforce plate number uniqueness themselves: the check
/// and the write of `insert` and `update_by_id` happen as one operation, so
/// two concurrent writers can never both store the same plate number.
#[rocket::async_trait]
pub trait RegistrationStore: Send + Sync {
    /// All records in insertion order.
    async fn find_all(&self) -> Result<Vec<Registration>, StoreError>;

    async fn find_by_plate_number(
        &self,
        plate_number: &str,
    ) -> Result<Option<Registration>, StoreError>;

    /// Stores a new record with a fresh id and the current time.
    async fn insert(&self, plate_number: &str, owner_name: &str)
        -> Result<Registration, StoreError>;

    async fn update_by_id(
        &self,
        id: Uuid,
        plate_number: &str,
        owner_name: &str,
    ) -> Result<(), StoreError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError>;
}
