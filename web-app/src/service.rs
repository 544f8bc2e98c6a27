use std::sync::Arc;

use shared::data::{Page, Registration};
use thiserror::Error;
use uuid::Uuid;

use crate::database::{RegistrationStore, StoreError};

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Missing fields: {0}")]
    Validation(&'static str),
    #[error("Plate number already registered")]
    Conflict(String),
    #[error("No registration with id '{0}' exists")]
    NotFound(String),
    #[error("Database error")]
    StorageUnavailable(#[source] StoreError),
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// Validation and orchestration on top of a [`RegistrationStore`]. This is the
/// only component that talks to the store.
pub struct RegistrationService {
    store: Arc<dyn RegistrationStore>,
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ServiceError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ServiceError::Validation(field)),
    }
}

/// Ids that are not valid UUIDs can never match a stored record.
fn parse_id(id: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(id).map_err(|_| ServiceError::NotFound(id.into()))
}

impl RegistrationService {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Registration>, ServiceError> {
        self.store
            .find_all()
            .await
            .map_err(ServiceError::StorageUnavailable)
    }

    /// Case-insensitive substring search over plate number and owner name,
    /// followed by pagination. Pages start at 1; a page past the end is empty.
    pub async fn search(&self, query: &SearchQuery) -> Result<Page<Registration>, ServiceError> {
        let needle = query
            .query
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .unwrap_or_default();
        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let page = query.page.unwrap_or(1).max(1);

        let matching: Vec<Registration> = self
            .list()
            .await?
            .into_iter()
            .filter(|record| {
                needle.is_empty()
                    || record.plate_number.to_lowercase().contains(&needle)
                    || record.owner_name.to_lowercase().contains(&needle)
            })
            .collect();

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Ok(Page {
            items,
            total,
            page,
            per_page,
            total_pages: total.div_ceil(per_page),
        })
    }

    pub async fn register(
        &self,
        plate_number: Option<&str>,
        owner_name: Option<&str>,
    ) -> Result<Registration, ServiceError> {
        let plate_number = required(plate_number, "plateNumber")?;
        let owner_name = required(owner_name, "ownerName")?;

        // The store enforces uniqueness on insert as well; this lookup only
        // exists to answer the common case without attempting the write.
        if self
            .store
            .find_by_plate_number(plate_number)
            .await
            .map_err(ServiceError::StorageUnavailable)?
            .is_some()
        {
            return Err(ServiceError::Conflict(plate_number.into()));
        }

        match self.store.insert(plate_number, owner_name).await {
            Ok(registration) => Ok(registration),
            Err(StoreError::DuplicateKey) => Err(ServiceError::Conflict(plate_number.into())),
            Err(e) => Err(ServiceError::StorageUnavailable(e)),
        }
    }

    /// Replaces plate number and owner name of an existing record. Uniqueness
    /// of the new plate number is not checked here; a collision is rejected
    /// by the store and reported as [`ServiceError::Conflict`].
    pub async fn update(
        &self,
        id: Option<&str>,
        plate_number: Option<&str>,
        owner_name: Option<&str>,
    ) -> Result<(), ServiceError> {
        let id = required(id, "id")?;
        let plate_number = required(plate_number, "plateNumber")?;
        let owner_name = required(owner_name, "ownerName")?;

        match self
            .store
            .update_by_id(parse_id(id)?, plate_number, owner_name)
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(ServiceError::NotFound(id.into())),
            Err(StoreError::DuplicateKey) => Err(ServiceError::Conflict(plate_number.into())),
            Err(e) => Err(ServiceError::StorageUnavailable(e)),
        }
    }

    pub async fn remove(&self, id: Option<&str>) -> Result<(), ServiceError> {
        let id = required(id, "id")?;

        match self.store.delete_by_id(parse_id(id)?).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(ServiceError::NotFound(id.into())),
            Err(e) => Err(ServiceError::StorageUnavailable(e)),
        }
    }
}
