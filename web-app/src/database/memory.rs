use chrono::Utc;
use rocket::tokio::sync::RwLock;
use shared::data::Registration;
use uuid::Uuid;

use super::{RegistrationStore, StoreError};

/// Store that keeps every record in process memory. Nothing survives a
/// restart.
#[derive(Default)]
pub struct MemoryRegistrationStore {
    records: RwLock<Vec<Registration>>,
}

#[rocket::async_trait]
impl RegistrationStore for MemoryRegistrationStore {
    async fn find_all(&self) -> Result<Vec<Registration>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn find_by_plate_number(
        &self,
        plate_number: &str,
    ) -> Result<Option<Registration>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|record| record.plate_number == plate_number)
            .cloned())
    }

    async fn insert(
        &self,
        plate_number: &str,
        owner_name: &str,
    ) -> Result<Registration, StoreError> {
        let mut records = self.records.write().await;
        if records
            .iter()
            .any(|record| record.plate_number == plate_number)
        {
            return Err(StoreError::DuplicateKey);
        }

        let registration = Registration {
            id: Uuid::new_v4(),
            plate_number: plate_number.into(),
            owner_name: owner_name.into(),
            created_at: Utc::now(),
        };
        records.push(registration.clone());
        Ok(registration)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        plate_number: &str,
        owner_name: &str,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let Some(index) = records.iter().position(|record| record.id == id) else {
            return Err(StoreError::NotFound);
        };
        if records
            .iter()
            .any(|record| record.id != id && record.plate_number == plate_number)
        {
            return Err(StoreError::DuplicateKey);
        }

        let record = &mut records[index];
        record.plate_number = plate_number.into();
        record.owner_name = owner_name.into();
        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
