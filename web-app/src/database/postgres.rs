use chrono::Utc;
use shared::data::Registration;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use super::{entities::registration, RegistrationStore, StoreError};

pub struct PgRegistrationStore {
    pool: Pool<Postgres>,
}

impl PgRegistrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations come from the `registrations_plate_number_key` constraint.
fn map_write_error(error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            StoreError::DuplicateKey
        }
        _ => StoreError::Unavailable(error),
    }
}

#[rocket::async_trait]
impl RegistrationStore for PgRegistrationStore {
    async fn find_all(&self) -> Result<Vec<Registration>, StoreError> {
        let rows = sqlx::query_as::<_, registration::Model>(
            "SELECT id, plate_number, owner_name, created_at FROM registrations \
             ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Registration::from).collect())
    }

    async fn find_by_plate_number(
        &self,
        plate_number: &str,
    ) -> Result<Option<Registration>, StoreError> {
        let row = sqlx::query_as::<_, registration::Model>(
            "SELECT id, plate_number, owner_name, created_at FROM registrations \
             WHERE plate_number = $1",
        )
        .bind(plate_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Registration::from))
    }

    async fn insert(
        &self,
        plate_number: &str,
        owner_name: &str,
    ) -> Result<Registration, StoreError> {
        let row = sqlx::query_as::<_, registration::Model>(
            "INSERT INTO registrations (id, plate_number, owner_name, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, plate_number, owner_name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(plate_number)
        .bind(owner_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        plate_number: &str,
        owner_name: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE registrations SET plate_number = $2, owner_name = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(plate_number)
        .bind(owner_name)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
