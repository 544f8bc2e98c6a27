use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Model {
    pub id: Uuid,
    pub plate_number: String,
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
}
