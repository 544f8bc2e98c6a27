use std::sync::Arc;

use rocket::{
    fairing::{self, Fairing, Info, Kind},
    Build, Orbit, Rocket,
};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    config::{AppConfig, StorageKind},
    migrator,
    service::RegistrationService,
};

use super::{MemoryRegistrationStore, PgRegistrationStore, RegistrationStore};

/// Opens the configured registration store and manages a
/// [`RegistrationService`] on top of it.
pub struct DatabaseFairing;

impl DatabaseFairing {
    pub fn fairing() -> Self {
        Self
    }
}

async fn connect(config: &AppConfig) -> Option<PgPool> {
    let db = match PgPoolOptions::new()
        .max_connections(config.max_connections)
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await
    {
        Ok(db) => db,
        Err(e) => {
            error!(
                "Failed to connect to database ({}): {e}",
                config.database_url
            );
            return None;
        }
    };

    match migrator::migrate(&db).await {
        Ok(0) => info!("Database schema is up to date."),
        Ok(applied) => info!("{applied} database migrations succesfully applied!"),
        Err(e) => {
            error!("Failed to apply pending migrations: {e}");
            return None;
        }
    }

    Some(db)
}

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "Database",
            kind: Kind::Ignite | Kind::Shutdown | Kind::Singleton,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        let config = match AppConfig::from_rocket(&rocket) {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid application configuration: {e}");
                return Err(rocket);
            }
        };

        let (store, pool): (Arc<dyn RegistrationStore>, Option<PgPool>) = match config.storage {
            StorageKind::Memory => {
                warn!("Using in-memory storage, registrations are lost on shutdown.");
                (Arc::new(MemoryRegistrationStore::default()), None)
            }
            StorageKind::Postgres => {
                let Some(db) = connect(&config).await else {
                    return Err(rocket);
                };
                (Arc::new(PgRegistrationStore::new(db.clone())), Some(db))
            }
        };

        let rocket = rocket.manage(RegistrationService::new(store));
        Ok(match pool {
            Some(pool) => rocket.manage(pool),
            None => rocket,
        })
    }

    async fn on_shutdown(&self, rocket: &Rocket<Orbit>) {
        if let Some(pool) = rocket.state::<PgPool>() {
            info!("Closing database connections.");
            pool.close().await;
        }
    }
}
