use std::collections::HashSet;

use rocket::futures::TryStreamExt;
use sqlx::{Executor, Pool, Postgres};
use thiserror::Error;

use crate::database::entities::migration;

struct Migration {
    name: &'static str,
    statements: &'static str,
}

macro_rules! migration {
    ($name:literal) => {
        Migration {
            name: $name,
            statements: include_str!($name),
        }
    };
}

/// Applied in order. The version of a migration is its position in this list
/// plus one, so entries must only ever be appended.
static MIGRATIONS: &[Migration] = &[migration!("migration_000001_initial.sql")];

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Could not read the applied migrations: {0}")]
    Bookkeeping(#[from] sqlx::Error),
    #[error("Failed to apply migration '{name}': {source}")]
    Apply {
        name: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

fn pending(applied: &HashSet<i32>) -> Vec<(i32, &'static Migration)> {
    MIGRATIONS
        .iter()
        .zip(1..)
        .filter(|(_, version)| !applied.contains(version))
        .map(|(migration, version)| (version, migration))
        .collect()
}

/// Applies every migration not yet recorded in the `migrations` table and
/// returns how many were applied. Each migration runs in its own transaction.
pub async fn migrate(db: &Pool<Postgres>) -> Result<usize, MigrationError> {
    db.execute(
        "CREATE TABLE IF NOT EXISTS migrations (\
            version INTEGER PRIMARY KEY, \
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    )
    .await?;

    let applied: HashSet<i32> =
        sqlx::query_as::<_, migration::Model>("SELECT version, applied_at FROM migrations")
            .fetch_all(db)
            .await?
            .into_iter()
            .map(|model| model.version)
            .collect();

    let pending = pending(&applied);
    info!("{} database migrations pending.", pending.len());

    for (version, migration) in &pending {
        let apply = |source| MigrationError::Apply {
            name: migration.name,
            source,
        };

        let mut tx = db.begin().await.map_err(apply)?;
        (&mut *tx)
            .execute_many(migration.statements)
            .try_collect::<Vec<_>>()
            .await
            .map_err(apply)?;
        sqlx::query("INSERT INTO migrations (version) VALUES ($1)")
            .bind(*version)
            .execute(&mut *tx)
            .await
            .map_err(apply)?;
        tx.commit().await.map_err(apply)?;

        info!("Applied migration {version} ({})", migration.name);
    }

    Ok(pending.len())
}
