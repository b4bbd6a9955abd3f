use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;

pub mod error;
pub mod ledger;
pub mod models;
pub mod schema;
pub mod users;

pub use error::LedgerError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct ConnectionCustomizer;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        // A writer blocked by another immediate transaction waits instead of failing.
        conn.batch_execute(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 30000;",
        )
        .map_err(r2d2::Error::QueryError)
    }
}

pub fn establish_connection_pool(database_url: &str) -> Result<DbPool, LedgerError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .max_size(8)
        .connection_timeout(Duration::from_secs(30))
        .connection_customizer(Box::new(ConnectionCustomizer))
        .build(manager)?;
    info!("Opened database {}", database_url);
    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), LedgerError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| LedgerError::Migration(e.to_string()))?;

    if applied.is_empty() {
        info!("No pending migrations");
    }
    for version in &applied {
        info!("Applied migration {}", version);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// A migrated pool over a fresh database file; keep the `TempDir` alive.
    pub fn test_pool() -> (DbPool, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finance.db");
        let pool = establish_connection_pool(path.to_str().unwrap()).unwrap();
        run_migrations(&pool).unwrap();
        (pool, dir)
    }
}
