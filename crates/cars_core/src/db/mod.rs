//! SQLite storage bootstrap, schema migrations and connection provisioning.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the cars store.
//! - Apply schema migrations in deterministic order.
//! - Hand out one fresh connection per repository call.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repository code must not read/write `cars` before migrations succeed.

use thiserror::Error;

use crate::config::ConfigError;

pub mod migrations;
mod open;
pub mod provider;

pub use open::{open_db, open_db_in_memory, open_db_with_timeout, DEFAULT_BUSY_TIMEOUT};
pub use provider::{ConnectionProvider, SqliteConnectionProvider};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },

    #[error("invalid store configuration: {0}")]
    Config(#[from] ConfigError),
}
