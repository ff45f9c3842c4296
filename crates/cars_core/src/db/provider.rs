//! Per-call connection provisioning.
//!
//! # Responsibility
//! - Turn a `StoreProperties` set into live SQLite connections.
//! - Give every repository call its own connection.
//!
//! # Invariants
//! - `connection()` never returns a connection shared with another caller.
//! - Credentials are passed through untouched and never logged.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use rusqlite::Connection;

use super::{open_db_with_timeout, DbResult, DEFAULT_BUSY_TIMEOUT};
use crate::config::{StoreProperties, DB_BUSY_TIMEOUT_MS, DB_URL};

/// URL prefixes accepted in front of a SQLite database path.
const URL_PREFIXES: &[&str] = &["jdbc:sqlite:", "sqlite://", "sqlite:"];

/// Supplies a live, ready-to-query connection to the store.
pub trait ConnectionProvider {
    fn connection(&self) -> DbResult<Connection>;
}

impl<F> ConnectionProvider for F
where
    F: Fn() -> DbResult<Connection>,
{
    fn connection(&self) -> DbResult<Connection> {
        self()
    }
}

/// Opens a fresh migrated connection to one SQLite database file per call.
#[derive(Debug, Clone)]
pub struct SqliteConnectionProvider {
    path: PathBuf,
    busy_timeout: Duration,
    properties: StoreProperties,
}

impl SqliteConnectionProvider {
    /// Builds a provider from store properties.
    ///
    /// The database is opened once here so that a bad path or an
    /// incompatible schema fails at construction, not on first use.
    ///
    /// # Errors
    /// - `db.url` is missing or `db.busy_timeout_ms` is not a number.
    /// - The database cannot be opened or migrated.
    pub fn from_properties(properties: &StoreProperties) -> DbResult<Self> {
        info!(
            "event=provider_init module=db status=start properties={}",
            properties.redacted()
        );

        let path = resolve_db_path(properties.require(DB_URL)?);
        let busy_timeout = properties
            .get_u64(DB_BUSY_TIMEOUT_MS)?
            .map_or(DEFAULT_BUSY_TIMEOUT, Duration::from_millis);

        let provider = Self {
            path,
            busy_timeout,
            properties: properties.clone(),
        };
        drop(provider.connection()?);

        info!(
            "event=provider_init module=db status=ok path={}",
            provider.path.display()
        );
        Ok(provider)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    /// Properties this provider was built from, verbatim.
    pub fn properties(&self) -> &StoreProperties {
        &self.properties
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    fn connection(&self) -> DbResult<Connection> {
        open_db_with_timeout(&self.path, self.busy_timeout)
    }
}

fn resolve_db_path(url: &str) -> PathBuf {
    let url = url.trim();
    let path = URL_PREFIXES
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))
        .unwrap_or(url);
    PathBuf::from(path)
}
