//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for the cars store.
//! - Isolate SQLite query details from callers.
//!
//! # Invariants
//! - Every fallible repository call returns `RepoResult`; "no rows" is
//!   `Ok`, never an error, and failures are never reported as "no rows".
//! - Swallow-and-log semantics live only in [`legacy::LegacyCarRepository`].

use crate::db::DbError;
use crate::model::car::{Car, CarId};
use thiserror::Error;

pub mod car_repo;
pub mod legacy;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for car persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Store access failure: connection, malformed query or constraint.
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("invalid persisted car data: {0}")]
    InvalidData(String),

    #[error("connection schema version {actual_version} does not match expected {expected_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },

    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),

    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Entity-agnostic write and scan operations.
pub trait Repository<Id, E> {
    /// Inserts `entity` and returns it with its store-assigned id.
    fn add(&self, entity: &E) -> RepoResult<E>;
    /// Overwrites the row with `id`; returns the number of rows changed.
    fn update(&self, id: Id, entity: &E) -> RepoResult<usize>;
    fn find_all(&self) -> RepoResult<Vec<E>>;
}

/// Car-specific finders on top of [`Repository`].
pub trait CarRepository: Repository<CarId, Car> {
    /// Cars whose manufacturer equals `manufacturer` exactly.
    fn find_by_manufacturer(&self, manufacturer: &str) -> RepoResult<Vec<Car>>;
    /// Cars with `min <= year <= max`; empty when `min > max`.
    fn find_between_years(&self, min: i32, max: i32) -> RepoResult<Vec<Car>>;
}
