//! Core data access for the cars store.
//! Connection provisioning, schema migrations and the car repository.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{ConfigError, StoreProperties};
pub use db::{ConnectionProvider, DbError, DbResult, SqliteConnectionProvider};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::car::{Car, CarId};
pub use repo::car_repo::SqliteCarRepository;
pub use repo::legacy::LegacyCarRepository;
pub use repo::{CarRepository, RepoError, RepoResult, Repository};
