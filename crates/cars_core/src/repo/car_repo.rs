//! SQLite implementation of the car repository.
//!
//! # Responsibility
//! - Translate repository calls into parameterized queries over `cars`.
//! - Map every result row through the single `map_car_row` routine.
//!
//! # Invariants
//! - Each call acquires its own connection and releases it, with its
//!   statement and cursor, on every exit path.
//! - Reads impose no ordering; callers must not rely on row order.

use std::time::Instant;

use log::{debug, error, trace};
use rusqlite::types::FromSql;
use rusqlite::{params, Connection, Params, Row};

use super::{CarRepository, RepoError, RepoResult, Repository};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{ConnectionProvider, DbError};
use crate::model::car::{Car, CarId};

const CARS_TABLE: &str = "cars";
const CARS_REQUIRED_COLUMNS: &[&str] = &["id", "manufacturer", "model", "year"];

const CAR_SELECT_SQL: &str = "SELECT
    id,
    manufacturer,
    model,
    year
FROM cars";

/// SQLite-backed car repository.
///
/// Owns a connection provider, never a connection.
pub struct SqliteCarRepository<P> {
    provider: P,
}

impl<P: ConnectionProvider> SqliteCarRepository<P> {
    /// Wraps `provider` without checking the store.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Wraps `provider` after verifying its store carries the cars schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` for a foreign schema.
    pub fn try_new(provider: P) -> RepoResult<Self> {
        let conn = provider.connection()?;
        ensure_connection_ready(&conn)?;
        drop(conn);
        Ok(Self { provider })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn with_conn<T, F>(&self, f: F) -> RepoResult<T>
    where
        F: FnOnce(&Connection) -> RepoResult<T>,
    {
        let conn = self.provider.connection()?;
        f(&conn)
    }

    fn query_cars<Q: Params>(&self, event: &str, sql: &str, params: Q) -> RepoResult<Vec<Car>> {
        let started_at = Instant::now();
        let result = self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query(params)?;
            let mut cars = Vec::new();
            while let Some(row) = rows.next()? {
                cars.push(map_car_row(row)?);
            }
            Ok(cars)
        });

        match &result {
            Ok(cars) => debug!(
                "event={event} module=repo status=ok duration_ms={} count={}",
                started_at.elapsed().as_millis(),
                cars.len()
            ),
            Err(err) => error!(
                "event={event} module=repo status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn execute<F>(&self, event: &str, f: F) -> RepoResult<usize>
    where
        F: FnOnce(&Connection) -> RepoResult<usize>,
    {
        let started_at = Instant::now();
        let result = self.with_conn(f);

        match &result {
            Ok(changed) => debug!(
                "event={event} module=repo status=ok duration_ms={} changed={changed}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={event} module=repo status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

impl<P: ConnectionProvider> Repository<CarId, Car> for SqliteCarRepository<P> {
    fn add(&self, car: &Car) -> RepoResult<Car> {
        trace!("event=car_add module=repo status=start car={car}");

        let mut assigned_id: CarId = 0;
        self.execute("car_add", |conn| {
            let changed = conn.execute(
                "INSERT INTO cars (manufacturer, model, year) VALUES (?1, ?2, ?3);",
                params![car.manufacturer.as_str(), car.model.as_str(), car.year],
            )?;
            assigned_id = conn.last_insert_rowid();
            Ok(changed)
        })?;

        Ok(Car {
            id: Some(assigned_id),
            ..car.clone()
        })
    }

    fn update(&self, id: CarId, car: &Car) -> RepoResult<usize> {
        trace!("event=car_update module=repo status=start id={id} car={car}");

        self.execute("car_update", |conn| {
            let changed = conn.execute(
                "UPDATE cars
                 SET
                    manufacturer = ?1,
                    model = ?2,
                    year = ?3
                 WHERE id = ?4;",
                params![car.manufacturer.as_str(), car.model.as_str(), car.year, id],
            )?;
            Ok(changed)
        })
    }

    fn find_all(&self) -> RepoResult<Vec<Car>> {
        trace!("event=car_find_all module=repo status=start");
        self.query_cars("car_find_all", &format!("{CAR_SELECT_SQL};"), params![])
    }
}

impl<P: ConnectionProvider> CarRepository for SqliteCarRepository<P> {
    fn find_by_manufacturer(&self, manufacturer: &str) -> RepoResult<Vec<Car>> {
        trace!("event=car_find_by_manufacturer module=repo status=start manufacturer={manufacturer}");
        self.query_cars(
            "car_find_by_manufacturer",
            &format!("{CAR_SELECT_SQL} WHERE manufacturer = ?1;"),
            [manufacturer],
        )
    }

    fn find_between_years(&self, min: i32, max: i32) -> RepoResult<Vec<Car>> {
        trace!("event=car_find_between_years module=repo status=start min={min} max={max}");
        self.query_cars(
            "car_find_between_years",
            &format!("{CAR_SELECT_SQL} WHERE year BETWEEN ?1 AND ?2;"),
            [min, max],
        )
    }
}

/// Maps one `cars` row to a `Car`. Shared by every read path.
fn map_car_row(row: &Row<'_>) -> RepoResult<Car> {
    Ok(Car {
        id: Some(column(row, "id")?),
        manufacturer: column(row, "manufacturer")?,
        model: column(row, "model")?,
        year: column(row, "year")?,
    })
}

fn column<T: FromSql>(row: &Row<'_>, name: &str) -> RepoResult<T> {
    row.get(name).map_err(|err| match err {
        rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..)
        | rusqlite::Error::FromSqlConversionFailure(..) => {
            RepoError::InvalidData(format!("{CARS_TABLE}.{name}: {err}"))
        }
        other => other.into(),
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version > expected_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: actual_version,
            latest_supported: expected_version,
        }
        .into());
    }
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [CARS_TABLE],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(CARS_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([CARS_TABLE], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if let Some(missing) = CARS_REQUIRED_COLUMNS
        .iter()
        .copied()
        .find(|required| !columns.iter().any(|column| column == required))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: CARS_TABLE,
            column: missing,
        });
    }

    Ok(())
}
