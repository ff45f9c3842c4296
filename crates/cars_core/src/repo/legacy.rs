//! Compatibility adapter with swallow-and-log failure semantics.
//!
//! # Responsibility
//! - Expose the historical car repository contract: reads return plain
//!   vectors, writes return nothing.
//!
//! # Invariants
//! - Every failure is logged at `error` level before being discarded.
//! - A failed read yields an empty vector; a failed write is a no-op.
//! - New callers should use [`CarRepository`] directly; failures here are
//!   indistinguishable from "no rows".

use log::error;

use super::{CarRepository, RepoResult};
use crate::model::car::{Car, CarId};

/// Wraps a [`CarRepository`] and discards its errors after logging them.
pub struct LegacyCarRepository<R> {
    inner: R,
}

impl<R: CarRepository> LegacyCarRepository<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn find_by_manufacturer(&self, manufacturer: &str) -> Vec<Car> {
        swallow("car_find_by_manufacturer", self.inner.find_by_manufacturer(manufacturer))
            .unwrap_or_default()
    }

    pub fn find_between_years(&self, min: i32, max: i32) -> Vec<Car> {
        swallow("car_find_between_years", self.inner.find_between_years(min, max))
            .unwrap_or_default()
    }

    pub fn find_all(&self) -> Vec<Car> {
        swallow("car_find_all", self.inner.find_all()).unwrap_or_default()
    }

    /// Inserts `car`; the assigned id is not reported back.
    pub fn add(&self, car: &Car) {
        let _ = swallow("car_add", self.inner.add(car));
    }

    /// Overwrites row `id`; a missing row and a failure both look the same.
    pub fn update(&self, id: CarId, car: &Car) {
        let _ = swallow("car_update", self.inner.update(id, car));
    }
}

fn swallow<T>(event: &str, result: RepoResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!("event={event} module=legacy status=error swallowed=true error={err}");
            None
        }
    }
}
