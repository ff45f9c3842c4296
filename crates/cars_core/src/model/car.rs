//! Car entity.
//!
//! # Responsibility
//! - Plain value holder for one row of the `cars` table.
//!
//! # Invariants
//! - `id` is `None` until the store has assigned one on insert.
//! - A persisted `id` is unique across all stored cars.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned row identifier.
pub type CarId = i64;

/// One car as seen by callers of the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Car {
    /// Row id; meaningless (and `None`) before insertion.
    #[serde(default)]
    pub id: Option<CarId>,
    pub manufacturer: String,
    pub model: String,
    pub year: i32,
}

impl Car {
    /// Creates a transient car that has not been stored yet.
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>, year: i32) -> Self {
        Self {
            id: None,
            manufacturer: manufacturer.into(),
            model: model.into(),
            year,
        }
    }

    /// Rebuilds a car that already has a store-assigned id.
    pub fn with_id(
        id: CarId,
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        year: i32,
    ) -> Self {
        Self {
            id: Some(id),
            ..Self::new(manufacturer, model, year)
        }
    }

    /// Returns whether this value came from (or was written to) the store.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl Display for Car {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(id) = self.id {
            write!(f, "#{id} ")?;
        }
        write!(f, "{} {} ({})", self.manufacturer, self.model, self.year)
    }
}
