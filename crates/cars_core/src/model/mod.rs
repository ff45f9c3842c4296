//! Domain model for the cars store.
//!
//! # Responsibility
//! - Define the entity values exchanged with the repository layer.
//!
//! # Invariants
//! - Entity identity is assigned by the store, never by callers.

pub mod car;
