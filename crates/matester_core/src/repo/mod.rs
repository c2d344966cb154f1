//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract consumed by services and the API layer.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`,
//!   `ConstraintViolation`) in addition to store transport errors.
//! - No repository call panics or silently degrades to an empty result.

pub mod user_repo;
