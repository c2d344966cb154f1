//! Domain records for users, credentials and profiles.
//!
//! # Responsibility
//! - Define the plain records exchanged with the API layer.
//! - Validate creation input before it reaches the store.
//!
//! # Invariants
//! - `login` is the business identity; `UserId` is a store-generated
//!   surrogate and never chosen by callers.

pub mod user;
