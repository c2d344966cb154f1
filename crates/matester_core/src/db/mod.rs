//! SQLite connection pool bootstrap.
//!
//! # Responsibility
//! - Build bounded `r2d2` pools over file or in-memory SQLite databases.
//! - Configure per-connection pragmas required by repository behavior.
//!
//! # Invariants
//! - Every pooled connection has `foreign_keys=ON`.
//! - Schema creation is owned by the deployment; this module never runs DDL.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod pool;

pub use pool::{open_pool, open_pool_in_memory, DbPool, PooledConnection};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Pool(r2d2::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Pool(err) => write!(f, "connection pool: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Pool(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<r2d2::Error> for DbError {
    fn from(value: r2d2::Error) -> Self {
        Self::Pool(value)
    }
}
