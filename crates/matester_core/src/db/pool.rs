//! Pool construction for SQLite.
//!
//! # Responsibility
//! - Open file-backed or in-memory pools with bounded size and lifetime.
//! - Apply connection pragmas through the manager init hook.
//!
//! # Invariants
//! - `open_pool` fails fast when the first connection cannot be established.
//! - The in-memory pool holds exactly one long-lived connection, otherwise
//!   every checkout would see a different empty database.

use super::DbResult;
use crate::config::DbConfig;
use log::{error, info};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared, clonable handle to the connection pool.
pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

/// Connection checked out from [`DbPool`]; returned to the pool on drop.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Opens a pool over the database file named by `config`.
///
/// # Side effects
/// - Establishes the initial idle connections eagerly.
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool(config: &DbConfig) -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=file max_connections={}",
        config.max_connections
    );

    let manager = SqliteConnectionManager::file(&config.database_path).with_init(configure);
    let built = r2d2::Pool::builder()
        .max_size(config.max_connections)
        .max_lifetime(Some(config.max_lifetime))
        .connection_timeout(config.connection_timeout)
        .build(manager);

    finish_open("file", started_at, built)
}

/// Opens a single-connection pool over a private in-memory database.
///
/// Operations that hold one connection for their whole unit of work are
/// safe on this pool; a caller holding a checkout while invoking the
/// repository will wait for the checkout timeout.
pub fn open_pool_in_memory() -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory max_connections=1");

    let manager = SqliteConnectionManager::memory().with_init(configure);
    let built = r2d2::Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .max_lifetime(None)
        .idle_timeout(None)
        .build(manager);

    finish_open("memory", started_at, built)
}

fn finish_open(
    mode: &str,
    started_at: Instant,
    built: Result<DbPool, r2d2::Error>,
) -> DbResult<DbPool> {
    match built {
        Ok(pool) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(pool)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}

fn configure(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)
}
