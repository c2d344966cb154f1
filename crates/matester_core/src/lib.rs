//! Data-access core for matester.
//! Users, credentials, hobbies and friendships over a pooled SQLite store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DbConfig};
pub use db::{open_pool, open_pool_in_memory, DbError, DbPool};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::user::{
    Credential, HobbyId, NewUser, User, UserId, UserProfile, UserValidationError,
};
pub use repo::user_repo::{RepoError, RepoResult, SqliteUserRepository, UserRepository};
pub use service::user_service::UserService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
