//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `matester_core` linkage and store reachability from a shell.
//! - Keep output deterministic for quick local sanity checks.

use matester_core::config::LOG_DIR_ENV;
use matester_core::{open_pool, DbConfig, SqliteUserRepository, UserRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("matester_core version={}", matester_core::core_version());

    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = matester_core::init_logging(matester_core::default_log_level(), &log_dir)
        {
            eprintln!("logging disabled: {err}");
        }
    }

    match probe() {
        Ok(users) => {
            println!("store status=ok users={users}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("store status=error error={err}");
            ExitCode::FAILURE
        }
    }
}

fn probe() -> Result<usize, Box<dyn std::error::Error>> {
    let config = DbConfig::from_env()?;
    let repo = SqliteUserRepository::try_new(open_pool(&config)?)?;
    let users = repo.list_users()?.len();
    log::info!("event=cli_probe module=cli status=ok users={}", users);
    repo.close();
    Ok(users)
}
