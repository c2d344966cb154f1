#![allow(dead_code)]

use matester_core::config::DbConfig;
use matester_core::{open_pool, open_pool_in_memory, DbPool, NewUser, SqliteUserRepository};
use std::path::Path;

pub const SCHEMA: &str = "
CREATE TABLE users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    login TEXT NOT NULL UNIQUE,
    first_name TEXT,
    last_name TEXT,
    birth_date TEXT,
    gender TEXT,
    city TEXT
);
CREATE TABLE auth (
    user_id INTEGER NOT NULL REFERENCES users(user_id),
    token TEXT NOT NULL
);
CREATE TABLE hobbies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE user2hobbies (
    user_id INTEGER NOT NULL REFERENCES users(user_id),
    hobby_id INTEGER NOT NULL REFERENCES hobbies(id)
);
CREATE TABLE friends (
    fst INTEGER NOT NULL REFERENCES users(user_id),
    snd INTEGER NOT NULL REFERENCES users(user_id)
);
";

pub fn create_schema(pool: &DbPool) {
    let conn = pool.get().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
}

pub fn memory_repo() -> SqliteUserRepository {
    let pool = open_pool_in_memory().unwrap();
    create_schema(&pool);
    SqliteUserRepository::try_new(pool).unwrap()
}

pub fn file_repo(path: &Path, max_connections: u32) -> SqliteUserRepository {
    let mut config = DbConfig::new(path);
    config.max_connections = max_connections;
    let pool = open_pool(&config).unwrap();
    create_schema(&pool);
    SqliteUserRepository::try_new(pool).unwrap()
}

pub fn count(pool: &DbPool, sql: &str) -> i64 {
    let conn = pool.get().unwrap();
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

pub fn new_user(login: &str, token: &str) -> NewUser {
    NewUser {
        first_name: format!("{login}-first"),
        last_name: format!("{login}-last"),
        birth_date: "1990-01-01".to_string(),
        gender: "f".to_string(),
        city: "Berlin".to_string(),
        ..NewUser::new(login, token)
    }
}
