//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Serve every read/write against `users`, `auth`, `hobbies`,
//!   `user2hobbies` and `friends`.
//! - Map store failures into typed, recoverable repository errors.
//!
//! # Invariants
//! - Each operation checks out exactly one pooled connection and returns it
//!   on every path.
//! - Multi-statement writes run in one immediate transaction; a failed step
//!   rolls the whole flow back.
//! - Friend listings are symmetric: a `(fst, snd)` row is visible from both
//!   sides.

use crate::db::{DbError, DbPool, PooledConnection};
use crate::model::user::{
    normalize_hobby_name, Credential, HobbyId, NewUser, User, UserId, UserProfile,
    UserValidationError,
};
use log::{debug, error, info, warn};
use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const USER_SELECT_SQL: &str = "SELECT
    u.user_id,
    u.login,
    u.first_name,
    u.last_name,
    u.birth_date,
    u.gender,
    u.city
FROM users u";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "users",
        &[
            "user_id",
            "login",
            "first_name",
            "last_name",
            "birth_date",
            "gender",
            "city",
        ],
    ),
    ("auth", &["user_id", "token"]),
    ("hobbies", &["id", "name"]),
    ("user2hobbies", &["user_id", "hobby_id"]),
    ("friends", &["fst", "snd"]),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for user, hobby and friend persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(UserValidationError),
    /// No row matches a unique lookup key.
    NotFound {
        entity: &'static str,
        key: String,
    },
    /// Insert rejected by a uniqueness or foreign key rule.
    ConstraintViolation(String),
    /// Store unreachable, pool exhausted, or statement failed for transport reasons.
    Connectivity(DbError),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    fn user_not_found(login: &str) -> Self {
        Self::NotFound {
            entity: "user",
            key: login.to_string(),
        }
    }

    fn hobby_not_found(name: &str) -> Self {
        Self::NotFound {
            entity: "hobby",
            key: name.to_string(),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::Connectivity(err) => write!(f, "store unavailable: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Connectivity(err) => Some(err),
            Self::NotFound { .. }
            | Self::ConstraintViolation(_)
            | Self::InvalidData(_)
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if value.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            return Self::ConstraintViolation(value.to_string());
        }
        match value {
            rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::Utf8Error(_) => Self::InvalidData(value.to_string()),
            other => Self::Connectivity(DbError::Sqlite(other)),
        }
    }
}

impl From<r2d2::Error> for RepoError {
    fn from(value: r2d2::Error) -> Self {
        Self::Connectivity(DbError::Pool(value))
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            DbError::Pool(err) => err.into(),
        }
    }
}

/// Repository interface for accounts, credentials, hobbies and friendships.
pub trait UserRepository {
    /// Looks up the surrogate id of `login`.
    fn resolve_user_id(&self, login: &str) -> RepoResult<UserId>;
    /// Looks up the surrogate id of a hobby by its trimmed name.
    fn resolve_hobby_id(&self, name: &str) -> RepoResult<HobbyId>;
    /// Returns the token stored for `login`.
    fn authenticate(&self, login: &str) -> RepoResult<Credential>;
    /// Creates the user row and its credential atomically.
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId>;
    fn get_user(&self, login: &str) -> RepoResult<User>;
    fn get_user_profile(&self, login: &str) -> RepoResult<UserProfile>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Lists users linked to `user_id` from either side of `friends`.
    fn list_friends(&self, user_id: UserId) -> RepoResult<Vec<User>>;
    fn list_hobbies(&self, user_id: UserId) -> RepoResult<Vec<String>>;
    /// Links a hobby to a user, creating the hobby on first use.
    fn add_hobby(&self, user_id: UserId, hobby_name: &str) -> RepoResult<()>;
    /// Inserts one directed friend row; no mirror row is written.
    fn add_friend(&self, user_id: UserId, friend_id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository over a shared connection pool.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    /// Constructs a repository after verifying the consumed schema.
    ///
    /// # Errors
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the database
    ///   does not carry the expected tables.
    /// - `Connectivity` when no connection can be checked out.
    pub fn try_new(pool: DbPool) -> RepoResult<Self> {
        let repo = Self { pool };
        {
            let conn = repo.checkout("schema_check")?;
            ensure_schema_ready(&conn)?;
        }
        Ok(repo)
    }

    /// Underlying pool handle.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Releases this repository's pool handle.
    ///
    /// Connections close once the last clone of the pool is dropped.
    pub fn close(self) {
        let state = self.pool.state();
        info!(
            "event=db_close module=repo status=ok connections={} idle={}",
            state.connections, state.idle_connections
        );
        drop(self.pool);
    }

    fn checkout(&self, op: &str) -> RepoResult<PooledConnection> {
        self.pool.get().map_err(|err| {
            error!(
                "event=db_checkout module=repo status=error op={} error_code=pool_timeout error={}",
                op, err
            );
            RepoError::from(err)
        })
    }
}

impl UserRepository for SqliteUserRepository {
    fn resolve_user_id(&self, login: &str) -> RepoResult<UserId> {
        let conn = self.checkout("resolve_user_id")?;
        query_user_id(&conn, login)
    }

    fn resolve_hobby_id(&self, name: &str) -> RepoResult<HobbyId> {
        let name = normalize_hobby_name(name)?;
        let conn = self.checkout("resolve_hobby_id")?;
        query_hobby_id(&conn, name)
    }

    fn authenticate(&self, login: &str) -> RepoResult<Credential> {
        let conn = self.checkout("authenticate")?;
        let user_id = query_user_id(&conn, login)?;
        let token: Option<String> = conn
            .query_row(
                "SELECT token FROM auth WHERE user_id = ?1 LIMIT 1;",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        match token {
            Some(token) => Ok(Credential {
                login: login.to_string(),
                token,
            }),
            None => {
                warn!(
                    "event=authenticate module=repo status=error user_id={} error_code=credential_missing",
                    user_id
                );
                Err(RepoError::NotFound {
                    entity: "credential",
                    key: login.to_string(),
                })
            }
        }
    }

    fn create_user(&self, user: &NewUser) -> RepoResult<UserId> {
        user.validate()?;
        let started_at = Instant::now();

        let mut conn = self.checkout("create_user")?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = insert_user_with_credential(&tx, user);

        match created {
            Ok(user_id) => {
                tx.commit()?;
                info!(
                    "event=user_create module=repo status=ok user_id={} duration_ms={}",
                    user_id,
                    started_at.elapsed().as_millis()
                );
                Ok(user_id)
            }
            Err(err) => {
                // Dropping `tx` rolls back the partial user row.
                warn!(
                    "event=user_create module=repo status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn get_user(&self, login: &str) -> RepoResult<User> {
        let conn = self.checkout("get_user")?;
        query_user(&conn, login)
    }

    fn get_user_profile(&self, login: &str) -> RepoResult<UserProfile> {
        let mut conn = self.checkout("get_user_profile")?;
        // Deferred read transaction: user row and hobbies come from one snapshot.
        let tx = conn.transaction()?;
        let user = query_user(&tx, login)?;
        let hobbies = query_hobbies(&tx, user.id)?;
        tx.commit()?;
        Ok(UserProfile { user, hobbies })
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let conn = self.checkout("list_users")?;
        let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} ORDER BY u.user_id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        debug!("event=list_users module=repo status=ok count={}", users.len());
        Ok(users)
    }

    fn list_friends(&self, user_id: UserId) -> RepoResult<Vec<User>> {
        let conn = self.checkout("list_friends")?;
        let mut stmt = conn.prepare(&format!(
            "{USER_SELECT_SQL}
             INNER JOIN (
                SELECT fst AS friend_id FROM friends WHERE snd = ?1
                UNION
                SELECT snd AS friend_id FROM friends WHERE fst = ?1
             ) fr ON u.user_id = fr.friend_id
             ORDER BY u.user_id ASC;"
        ))?;
        let mut rows = stmt.query([user_id])?;
        let mut friends = Vec::new();
        while let Some(row) = rows.next()? {
            friends.push(parse_user_row(row)?);
        }
        debug!(
            "event=list_friends module=repo status=ok user_id={} count={}",
            user_id,
            friends.len()
        );
        Ok(friends)
    }

    fn list_hobbies(&self, user_id: UserId) -> RepoResult<Vec<String>> {
        let conn = self.checkout("list_hobbies")?;
        query_hobbies(&conn, user_id)
    }

    fn add_hobby(&self, user_id: UserId, hobby_name: &str) -> RepoResult<()> {
        let name = normalize_hobby_name(hobby_name)?;

        let mut conn = self.checkout("add_hobby")?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let hobby_id = match query_hobby_id(&tx, name) {
            Ok(id) => id,
            Err(RepoError::NotFound { .. }) => {
                tx.execute("INSERT INTO hobbies (name) VALUES (?1);", [name])?;
                let id = query_hobby_id(&tx, name)?;
                debug!("event=hobby_create module=repo status=ok hobby_id={}", id);
                id
            }
            Err(err) => return Err(err),
        };
        tx.execute(
            "INSERT INTO user2hobbies (user_id, hobby_id) VALUES (?1, ?2);",
            params![user_id, hobby_id],
        )?;
        tx.commit()?;

        info!(
            "event=hobby_link module=repo status=ok user_id={} hobby_id={}",
            user_id, hobby_id
        );
        Ok(())
    }

    fn add_friend(&self, user_id: UserId, friend_id: UserId) -> RepoResult<()> {
        let conn = self.checkout("add_friend")?;
        conn.execute(
            "INSERT INTO friends (fst, snd) VALUES (?1, ?2);",
            params![user_id, friend_id],
        )?;
        info!(
            "event=friend_link module=repo status=ok fst={} snd={}",
            user_id, friend_id
        );
        Ok(())
    }
}

fn insert_user_with_credential(tx: &Transaction<'_>, user: &NewUser) -> RepoResult<UserId> {
    tx.execute(
        "INSERT INTO users (login, first_name, last_name, birth_date, gender, city)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            user.login.as_str(),
            user.first_name.as_str(),
            user.last_name.as_str(),
            user.birth_date.as_str(),
            user.gender.as_str(),
            user.city.as_str(),
        ],
    )?;
    let user_id = query_user_id(tx, &user.login)?;
    tx.execute(
        "INSERT INTO auth (user_id, token) VALUES (?1, ?2);",
        params![user_id, user.token.as_str()],
    )?;
    Ok(user_id)
}

fn query_user_id(conn: &Connection, login: &str) -> RepoResult<UserId> {
    conn.query_row(
        "SELECT user_id FROM users WHERE login = ?1;",
        [login],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| RepoError::user_not_found(login))
}

fn query_hobby_id(conn: &Connection, name: &str) -> RepoResult<HobbyId> {
    conn.query_row("SELECT id FROM hobbies WHERE name = ?1;", [name], |row| {
        row.get(0)
    })
    .optional()?
    .ok_or_else(|| RepoError::hobby_not_found(name))
}

fn query_user(conn: &Connection, login: &str) -> RepoResult<User> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE u.login = ?1 LIMIT 1;"))?;
    let mut rows = stmt.query([login])?;
    match rows.next()? {
        Some(row) => parse_user_row(row),
        None => Err(RepoError::user_not_found(login)),
    }
}

fn query_hobbies(conn: &Connection, user_id: UserId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT h.name
         FROM user2hobbies uh
         INNER JOIN hobbies h ON h.id = uh.hobby_id
         WHERE uh.user_id = ?1
         ORDER BY h.name ASC, h.id ASC;",
    )?;
    let mut rows = stmt.query([user_id])?;
    let mut hobbies = Vec::new();
    while let Some(row) = rows.next()? {
        hobbies.push(row.get(0)?);
    }
    Ok(hobbies)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let login: Option<String> = row.get("login")?;
    let login = login
        .filter(|value| !value.is_empty())
        .ok_or_else(|| RepoError::InvalidData("empty login in users.login".to_string()))?;

    Ok(User {
        id: row.get("user_id")?,
        login,
        first_name: text_or_empty(row, "first_name")?,
        last_name: text_or_empty(row, "last_name")?,
        birth_date: text_or_empty(row, "birth_date")?,
        gender: text_or_empty(row, "gender")?,
        city: text_or_empty(row, "city")?,
    })
}

fn text_or_empty(row: &Row<'_>, column: &str) -> RepoResult<String> {
    Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
}

fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
