//! User, credential and profile records.
//!
//! # Invariants
//! - A `NewUser` with a blank login or an empty token is never persisted.
//! - Hobby names are stored trimmed.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Surrogate key of a row in `users`.
pub type UserId = i64;

/// Surrogate key of a row in `hobbies`.
pub type HobbyId = i64;

/// Persisted user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub gender: String,
    pub city: String,
}

/// Sign-up record: profile fields plus the token bound to the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub gender: String,
    pub city: String,
    #[serde(skip_serializing)]
    pub token: String,
}

impl NewUser {
    /// Creates a record with empty profile fields.
    pub fn new(login: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            first_name: String::new(),
            last_name: String::new(),
            birth_date: String::new(),
            gender: String::new(),
            city: String::new(),
            token: token.into(),
        }
    }

    /// Checks creation invariants.
    ///
    /// # Errors
    /// - `EmptyLogin` when `login` is blank after trimming.
    /// - `EmptyToken` when `token` is empty.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.login.trim().is_empty() {
            return Err(UserValidationError::EmptyLogin);
        }
        if self.token.is_empty() {
            return Err(UserValidationError::EmptyToken);
        }
        Ok(())
    }
}

/// Login paired with its stored token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub login: String,
    pub token: String,
}

/// User row plus linked hobby names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub hobbies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyLogin,
    EmptyToken,
    EmptyHobbyName,
    SelfFriendship(UserId),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLogin => write!(f, "login cannot be empty"),
            Self::EmptyToken => write!(f, "token cannot be empty"),
            Self::EmptyHobbyName => write!(f, "hobby name cannot be empty"),
            Self::SelfFriendship(id) => write!(f, "user {id} cannot befriend itself"),
        }
    }
}

impl Error for UserValidationError {}

/// Trims a hobby name, rejecting blank input.
pub fn normalize_hobby_name(name: &str) -> Result<&str, UserValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(UserValidationError::EmptyHobbyName);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{normalize_hobby_name, NewUser, UserValidationError};

    #[test]
    fn validate_rejects_blank_login_and_empty_token() {
        assert_eq!(
            NewUser::new("   ", "tok").validate(),
            Err(UserValidationError::EmptyLogin)
        );
        assert_eq!(
            NewUser::new("alice", "").validate(),
            Err(UserValidationError::EmptyToken)
        );
        assert!(NewUser::new("alice", "tok").validate().is_ok());
    }

    #[test]
    fn hobby_names_are_trimmed() {
        assert_eq!(normalize_hobby_name("  chess ").unwrap(), "chess");
        assert_eq!(
            normalize_hobby_name(" \t"),
            Err(UserValidationError::EmptyHobbyName)
        );
    }
}
