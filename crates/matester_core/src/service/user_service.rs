//! Login-addressed user use cases.
//!
//! # Responsibility
//! - Compose repository primitives into the entry points the API layer calls.
//! - Resolve logins to surrogate ids before id-based writes.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::user::{NewUser, User, UserProfile, UserValidationError};
use crate::repo::user_repo::{RepoResult, UserRepository};

/// Use-case service wrapper over a [`UserRepository`].
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Borrows the wrapped repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Creates an account and returns its freshly read profile.
    pub fn sign_up(&self, user: &NewUser) -> RepoResult<UserProfile> {
        self.repo.create_user(user)?;
        self.repo.get_user_profile(&user.login)
    }

    /// Checks a presented token against the stored credential.
    ///
    /// # Contract
    /// - Unknown login or missing credential propagates `NotFound`.
    /// - A mismatched token is `Ok(false)`, not an error.
    pub fn verify_token(&self, login: &str, token: &str) -> RepoResult<bool> {
        let credential = self.repo.authenticate(login)?;
        Ok(credential.token == token)
    }

    pub fn profile(&self, login: &str) -> RepoResult<UserProfile> {
        self.repo.get_user_profile(login)
    }

    pub fn users(&self) -> RepoResult<Vec<User>> {
        self.repo.list_users()
    }

    pub fn friends_of(&self, login: &str) -> RepoResult<Vec<User>> {
        let user_id = self.repo.resolve_user_id(login)?;
        self.repo.list_friends(user_id)
    }

    pub fn add_hobby_for(&self, login: &str, hobby: &str) -> RepoResult<()> {
        let user_id = self.repo.resolve_user_id(login)?;
        self.repo.add_hobby(user_id, hobby)
    }

    /// Records a friendship requested by `login` towards `friend_login`.
    ///
    /// Stores a single directed row; listings on either side see it.
    pub fn add_friend_by_login(&self, login: &str, friend_login: &str) -> RepoResult<()> {
        let user_id = self.repo.resolve_user_id(login)?;
        let friend_id = self.repo.resolve_user_id(friend_login)?;
        if user_id == friend_id {
            return Err(UserValidationError::SelfFriendship(user_id).into());
        }
        self.repo.add_friend(user_id, friend_id)
    }
}
