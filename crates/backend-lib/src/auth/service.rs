use async_trait::async_trait;
use authgate_common::Role;
use thiserror::Error;

use crate::storage::{StoreError, User};

/// Domain failures of the auth service
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User with this email already exists")]
    EmailConflict,

    #[error("User not found")]
    NotFound,

    #[error("Invalid password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Input to [`AuthService::create_user`]; the email is already normalised
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// `None` stores the default role
    pub role: Option<Role>,
    pub password: String,
}

/// Input to [`AuthService::authenticate_user`]
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create a user, failing with [`AuthError::EmailConflict`] if the email is taken
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError>;

    /// Check credentials. Unknown email and wrong password are distinct errors here.
    async fn authenticate_user(&self, credentials: Credentials) -> Result<User, AuthError>;
}
