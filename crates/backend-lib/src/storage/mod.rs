// ============================
// authgate-lib/src/storage/mod.rs
// ============================
//! Credential store abstraction with PostgreSQL and in-memory backends.
use async_trait::async_trait;
use authgate_common::{Role, UserView};
use chrono::{DateTime, Utc};
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Errors raised by a credential store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique key (the email) already exists
    #[error("Duplicate record")]
    Duplicate,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let duplicate = err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if duplicate {
            StoreError::Duplicate
        } else {
            StoreError::Database(err)
        }
    }
}

/// A persisted user
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// scrypt PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public fields only
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Fields supplied when inserting a user; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

/// Trait for credential store backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by normalised email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user. Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn insert(&self, record: NewUserRecord) -> Result<User, StoreError>;
}
