use std::sync::Arc;

use async_trait::async_trait;
use tokio::task;
use tracing::debug;
use zeroize::Zeroize;

use super::password::ScryptHasher;
use super::service::{AuthError, AuthService, Credentials, NewUser};
use crate::storage::{NewUserRecord, StoreError, User, UserStore};

/// Auth service over any [`UserStore`]
pub struct DefaultAuth {
    store: Arc<dyn UserStore>,
    hasher: ScryptHasher,
}

impl DefaultAuth {
    pub fn new(store: Arc<dyn UserStore>, hasher: ScryptHasher) -> Self {
        Self { store, hasher }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        if self.store.find_by_email(&new_user.email).await?.is_some() {
            return Err(AuthError::EmailConflict);
        }

        // scrypt is CPU bound; keep it off the async workers
        let hasher = self.hasher;
        let mut password = new_user.password;
        let password_hash = task::spawn_blocking(move || hasher.hash_secure(&mut password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let record = NewUserRecord {
            name: new_user.name,
            email: new_user.email,
            role: new_user.role.unwrap_or_default(),
            password_hash,
        };

        // a concurrent signup can still win the race to the unique index
        let user = self.store.insert(record).await.map_err(|e| match e {
            StoreError::Duplicate => AuthError::EmailConflict,
            other => AuthError::Store(other),
        })?;

        debug!(user_id = user.id, "user created");
        Ok(user)
    }

    async fn authenticate_user(&self, credentials: Credentials) -> Result<User, AuthError> {
        let Credentials { email, mut password } = credentials;

        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let hasher = self.hasher;
        let hash = user.password_hash.clone();
        let matches = task::spawn_blocking(move || {
            let ok = hasher.verify(&hash, &password);
            password.zeroize();
            ok
        })
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !matches {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user)
    }
}
