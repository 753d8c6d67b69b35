use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{NewUserRecord, StoreError, User, UserStore};

#[derive(Default)]
struct Inner {
    next_id: i64,
    by_email: HashMap<String, User>,
}

/// In-process store used by tests and `--memory` runs
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_email.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.by_email.get(email).cloned())
    }

    async fn insert(&self, record: NewUserRecord) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(&record.email) {
            return Err(StoreError::Duplicate);
        }

        // ids start at 1 like a SERIAL column
        inner.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_id,
            name: record.name,
            email: record.email,
            role: record.role,
            password_hash: record.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.by_email.insert(user.email.clone(), user.clone());
        Ok(user)
    }
}
