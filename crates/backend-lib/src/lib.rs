// ============================
// authgate-lib/src/lib.rs
// ============================
//! Core functionality for the `authgate` signup/signin server.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod security;
pub mod storage;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::auth::{
    AuthService, DefaultAuth, PasswordError, ScryptHasher, SessionCookies, TokenIssuer,
};
use crate::config::{ConfigError, Settings};
use crate::security::{AdmissionPolicy, LocalShield, TierLimits};
use crate::storage::UserStore;

pub use router::create_router;

/// Failures while assembling [`AppState`]
#[derive(Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Application state shared across all handlers
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Session token signer
    pub tokens: Arc<TokenIssuer>,
    /// Session cookie builder
    pub cookies: SessionCookies,
    /// Admission policy consulted by the rate limit middleware
    pub policy: Arc<dyn AdmissionPolicy>,
    /// Per-tier budgets
    pub limits: TierLimits,
    /// Settings the state was built from
    pub settings: Arc<Settings>,
    pub started_at: Instant,
}

impl AppState {
    /// Build the state over `store`, using the bundled [`LocalShield`] policy
    pub fn new(settings: Settings, store: Arc<dyn UserStore>) -> Result<Self, InitError> {
        let policy = Arc::new(LocalShield::from_settings(&settings.security));
        Self::with_policy(settings, store, policy)
    }

    /// Build the state with a caller-supplied admission policy
    pub fn with_policy(
        settings: Settings,
        store: Arc<dyn UserStore>,
        policy: Arc<dyn AdmissionPolicy>,
    ) -> Result<Self, InitError> {
        settings.validate()?;

        let hasher = ScryptHasher::new(settings.password.scrypt_log_n)?;
        let auth = Arc::new(DefaultAuth::new(store, hasher));
        let tokens = Arc::new(TokenIssuer::new(&settings.jwt.secret, settings.jwt.ttl()));
        let cookies = SessionCookies::new(settings.jwt.ttl(), settings.environment.is_production());
        let limits = TierLimits::from_settings(&settings.security);

        Ok(Self {
            auth,
            tokens,
            cookies,
            policy,
            limits,
            settings: Arc::new(settings),
            started_at: Instant::now(),
        })
    }
}
