// ============================
// authgate-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod cookie;
pub mod password;
pub mod token;
mod service;
mod service_impl;

pub use cookie::SessionCookies;
pub use password::{verify_password, PasswordError, ScryptHasher};
pub use service::{AuthError, AuthService, Credentials, NewUser};
pub use service_impl::DefaultAuth;
pub use token::{Claims, TokenError, TokenIssuer, TokenPayload};
