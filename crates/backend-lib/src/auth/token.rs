// ============================
// authgate-lib/src/auth/token.rs
// ============================
//! Session token signing and verification.
use std::time::Duration;

use authgate_common::Role;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Token failures. Causes are logged, never carried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("failed to sign JWT token")]
    Signing,

    #[error("failed to authenticate JWT token")]
    Invalid,
}

/// Identity carried in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

/// Decoded token: payload plus standard time claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub payload: TokenPayload,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Signs and verifies HS256 session tokens with one shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Sign `payload`, expiring `ttl` from now
    pub fn sign(&self, payload: &TokenPayload) -> Result<String, TokenError> {
        self.sign_at(payload, Utc::now().timestamp())
    }

    fn sign_at(&self, payload: &TokenPayload, issued_at: i64) -> Result<String, TokenError> {
        let ttl = i64::try_from(self.ttl.as_secs()).map_err(|_| {
            error!("token ttl out of range");
            TokenError::Signing
        })?;
        let claims = Claims {
            payload: payload.clone(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!(error = %e, user_id = payload.id, "Failed to sign JWT token");
            TokenError::Signing
        })
    }

    /// Decode and check signature and expiry. Every failure is [`TokenError::Invalid`].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                warn!(error = %e, "Failed to authenticate JWT token");
                TokenError::Invalid
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(60 * 60 * 24);

    fn payload() -> TokenPayload {
        TokenPayload {
            id: 7,
            email: "a@x.com".into(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_sign_then_verify() {
        let issuer = TokenIssuer::new("test-secret", DAY);
        let token = issuer.sign(&payload()).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.payload, payload());
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new("test-secret", DAY);
        let two_days_ago = Utc::now().timestamp() - 2 * 86_400;
        let token = issuer.sign_at(&payload(), two_days_ago).unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_token_just_inside_lifetime_accepted() {
        let issuer = TokenIssuer::new("test-secret", DAY);
        let almost_a_day_ago = Utc::now().timestamp() - 86_400 + 60;
        let token = issuer.sign_at(&payload(), almost_a_day_ago).unwrap();

        assert!(issuer.verify(&token).is_ok());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let ours = TokenIssuer::new("test-secret", DAY);
        let theirs = TokenIssuer::new("rotated-secret", DAY);
        let token = theirs.sign(&payload()).unwrap();

        assert_eq!(ours.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_tampered_and_malformed_rejected() {
        let issuer = TokenIssuer::new("test-secret", DAY);
        let token = issuer.sign(&payload()).unwrap();

        let mut other = payload();
        other.role = Role::User;
        let other_token = issuer.sign(&other).unwrap();

        // admin claims with the signature of the user token
        let (head, _) = token.rsplit_once('.').unwrap();
        let (_, foreign_sig) = other_token.rsplit_once('.').unwrap();
        let tampered = format!("{head}.{foreign_sig}");

        assert_eq!(issuer.verify(&tampered), Err(TokenError::Invalid));
        assert_eq!(issuer.verify("not.a.token"), Err(TokenError::Invalid));
        assert_eq!(issuer.verify(""), Err(TokenError::Invalid));
    }
}
