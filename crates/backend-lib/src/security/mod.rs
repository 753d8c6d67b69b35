// ============================
// authgate-lib/src/security/mod.rs
// ============================
//! Admission policies: decide whether a request may proceed.
//!
//! The rate limit middleware builds a [`SlidingWindowRule`] for the caller's
//! tier and asks an [`AdmissionPolicy`] for a [`Decision`]. [`LocalShield`] is
//! the bundled policy; a client for a hosted decision service can implement
//! the same trait.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use authgate_common::Role;
use axum::http::{header, HeaderMap, Method, Uri};
use thiserror::Error;

use crate::config::SecuritySettings;

mod shield;

pub use shield::LocalShield;

/// Rate limit tier of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Admin,
    User,
    Guest,
}

impl Tier {
    /// Anonymous callers are guests
    pub fn for_role(role: Option<Role>) -> Self {
        match role {
            Some(Role::Admin) => Tier::Admin,
            Some(Role::User) => Tier::User,
            None => Tier::Guest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Admin => "admin",
            Tier::User => "user",
            Tier::Guest => "guest",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Tier::Admin => "Admin user",
            Tier::User => "User",
            Tier::Guest => "Guest",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a rule's denials are enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    /// Decide and log, but always allow
    DryRun,
}

/// A sliding window budget for one tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindowRule {
    pub name: String,
    pub mode: Mode,
    pub window: Duration,
    pub max: u32,
}

/// Budgets per tier, built from settings
#[derive(Debug, Clone)]
pub struct TierLimits {
    window: Duration,
    admin: u32,
    user: u32,
    guest: u32,
    mode: Mode,
}

impl TierLimits {
    pub fn from_settings(settings: &SecuritySettings) -> Self {
        Self {
            window: settings.window(),
            admin: settings.admin_max_requests,
            user: settings.user_max_requests,
            guest: settings.guest_max_requests,
            mode: if settings.enforce { Mode::Live } else { Mode::DryRun },
        }
    }

    pub fn max_for(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Admin => self.admin,
            Tier::User => self.user,
            Tier::Guest => self.guest,
        }
    }

    /// Rule named `{tier}-rate-limit`
    pub fn rule_for(&self, tier: Tier) -> SlidingWindowRule {
        SlidingWindowRule {
            name: format!("{tier}-rate-limit"),
            mode: self.mode,
            window: self.window,
            max: self.max_for(tier),
        }
    }

    /// Message shown when `tier` runs out of budget
    pub fn exceeded_message(&self, tier: Tier) -> String {
        let per = if self.window == Duration::from_secs(60) {
            "per minute".to_string()
        } else {
            format!("per {} seconds", self.window.as_secs())
        };
        format!(
            "{} rate limit exceeded ({} requests {per}). Slow down",
            tier.label(),
            self.max_for(tier)
        )
    }
}

impl Default for TierLimits {
    fn default() -> Self {
        Self::from_settings(&SecuritySettings::default())
    }
}

/// What the policy knows about a request
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// Client identity used to key rate limit windows
    pub client: String,
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestInfo {
    /// Describe a request that arrived from the socket `peer`.
    ///
    /// The client key is the peer address. Forwarding headers are read only
    /// when the peer is one of `trusted_proxies`; see [`client_key`].
    pub fn from_parts(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        peer: Option<IpAddr>,
        trusted_proxies: &[IpAddr],
    ) -> Self {
        Self {
            client: client_key(headers, peer, trusted_proxies),
            method: method.clone(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            user_agent: header_str(headers, header::USER_AGENT.as_str()).map(str::to_string),
        }
    }
}

/// Key used when the socket peer is not known
pub const UNKNOWN_CLIENT: &str = "unknown";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Rate limit key for a request.
///
/// An untrusted peer is keyed on its own address whatever headers it sends.
/// Behind a trusted proxy, `x-forwarded-for` is walked right to left past
/// trusted hops and the first untrusted hop is the client; `x-real-ip` is
/// used when there is no `x-forwarded-for`.
pub fn client_key(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trusted_proxies: &[IpAddr],
) -> String {
    let Some(peer) = peer else {
        return UNKNOWN_CLIENT.to_string();
    };
    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        let mut client = peer;
        for hop in forwarded.rsplit(',').map(str::trim) {
            match hop.parse::<IpAddr>() {
                Ok(ip) if trusted_proxies.contains(&ip) => client = ip,
                Ok(ip) => return ip.to_string(),
                // anything left of a malformed hop was not written by our proxies
                Err(_) => break,
            }
        }
        return client.to_string();
    }

    header_str(headers, "x-real-ip")
        .and_then(|v| v.parse::<IpAddr>().ok())
        .unwrap_or(peer)
        .to_string()
}

/// Why a request was denied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    Bot,
    Shield,
    RateLimit { max: u32, window: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_denied(&self) -> bool {
        matches!(self, Decision::Deny(_))
    }
}

/// The policy itself failed; distinct from a denial
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("admission policy unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AdmissionPolicy: Send + Sync {
    async fn protect(
        &self,
        request: &RequestInfo,
        rule: &SlidingWindowRule,
    ) -> Result<Decision, PolicyError>;
}
