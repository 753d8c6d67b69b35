//! In-process admission policy: bot screening, attack signatures and
//! sliding window rate limits.

use std::collections::VecDeque;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use regex::RegexSet;
use tokio::time::Instant;
use tracing::info;

use super::{
    AdmissionPolicy, Decision, DenyReason, Mode, PolicyError, RequestInfo, SlidingWindowRule,
};
use crate::config::SecuritySettings;

/// Signatures of common probing and injection attempts
static SHIELD_SIGNATURES: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\.\./",
        r"(?i)%2e%2e(/|%2f)",
        r"(?i)/etc/passwd",
        r"(?i)(<|%3c)\s*script",
        r"(?i)union(\s|\+|%20)+select",
        r"(?i)'(\s|\+|%20)*or(\s|\+|%20)+'?1'?(\s|\+|%20)*=(\s|\+|%20)*'?1",
    ])
    .expect("shield signatures compile")
});

/// Request timestamps inside one window
#[derive(Debug)]
struct Window {
    hits: VecDeque<Instant>,
    span: Duration,
}

impl Window {
    fn new(span: Duration) -> Self {
        Self {
            hits: VecDeque::new(),
            span,
        }
    }

    fn evict(&mut self, now: Instant) {
        while self
            .hits
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.span)
        {
            self.hits.pop_front();
        }
    }
}

/// Admission policy evaluated entirely in this process
#[derive(Debug, Clone)]
pub struct LocalShield {
    /// Keyed by (rule name, client)
    windows: Arc<DashMap<(String, String), Window>>,
    /// Lower-cased user agent fragments
    bot_markers: Arc<Vec<String>>,
}

impl LocalShield {
    pub fn new(bot_markers: impl IntoIterator<Item = String>) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            bot_markers: Arc::new(
                bot_markers
                    .into_iter()
                    .map(|m| m.to_lowercase())
                    .filter(|m| !m.is_empty())
                    .collect(),
            ),
        }
    }

    pub fn from_settings(settings: &SecuritySettings) -> Self {
        Self::new(settings.bot_user_agents.iter().cloned())
    }

    fn is_bot(&self, request: &RequestInfo) -> bool {
        let Some(agent) = request.user_agent.as_deref() else {
            return false;
        };
        let agent = agent.to_lowercase();
        self.bot_markers.iter().any(|m| agent.contains(m.as_str()))
    }

    fn is_attack(request: &RequestInfo) -> bool {
        SHIELD_SIGNATURES.is_match(&request.path)
            || request
                .query
                .as_deref()
                .is_some_and(|q| SHIELD_SIGNATURES.is_match(q))
    }

    /// Count the request against the rule's window
    fn admit(&self, request: &RequestInfo, rule: &SlidingWindowRule) -> Decision {
        let now = Instant::now();
        let key = (rule.name.clone(), request.client.clone());
        let mut window = self
            .windows
            .entry(key)
            .or_insert_with(|| Window::new(rule.window));
        window.span = rule.window;
        window.evict(now);

        if window.hits.len() >= rule.max as usize {
            return Decision::Deny(DenyReason::RateLimit {
                max: rule.max,
                window: rule.window,
            });
        }
        window.hits.push_back(now);
        Decision::Allow
    }

    /// Drop windows with no live hits. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.evict(now);
            !window.hits.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    /// Number of (rule, client) windows currently tracked
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl AdmissionPolicy for LocalShield {
    async fn protect(
        &self,
        request: &RequestInfo,
        rule: &SlidingWindowRule,
    ) -> Result<Decision, PolicyError> {
        if self.is_bot(request) {
            return Ok(Decision::Deny(DenyReason::Bot));
        }
        if Self::is_attack(request) {
            return Ok(Decision::Deny(DenyReason::Shield));
        }

        let decision = self.admit(request, rule);
        if rule.mode == Mode::DryRun && decision.is_denied() {
            info!(rule = %rule.name, client = %request.client, "dry run: request would be denied");
            return Ok(Decision::Allow);
        }
        Ok(decision)
    }
}
