//! Role-based rate limiting and request screening.
use std::net::SocketAddr;
use std::sync::Arc;

use authgate_common::ErrorResponse;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use tracing::{error, warn};

use crate::auth::Claims;
use crate::metrics::SECURITY_DENIED;
use crate::security::{Decision, DenyReason, RequestInfo, Tier, TierLimits};
use crate::AppState;

/// Rate limiter middleware.
///
/// Picks the caller's budget from the role in its session claims, keys it on
/// the socket peer (or the forwarded client behind a trusted proxy), asks the
/// admission policy for a decision and answers denials with 403. A failing
/// policy is answered here with 500 and does not reach the shared error type.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let role = request
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.payload.role);
    let tier = Tier::for_role(role);
    let rule = state.limits.rule_for(tier);
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let info = RequestInfo::from_parts(
        request.method(),
        request.uri(),
        request.headers(),
        peer,
        &state.settings.security.trusted_proxies,
    );

    let decision = match state.policy.protect(&info, &rule).await {
        Ok(decision) => decision,
        Err(e) => {
            error!(error = %e, path = %info.path, "security middleware error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(
                    ErrorResponse::new("Internal Server Error")
                        .with_message("Something went wrong with security middleware"),
                ),
            )
                .into_response();
        }
    };

    match decision {
        Decision::Allow => next.run(request).await,
        Decision::Deny(reason) => deny(&state.limits, tier, &info, &reason),
    }
}

fn deny(limits: &TierLimits, tier: Tier, info: &RequestInfo, reason: &DenyReason) -> Response {
    let user_agent = info.user_agent.as_deref().unwrap_or("");
    let (kind, message) = match reason {
        DenyReason::Bot => {
            warn!(ip = %info.client, path = %info.path, user_agent, "Bot request blocked");
            ("bot", "Automated requests are not allowed".to_string())
        }
        DenyReason::Shield => {
            warn!(
                ip = %info.client,
                path = %info.path,
                user_agent,
                method = %info.method,
                "Shield blocked request"
            );
            ("shield", "Request blocked by security policy".to_string())
        }
        DenyReason::RateLimit { .. } => {
            warn!(
                ip = %info.client,
                path = %info.path,
                user_agent,
                method = %info.method,
                tier = %tier,
                "Rate limit exceeded"
            );
            (
                "rate_limit",
                format!("Too many requests. {}", limits.exceeded_message(tier)),
            )
        }
    };
    counter!(SECURITY_DENIED, "reason" => kind).increment(1);

    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::new("Unauthorized").with_message(message)),
    )
        .into_response()
}
