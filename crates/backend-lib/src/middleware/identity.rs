//! Attaches the caller's session claims, if any, to the request.
use std::sync::Arc;

use authgate_common::SESSION_COOKIE;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::AppState;

/// Never rejects: a missing or bad cookie leaves the caller anonymous
pub async fn identify(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        match state.tokens.verify(cookie.value()) {
            Ok(claims) => {
                debug!(
                    user_id = claims.payload.id,
                    role = %claims.payload.role,
                    "session identified"
                );
                request.extensions_mut().insert(claims);
            }
            Err(_) => debug!("ignoring invalid session cookie"),
        }
    }

    next.run(request).await
}
