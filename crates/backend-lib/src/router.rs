// ============================
// authgate-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, health};
use crate::middleware::{identify, rate_limit};
use crate::AppState;

/// Create the HTTP router.
///
/// Layers run outermost first: tracing, identity, then rate limiting.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/signout", post(auth::signout))
        .route("/health", get(health::health))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(from_fn_with_state(state.clone(), identify))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
