use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use authgate_common::{ErrorResponse, Role};
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceExt;

use super::{identify, rate_limit};
use crate::auth::TokenPayload;
use crate::config::Settings;
use crate::security::{
    AdmissionPolicy, Decision, LocalShield, PolicyError, RequestInfo, SlidingWindowRule,
};
use crate::storage::MemoryUserStore;
use crate::AppState;

struct BrokenPolicy;

#[async_trait]
impl AdmissionPolicy for BrokenPolicy {
    async fn protect(
        &self,
        _request: &RequestInfo,
        _rule: &SlidingWindowRule,
    ) -> Result<Decision, PolicyError> {
        Err(PolicyError::Unavailable("decision service timed out".into()))
    }
}

async fn test_handler() -> &'static str {
    "Hello, World!"
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.password.scrypt_log_n = 4;
    settings
}

fn state_with(policy: Arc<dyn AdmissionPolicy>) -> Arc<AppState> {
    Arc::new(
        AppState::with_policy(test_settings(), Arc::new(MemoryUserStore::new()), policy).unwrap(),
    )
}

fn state() -> Arc<AppState> {
    state_with(Arc::new(LocalShield::from_settings(&test_settings().security)))
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(test_handler))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(from_fn_with_state(state.clone(), identify))
        .with_state(state)
}

fn session_cookie(state: &AppState, role: Role) -> String {
    let token = state
        .tokens
        .sign(&TokenPayload {
            id: 1,
            email: "a@x.com".into(),
            role,
        })
        .unwrap();
    format!("token={token}")
}

fn request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri("/")
        .extension(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 40000))))
        .header(header::USER_AGENT, "Mozilla/5.0");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn error_body(response: axum::response::Response) -> ErrorResponse {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sends `budget` admitted requests, then checks the next one is denied
async fn exhaust(app: &Router, cookie: Option<&str>, budget: usize) -> ErrorResponse {
    for i in 0..budget {
        let response = app.clone().oneshot(request(cookie)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {} of {budget}", i + 1);
    }

    let response = app.clone().oneshot(request(cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    error_body(response).await
}

#[tokio::test]
async fn test_guest_budget() {
    let app = app(state());
    let body = exhaust(&app, None, 5).await;

    assert_eq!(body.error, "Unauthorized");
    assert_eq!(
        body.message.as_deref(),
        Some("Too many requests. Guest rate limit exceeded (5 requests per minute). Slow down")
    );
}

#[tokio::test]
async fn test_user_budget() {
    let state = state();
    let cookie = session_cookie(&state, Role::User);
    let body = exhaust(&app(state), Some(&cookie), 10).await;

    assert!(body
        .message
        .unwrap()
        .contains("User rate limit exceeded (10 requests per minute)"));
}

#[tokio::test]
async fn test_admin_budget() {
    let state = state();
    let cookie = session_cookie(&state, Role::Admin);
    let body = exhaust(&app(state), Some(&cookie), 20).await;

    assert!(body
        .message
        .unwrap()
        .contains("Admin user rate limit exceeded (20 requests per minute)"));
}

#[tokio::test]
async fn test_invalid_cookie_counts_as_guest() {
    let app = app(state());
    let body = exhaust(&app, Some("token=not-a-jwt"), 5).await;
    assert!(body.message.unwrap().contains("Guest rate limit exceeded"));
}

#[tokio::test]
async fn test_bot_blocked() {
    let app = app(state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::USER_AGENT, "curl/8.4.0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = error_body(response).await;
    assert_eq!(body.message.as_deref(), Some("Automated requests are not allowed"));
}

#[tokio::test]
async fn test_shield_blocked() {
    let app = app(state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/?q=%3Cscript%3Ealert(1)%3C/script%3E")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = error_body(response).await;
    assert_eq!(body.message.as_deref(), Some("Request blocked by security policy"));
}

#[tokio::test]
async fn test_policy_failure_returns_500() {
    let app = app(state_with(Arc::new(BrokenPolicy)));
    let response = app.oneshot(request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(response).await;
    assert_eq!(body.error, "Internal Server Error");
    assert_eq!(
        body.message.as_deref(),
        Some("Something went wrong with security middleware")
    );
}
