//! Shared setup for the HTTP flow tests.

#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use authgate::{config::Settings, create_router, storage::MemoryUserStore, AppState};
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, request, Method, Request, Response},
    Router,
};
use serde::Serialize;
use serde_json::Value;

/// Settings with a cheap scrypt cost so hashing stays fast under test
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.password.scrypt_log_n = 4;
    settings
}

/// A router over an empty in-memory store, plus handles for inspection
pub fn setup_test_app() -> (Router, Arc<AppState>, Arc<MemoryUserStore>) {
    setup_test_app_with(test_settings())
}

pub fn setup_test_app_with(settings: Settings) -> (Router, Arc<AppState>, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::new());
    let state = Arc::new(AppState::new(settings, store.clone()).unwrap());
    (create_router(state.clone()), state, store)
}

/// Request builder for a browser-like client connecting from `peer`,
/// as `into_make_service_with_connect_info` would present it
pub fn from_peer(method: Method, uri: &str, peer: &str) -> request::Builder {
    let ip: IpAddr = peer.parse().unwrap();
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, "Mozilla/5.0 (X11; Linux x86_64)")
        .extension(ConnectInfo(SocketAddr::new(ip, 52_000)))
}

/// JSON POST from `peer`
pub fn post_json(uri: &str, peer: &str, body: impl Serialize) -> Request<Body> {
    from_peer(Method::POST, uri, peer)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The raw `Set-Cookie` header, if any
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Value of the `token` cookie in a `Set-Cookie` header
pub fn token_from(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.trim().strip_prefix("token="))
        .unwrap()
        .to_string()
}
