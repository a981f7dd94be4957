//! Forward-auth gateway
//!
//! A reverse proxy (nginx `auth_request`, Traefik `forwardAuth`, ...) sends a
//! sub-request here for every client request. The original URI and method
//! arrive in `X-Forwarded-*` / `X-Original-*` headers; the gateway answers
//! `200 ok` to let the request through or the denial's status and body to
//! reject it.
//!
//! Endpoints:
//! - `GET /health` liveness check, never authorized
//! - `GET /_pathguard/stats` decision counters
//! - anything else: forward-auth check
//!
//! The forwarded path is normalized (see [`normalize_path`]) before rules
//! run, so `/public/../admin` is judged as `/admin`.

use crate::access_control::{AuthRequest, AuthorizationEngine, Decision, StatsSnapshot};
use crate::server::path::normalize_path;
use crate::server::token::TokenExtractor;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

const FORWARDED_URI_HEADERS: &[&str] = &["x-forwarded-uri", "x-original-uri"];
const FORWARDED_METHOD_HEADERS: &[&str] = &["x-forwarded-method", "x-original-method"];

/// Shared state for gateway handlers
#[derive(Clone)]
pub struct GatewayState {
    pub engine: Arc<AuthorizationEngine>,
    pub tokens: Arc<TokenExtractor>,
}

impl GatewayState {
    pub fn new(engine: Arc<AuthorizationEngine>, tokens: TokenExtractor) -> Self {
        Self {
            engine,
            tokens: Arc::new(tokens),
        }
    }
}

/// Build the gateway router
pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/_pathguard/stats", get(stats))
        .fallback(forward_auth)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn stats(State(state): State<GatewayState>) -> Json<StatsSnapshot> {
    Json(state.engine.stats().snapshot())
}

async fn forward_auth(
    State(state): State<GatewayState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let raw_path = first_header(&headers, FORWARDED_URI_HEADERS)
        .map(strip_query)
        .unwrap_or_else(|| uri.path());
    let path = match normalize_path(raw_path) {
        Ok(path) => path,
        Err(error) => {
            warn!(path = raw_path, error = %error, "Rejecting unnormalizable path");
            return error.into_response();
        }
    };
    let method = first_header(&headers, FORWARDED_METHOD_HEADERS)
        .unwrap_or_else(|| method.as_str())
        .to_string();
    let token = state.tokens.extract(&headers);

    let request = AuthRequest::new(&path)
        .method(&method)
        .token(token.as_deref());

    match state.engine.evaluate_request(request).await {
        Decision::Allow => (StatusCode::OK, "ok").into_response(),
        Decision::Deny(denial) => denial.into_response(),
    }
}

fn first_header<'h>(headers: &'h HeaderMap, names: &[&str]) -> Option<&'h str> {
    names
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
}

fn strip_query(uri: &str) -> &str {
    uri.split(['?', '#']).next().unwrap_or(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("/user/info?id=1"), "/user/info");
        assert_eq!(strip_query("/user/info#top"), "/user/info");
        assert_eq!(strip_query("/user/info"), "/user/info");
    }

    #[test]
    fn test_first_header_order() {
        let mut headers = HeaderMap::new();
        headers.insert("x-original-uri", "/b".parse().unwrap());
        assert_eq!(first_header(&headers, FORWARDED_URI_HEADERS), Some("/b"));

        headers.insert("x-forwarded-uri", "/a".parse().unwrap());
        assert_eq!(first_header(&headers, FORWARDED_URI_HEADERS), Some("/a"));

        headers.insert("x-forwarded-uri", " ".parse().unwrap());
        assert_eq!(first_header(&headers, FORWARDED_URI_HEADERS), Some("/b"));
    }
}
