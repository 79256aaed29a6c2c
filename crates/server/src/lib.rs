//! Store Ratings API server library.
//!
//! This crate provides the HTTP API as a library, allowing the router to be
//! tested and the services to be reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::{Router, body::Body, extract::Request, http::Response};
use tower_http::trace::TraceLayer;
use tracing::{Span, field::Empty, info_span};

use state::AppState;

/// Build the application router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = Empty,
                status = Empty,
                latency_ms = Empty,
            )
        })
        .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
            span.record("status", response.status().as_u16());
            span.record(
                "latency_ms",
                u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            );
            tracing::info!("response");
        });

    routes::routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Method, StatusCode, header};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use super::*;
    use crate::config::test_config;

    fn test_app() -> Router {
        // Lazy: these requests never reach the database.
        let pool = PgPool::connect_lazy("postgres://localhost/ratings_test").unwrap();
        app(AppState::new(test_config(), pool))
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_has_security_headers_and_request_id() {
        let response = test_app()
            .oneshot(request(Method::GET, "/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert!(headers.contains_key(middleware::request_id::REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_upstream_request_id_is_echoed() {
        let mut req = request(Method::GET, "/health");
        req.headers_mut()
            .insert("x-request-id", "edge-42".parse().unwrap());

        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "edge-42");
    }

    #[tokio::test]
    async fn test_protected_routes_require_login() {
        for (method, uri) in [
            (Method::GET, "/api/auth/me"),
            (Method::GET, "/api/profile"),
            (Method::GET, "/api/dashboard"),
            (Method::GET, "/api/owner/store"),
            (Method::GET, "/api/admin/stats"),
            (Method::DELETE, "/api/stores/1"),
            (Method::DELETE, "/api/stores/1/rating"),
        ] {
            let response = test_app()
                .oneshot(request(method.clone(), uri))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_unsigned_session_cookie_is_ignored() {
        let mut req = request(Method::GET, "/api/auth/me");
        // A well-formed session id without a signature.
        let forged = format!("{}=AAAAAAAAAAAAAAAAAAAAAA", middleware::session::SESSION_COOKIE_NAME);
        req.headers_mut()
            .insert(header::COOKIE, forged.parse().unwrap());

        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    fn json_login(body: &'static str) -> Request<Body> {
        let mut req = request(Method::POST, "/api/auth/login");
        *req.body_mut() = Body::from(body);
        let headers = req.headers_mut();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        // The rate limiter keys on the client address.
        headers.insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
        req
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = test_app().oneshot(json_login("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_field_is_unprocessable() {
        let response = test_app()
            .oneshot(json_login(r#"{"email": "alice@example.com"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_password_change_checks_login_before_body() {
        let mut req = request(Method::PUT, "/api/auth/password");
        *req.body_mut() = Body::from("{not json");
        req.headers_mut()
            .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());

        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_app()
            .oneshot(request(Method::GET, "/api/nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
