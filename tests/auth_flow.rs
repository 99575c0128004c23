//! Integration tests for the assembled auth router.
//!
//! Drives the same router the binary serves, request by request, covering
//! the login / refresh / logout lifecycle and rate admission.

use axum::{
    body::Body,
    extract::connect_info::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use campushub_backend::{
    auth::{
        api::build_router, models::UserRole, AuthGateway, AuthState, AuthenticatorState,
        SessionStore, TokenCodec, UserStore,
    },
    middleware::{RateAdmission, RateLimitConfig},
    store::{MemoryStore, TtlStore},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::ServiceExt;

fn test_app(rate_limit_max: u64) -> (Router, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let users = Arc::new(UserStore::new(temp_file.path().to_str().unwrap()).unwrap());
    users
        .create_user("Ada", "a@x.com", "Secret1!", UserRole::Student)
        .unwrap();

    let backend: Arc<dyn TtlStore> = Arc::new(MemoryStore::new());
    let codec = Arc::new(TokenCodec::new(
        "integration-test-secret",
        Duration::from_secs(900),
        Duration::from_secs(7 * 24 * 3600),
    ));
    let sessions = SessionStore::new(backend.clone(), Duration::from_secs(1));
    let gateway = Arc::new(AuthGateway::new(users, codec.clone(), sessions.clone()));
    let admission = Arc::new(RateAdmission::new(
        RateLimitConfig {
            max_requests: rate_limit_max,
            window: Duration::from_secs(60),
        },
        backend,
        Duration::from_secs(1),
    ));

    let app = build_router(
        AuthState { gateway },
        AuthenticatorState { codec, sessions },
        admission,
    );

    (app, temp_file)
}

fn addr(last_octet: u8) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, last_octet], 4000))
}

fn post_json(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .extension(ConnectInfo(addr(1)))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_bearer(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(path)
        .extension(ConnectInfo(addr(1)));
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/login",
            serde_json::json!({"email": email, "password": password}),
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, response_json(response).await)
}

async fn refresh(app: &Router, refresh_token: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/refresh",
            serde_json::json!({"refreshToken": refresh_token}),
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, response_json(response).await)
}

fn token(body: &serde_json::Value, field: &str) -> String {
    body["data"][field].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _temp) = test_app(1000);

    let response = app
        .oneshot(get_with_bearer("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_success_and_failure() {
    let (app, _temp) = test_app(1000);

    let (status, body) = login(&app, "a@x.com", "Secret1!").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());

    let (status, body) = login(&app, "a@x.com", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = login(&app, "nobody@x.com", "Secret1!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_requires_live_token() {
    let (app, _temp) = test_app(1000);

    // No header
    let response = app
        .clone()
        .oneshot(get_with_bearer("/api/auth/me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Garbage token
    let response = app
        .clone()
        .oneshot(get_with_bearer("/api/auth/me", Some("garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Live token
    let (_, body) = login(&app, "a@x.com", "Secret1!").await;
    let access = token(&body, "accessToken");

    let response = app
        .clone()
        .oneshot(get_with_bearer("/api/auth/me", Some(&access)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let me = response_json(response).await;
    assert_eq!(me["data"]["role"], "student");
    assert!(me["data"]["subjectId"].is_string());
}

#[tokio::test]
async fn test_login_refresh_logout_scenario() {
    let (app, _temp) = test_app(1000);

    // login -> (A1, R1)
    let (_, body) = login(&app, "a@x.com", "Secret1!").await;
    let a1 = token(&body, "accessToken");
    let r1 = token(&body, "refreshToken");

    // refresh(R1) -> (A2, R2)
    let (status, body) = refresh(&app, &r1).await;
    assert_eq!(status, StatusCode::OK);
    let a2 = token(&body, "accessToken");
    let r2 = token(&body, "refreshToken");

    // refresh(R1) again -> unauthorized (rotation is single-use)
    let (status, _) = refresh(&app, &r1).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A1 was superseded; A2 works
    let response = app
        .clone()
        .oneshot(get_with_bearer("/api/auth/me", Some(&a1)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_with_bearer("/api/auth/me", Some(&a2)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // logout with A2, then A2 fails immediately despite unexpired exp
    let logout_req = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header("Authorization", format!("Bearer {}", a2))
        .extension(ConnectInfo(addr(1)))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(logout_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_with_bearer("/api/auth/me", Some(&a2)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // R2 was revoked too
    let (status, _) = refresh(&app, &r2).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logout is idempotent: stale token still 200
    let logout_again = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header("Authorization", format!("Bearer {}", a2))
        .extension(ConnectInfo(addr(1)))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(logout_again).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_without_header_still_succeeds() {
    let (app, _temp) = test_app(1000);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .extension(ConnectInfo(addr(1)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_admission_denies_past_ceiling() {
    let (app, _temp) = test_app(3);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get_with_bearer("/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // The 4th request from the same address trips the ceiling, even on a
    // public route: admission runs before authentication
    let response = app
        .clone()
        .oneshot(get_with_bearer("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("Retry-After"));

    // A different client address is unaffected
    let other = Request::builder()
        .method("GET")
        .uri("/health")
        .extension(ConnectInfo(addr(2)))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(other).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
