//! HTTP API tests driving the full router.

mod support;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

use domain::UserRole;
use user_service_lib::build_state;
use user_service_lib::routes::{create_router, RouterOptions};
use user_service_lib::service::register_user;

use support::{token_config, InMemoryUsers};

struct TestApp {
    router: Router,
    users: Arc<InMemoryUsers>,
    cache: Arc<common::MemorySessionCache>,
}

impl TestApp {
    fn new() -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let cache = Arc::new(common::MemorySessionCache::new());
        let state = build_state(users.clone(), cache.clone(), &token_config(), Vec::new());
        Self {
            router: create_router(state, &RouterOptions::default()),
            users,
            cache,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn register(&self, email: &str, password: &str, role: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": email, "password": password, "role": role })),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Provision an admin the way the CLI does and return its access token.
    async fn admin_token(&self) -> String {
        assert_ok!(
            register_user(
                self.users.as_ref(),
                "root@example.com",
                "admin-password",
                UserRole::Admin
            )
            .await
        );
        let (status, body) = self.login("root@example.com", "admin-password").await;
        assert_eq!(status, StatusCode::OK);
        body["accessToken"].as_str().unwrap().to_string()
    }
}

fn assert_invalid_token(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert_eq!(body["error"]["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_register_login_and_admin_gate() {
    let app = TestApp::new();

    let (status, body) = app.register("alice@example.com", "secret123", "applicant").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["role"], "applicant");
    assert!(body.get("passwordHash").is_none());

    let (status, body) = app.login("alice@example.com", "secret123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 900);
    let applicant = body["accessToken"].as_str().unwrap().to_string();
    assert!(body["refreshToken"].is_string());

    let (status, body) = app.login("alice@example.com", "wrong-pass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

    let (status, _) = app
        .send(Method::GET, "/api/v1/admin/users", Some(&applicant), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let (status, body) = app
        .send(Method::GET, "/api/v1/admin/users", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let app = TestApp::new();
    app.register("bob@example.com", "secret123", "employer").await;

    let (status, body) = app.register("Bob@Example.com", "secret456", "employer").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_registration_validation() {
    let app = TestApp::new();

    let (status, _) = app.register("not-an-email", "secret123", "applicant").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.register("carol@example.com", "short", "applicant").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.register("carol@example.com", "secret123", "admin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.register("carol@example.com", "secret123", "wizard").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.users.stored("carol@example.com").is_none());
}

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let app = TestApp::new();

    let (status, _) = app
        .send(Method::GET, "/api/v1/users/profile", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::GET, "/api/v1/users/profile", Some("garbage"), None)
        .await;
    assert_invalid_token(status, &body);

    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/logout", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_reuse_over_http() {
    let app = TestApp::new();
    app.register("dave@example.com", "secret123", "applicant").await;
    let (_, login) = app.login("dave@example.com", "secret123").await;
    let original = login["refreshToken"].clone();

    let (status, rotated) = app
        .send(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": original })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refreshToken"], original);

    // Replay is indistinguishable from any other bad token
    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": original })),
        )
        .await;
    assert_invalid_token(status, &body);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": rotated["refreshToken"] })),
        )
        .await;
    assert_invalid_token(status, &body);
}

#[tokio::test]
async fn test_logout_revokes_refresh_and_is_idempotent() {
    let app = TestApp::new();
    app.register("erin@example.com", "secret123", "employer").await;
    let (_, login) = app.login("erin@example.com", "secret123").await;
    let access = login["accessToken"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/auth/logout",
                Some(&access),
                Some(json!({ "refreshToken": login["refreshToken"] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Logged out");
    }

    // No body at all is fine too
    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/logout", Some(&access), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": login["refreshToken"] })),
        )
        .await;
    assert_invalid_token(status, &body);
}

#[tokio::test]
async fn test_profile_roundtrip() {
    let app = TestApp::new();
    app.register("fay@example.com", "secret123", "applicant").await;
    let (_, login) = app.login("fay@example.com", "secret123").await;
    let access = login["accessToken"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/v1/users/profile",
            Some(&access),
            Some(json!({ "displayName": "Fay" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["displayName"], "Fay");

    let (status, body) = app
        .send(Method::GET, "/api/v1/users/profile", Some(&access), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["displayName"], "Fay");
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn test_admin_suspends_user() {
    let app = TestApp::new();
    let (_, created) = app.register("gus@example.com", "secret123", "applicant").await;
    let user_id = created["id"].as_str().unwrap().to_string();
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/admin/users/{}/status", user_id),
            Some(&admin),
            Some(json!({ "status": "suspended" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "suspended");

    let (status, _) = app.login("gus@example.com", "secret123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Provisioning cannot take over an existing address
    assert_err!(
        register_user(
            app.users.as_ref(),
            "gus@example.com",
            "admin-password",
            UserRole::Admin
        )
        .await
    );

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/api/v1/admin/users/{}", uuid::Uuid::new_v4()),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cache_outage_is_service_unavailable() {
    let app = TestApp::new();
    app.register("hal@example.com", "secret123", "applicant").await;
    app.cache.set_offline(true);

    let (status, body) = app.login("hal@example.com", "secret123").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["session_cache"]["status"], "unhealthy");

    app.cache.set_offline(false);
    let (status, _) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
