#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use gatekeep::app::{build_router, build_state};
use gatekeep::config::Config;

pub const ADMIN_EMAIL: &str = "root@example.com";
pub const ADMIN_PASSWORD: &str = "rootpassword";

pub async fn app() -> Router {
    app_with(&[]).await
}

/// Full router over in-memory stores. `overrides` win over the defaults.
pub async fn app_with(overrides: &[(&str, &str)]) -> Router {
    let mut vars: HashMap<String, String> = [
        ("JWT_SECRET_KEY", "integration-test-secret"),
        ("BOOTSTRAP_ADMIN_EMAIL", ADMIN_EMAIL),
        ("BOOTSTRAP_ADMIN_PASSWORD", ADMIN_PASSWORD),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }

    let config = Config::from_vars(|k| vars.get(k).cloned()).unwrap();
    let state = build_state(&config).await.unwrap();
    build_router(state, &config)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn get_with(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::get(uri);
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn get_authed(uri: &str, token: &str) -> Request<Body> {
    get_with(uri, &[("authorization", format!("Bearer {}", token).as_str())])
}

pub fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Returns (access_token, refresh_token).
pub async fn login(app: &Router, email: &str, password: &str) -> (String, String) {
    let res = send(
        app,
        post_json(
            "/api/v1/auth/login",
            serde_json::json!({"email": email, "password": password}),
            None,
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.body);

    let tokens = &res.body["data"]["tokens"];
    (
        tokens["access_token"].as_str().unwrap().to_string(),
        tokens["refresh_token"].as_str().unwrap().to_string(),
    )
}

/// Registers a fresh user (default grants) and logs in.
pub async fn register_and_login(app: &Router, email: &str) -> (String, String) {
    let res = send(
        app,
        post_json(
            "/api/v1/auth/register",
            serde_json::json!({
                "email": email,
                "password": "password123",
                "first_name": "Ada",
                "last_name": "Lovelace",
            }),
            None,
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.body);

    login(app, email, "password123").await
}
