#![allow(dead_code)]

//! Common test utilities for integration tests
//!
//! Every test gets its own router over a fresh in-memory store, so tests
//! need no database and never see each other's data.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use frengine_api::{
    app::{build_router, AppState},
    config::{Config, DatabaseConfig, JwtConfig},
};
use frengine_shared::store::memory::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const PASSWORD: &str = "correct horse battery";

/// Test context holding the router and its store
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

/// Status, headers and parsed JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// A registered, logged-in user
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            ..Default::default()
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();
        let state = AppState::new(store.clone(), config.clone());

        Self {
            app: build_router(state),
            store,
            config,
        }
    }

    /// Sends a request through the full middleware stack
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, headers, body }
    }

    /// Sends a JSON request, optionally authenticated
    pub async fn json(&self, method: &str, uri: &str, auth: Option<&TestUser>, body: Value) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = auth {
            builder = builder.header(header::AUTHORIZATION, user.auth_header());
        }

        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    /// Sends a bodyless GET, optionally authenticated
    pub async fn get(&self, uri: &str, auth: Option<&TestUser>) -> TestResponse {
        self.get_with(uri, auth, &[]).await
    }

    /// Sends a GET with extra headers
    pub async fn get_with(&self, uri: &str, auth: Option<&TestUser>, extra: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(user) = auth {
            builder = builder.header(header::AUTHORIZATION, user.auth_header());
        }
        for (name, value) in extra {
            builder = builder.header(*name, *value);
        }

        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Registers and logs in a user
    pub async fn user(&self, name: &str) -> TestUser {
        let registered = self
            .json(
                "POST",
                "/auth/register",
                None,
                json!({ "name": name, "password": PASSWORD, "password2": PASSWORD }),
            )
            .await;
        assert_eq!(registered.status, StatusCode::OK, "{:?}", registered.body);

        let login = self
            .json("POST", "/auth/login", None, json!({ "login": name, "password": PASSWORD }))
            .await;
        assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);

        TestUser {
            id: login.body["user"]["id"].as_str().unwrap().parse().unwrap(),
            name: name.to_string(),
            token: login.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project owned by `owner` and returns its id
    pub async fn project(&self, owner: &TestUser, name: &str) -> Uuid {
        let created = self
            .json("POST", "/projects", Some(owner), json!({ "name": name }))
            .await;
        assert_eq!(created.status, StatusCode::OK, "{:?}", created.body);

        created.body["projectID"].as_str().unwrap().parse().unwrap()
    }
}
