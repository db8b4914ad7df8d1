/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use frengine_api::{app::{build_router, AppState}, config::Config};
/// use frengine_shared::store::memory::MemoryStore;
/// use std::sync::Arc;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::load()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use frengine_shared::{
    auth::{jwt::TokenIssuer, middleware::create_jwt_middleware, password::PasswordPolicy},
    store::Datastore,
};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Built once at startup and never mutated afterwards. Cloned for each
/// request handler via Axum's `State` extractor; every field is behind an
/// `Arc` or `Copy`, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend
    pub store: Arc<dyn Datastore>,

    /// Session token issuer and validator
    pub tokens: Arc<TokenIssuer>,

    /// Registration password policy
    pub password_policy: PasswordPolicy,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Datastore>, config: Config) -> Self {
        let tokens = TokenIssuer::new(&config.jwt.secret, config.jwt.token_ttl_hours);

        Self {
            store,
            tokens: Arc::new(tokens),
            password_policy: PasswordPolicy::default(),
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                    # Health check (public)
/// ├── /auth/                          # Authentication (public)
/// │   ├── POST /register
/// │   └── POST /login
/// └── (authenticated)
///     ├── GET    /whoami
///     ├── GET    /projects
///     ├── POST   /projects
///     ├── GET    /projects/:id
///     ├── PUT    /projects/:id
///     ├── DELETE /projects/:id
///     ├── GET    /projects/:id/revision
///     └── POST   /projects/:id/revision
/// ```
///
/// # Middleware Stack
///
/// Applied in order (innermost first):
/// 1. Identity resolution (authenticated routes only)
/// 2. Request timeout
/// 3. Logging (tower-http TraceLayer)
/// 4. CORS
/// 5. Security headers
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/whoami", get(routes::auth::whoami))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:id/revision",
            get(routes::revisions::latest_revision).post(routes::revisions::save_revision),
        )
        .layer(axum::middleware::from_fn(create_jwt_middleware(
            state.tokens.clone(),
        )));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::IF_MODIFIED_SINCE,
            ])
            .expose_headers([header::LAST_MODIFIED])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    let timeout = Duration::from_secs(state.config.api.request_timeout_seconds);

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
