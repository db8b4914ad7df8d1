/// Identity resolution middleware for Axum
///
/// Turns the `Authorization` header of an inbound request into an
/// authenticated [`Identity`]:
///
/// ```text
/// NoHeader ──> ExtractToken ──> ValidateToken ──> Bound
///     │              │                 │
///     └──────────────┴─────────────────┴──────> Rejected
/// ```
///
/// On success the identity is stored in the request's own extensions, so it
/// lives exactly as long as the request and is never visible to another one.
/// Handlers receive it by taking `Identity` as an extractor argument.
///
/// Rejections distinguish "no credential" (401), "malformed credential"
/// (400) and "invalid or expired token" (401). The precise token failure is
/// logged; the client only sees the generic category.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use frengine_shared::auth::{jwt::TokenIssuer, middleware::{create_jwt_middleware, Identity}};
/// use std::sync::Arc;
///
/// async fn whoami(identity: Identity) -> String {
///     format!("Hello, user {}!", identity.user_id)
/// }
///
/// let issuer = Arc::new(TokenIssuer::new("your-secret-key-at-least-32-bytes-long", 72));
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(create_jwt_middleware(issuer)));
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use std::{future::Future, pin::Pin, sync::Arc};
use tracing::debug;
use uuid::Uuid;

use super::jwt::{TokenError, TokenIssuer};

/// Authenticated caller, bound for the lifetime of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Resolved user ID
    pub user_id: Uuid,
}

impl Identity {
    /// Creates an identity for `user_id`
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for identity resolution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header, or an empty one
    #[error("Missing credentials")]
    NoCredential,

    /// The header is present but not a usable bearer credential
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    /// The token was extracted but failed validation
    #[error("Invalid token: {0}")]
    Token(#[from] TokenError),
}

impl AuthError {
    /// Status, error code and client-facing message
    ///
    /// Messages are fixed strings; nothing from the failed token leaks out.
    pub fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AuthError::NoCredential => (
                StatusCode::UNAUTHORIZED,
                "missing_credentials",
                "Authentication required",
            ),
            AuthError::InvalidFormat(_) | AuthError::Token(TokenError::Malformed(_)) => (
                StatusCode::BAD_REQUEST,
                "malformed_credentials",
                "Malformed bearer credential",
            ),
            AuthError::Token(TokenError::Expired) => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Token expired",
            ),
            AuthError::Token(_) => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid token",
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let mut response = (status, Json(json!({ "error": code, "message": message }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

/// Pulls the bearer credential out of the request headers
///
/// Accepts `Bearer <token>` and, for older clients, a bare token. A token
/// with no `.` separators is treated as the standard-base64 wrapping of a
/// compact JWT and unwrapped.
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::InvalidFormat("Header is not valid ASCII".to_string()))?,
        None => return Err(AuthError::NoCredential),
    };

    let value = value.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some((scheme, _)) => {
            return Err(AuthError::InvalidFormat(format!("Unsupported scheme {}", scheme)));
        }
        // A lone scheme word carries no credential
        None if value.eq_ignore_ascii_case("bearer") => return Err(AuthError::NoCredential),
        None => value,
    };

    if token.is_empty() {
        return Err(AuthError::NoCredential);
    }

    if token.contains('.') {
        return Ok(token.to_string());
    }

    let decoded = STANDARD
        .decode(token)
        .map_err(|_| AuthError::InvalidFormat("Token is not a JWT".to_string()))?;

    String::from_utf8(decoded)
        .map_err(|_| AuthError::InvalidFormat("Token is not a JWT".to_string()))
}

/// Runs the full resolution state machine for one request
pub fn resolve_identity(headers: &HeaderMap, issuer: &TokenIssuer) -> Result<Identity, AuthError> {
    let token = extract_bearer(headers)?;
    let user_id = issuer.validate(&token)?;
    Ok(Identity::new(user_id))
}

/// JWT authentication middleware
///
/// Resolves the caller and binds the [`Identity`] into the request
/// extensions before running the rest of the stack.
///
/// # Errors
///
/// Short-circuits with the [`AuthError`] response on any failure; the
/// handler never runs unauthenticated.
pub async fn jwt_auth_middleware(
    issuer: Arc<TokenIssuer>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = resolve_identity(req.headers(), &issuer).map_err(|e| {
        let reason = match &e {
            AuthError::Token(token_err) => token_err.kind(),
            AuthError::NoCredential => "no_credential",
            AuthError::InvalidFormat(_) => "invalid_format",
        };
        debug!(reason, uri = %req.uri(), "Rejected request credential");
        e
    })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Boxed future returned by the middleware closure
pub type AuthFuture = Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>;

/// Creates a JWT authentication middleware closure for `axum::middleware::from_fn`
pub fn create_jwt_middleware(
    issuer: Arc<TokenIssuer>,
) -> impl Fn(Request, Next) -> AuthFuture + Clone + Send + 'static {
    move |req, next| {
        let issuer = issuer.clone();
        Box::pin(jwt_auth_middleware(issuer, req, next))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only the middleware inserts an Identity; a route mounted without it
        // is treated as unauthenticated.
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or(AuthError::NoCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(&headers("Bearer a.b.c")).unwrap(), "a.b.c");
        assert_eq!(extract_bearer(&headers("bearer a.b.c")).unwrap(), "a.b.c");
        assert_eq!(extract_bearer(&headers("a.b.c")).unwrap(), "a.b.c");
    }

    #[test]
    fn test_extract_bearer_missing_or_empty() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Err(AuthError::NoCredential));
        assert_eq!(extract_bearer(&headers("Bearer ")), Err(AuthError::NoCredential));
        assert_eq!(extract_bearer(&headers("Bearer")), Err(AuthError::NoCredential));
        assert_eq!(extract_bearer(&headers("bearer")), Err(AuthError::NoCredential));
        assert_eq!(extract_bearer(&headers("")), Err(AuthError::NoCredential));
    }

    #[test]
    fn test_extract_bearer_rejects_other_schemes() {
        assert!(matches!(
            extract_bearer(&headers("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_extract_bearer_unwraps_base64() {
        let wrapped = STANDARD.encode("h.p.s");
        assert_eq!(extract_bearer(&headers(&format!("Bearer {}", wrapped))).unwrap(), "h.p.s");

        assert!(matches!(
            extract_bearer(&headers("Bearer !!!")),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_resolve_identity() {
        let issuer = TokenIssuer::new(SECRET, 72);
        let user_id = Uuid::now_v7();
        let token = issuer.issue(user_id).unwrap().token;

        let identity = resolve_identity(&headers(&format!("Bearer {}", token)), &issuer).unwrap();
        assert_eq!(identity.user_id, user_id);

        let wrong = TokenIssuer::new("another-secret-key-at-least-32-bytes", 72);
        assert_eq!(
            resolve_identity(&headers(&format!("Bearer {}", token)), &wrong),
            Err(AuthError::Token(TokenError::SignatureInvalid))
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(AuthError::NoCredential.parts().0, StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InvalidFormat("x".into()).parts().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Token(TokenError::Malformed("x".into())).parts().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Token(TokenError::Expired).parts(),
            (StatusCode::UNAUTHORIZED, "token_expired", "Token expired")
        );
        assert_eq!(
            AuthError::Token(TokenError::SignatureInvalid).parts().1,
            "invalid_token"
        );
    }

    #[test]
    fn test_unauthorized_response_has_challenge() {
        let response = AuthError::NoCredential.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    fn app(issuer: Arc<TokenIssuer>) -> Router {
        async fn whoami(identity: Identity) -> String {
            identity.user_id.to_string()
        }

        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn(create_jwt_middleware(issuer)))
    }

    #[tokio::test]
    async fn test_middleware_binds_identity() {
        let issuer = Arc::new(TokenIssuer::new(SECRET, 72));
        let user_id = Uuid::now_v7();
        let token = issuer.issue(user_id).unwrap().token;

        let response = app(issuer)
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, user_id.to_string());
    }

    #[tokio::test]
    async fn test_middleware_rejects_missing_header() {
        let issuer = Arc::new(TokenIssuer::new(SECRET, 72));

        let response = app(issuer)
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_middleware_treats_bare_scheme_as_missing() {
        let issuer = Arc::new(TokenIssuer::new(SECRET, 72));

        let response = app(issuer)
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, "Bearer")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_identity_extractor_without_middleware() {
        async fn whoami(identity: Identity) -> String {
            identity.user_id.to_string()
        }

        let response = Router::new()
            .route("/whoami", get(whoami))
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
