/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Register new account
/// - `POST /auth/login` - Login and get a session token
/// - `GET /whoami` - Echo the authenticated user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use frengine_shared::{
    auth::{middleware::Identity, vault},
    models::account::User,
    store::AccountStore,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidationErrors};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Account name, unique
    #[validate(length(max = 64, message = "Name must be at most 64 characters"))]
    pub name: String,

    /// Password, checked against the password policy
    #[validate(length(max = 1024, message = "Password must be at most 1024 characters"))]
    pub password: String,

    /// Confirmation, must equal `password`
    pub password2: String,
}

/// Bare success acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account name
    #[validate(length(min = 1, message = "Login must not be empty"))]
    pub login: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,

    /// Session token (compact JWT)
    pub token: String,

    /// The logged-in user
    pub user: User,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Converts validator errors into response details
pub(crate) fn validation_error(errors: ValidationErrors) -> ApiError {
    let details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();

    ApiError::ValidationError(details)
}

/// Register a new account
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// { "name": "alice", "password": "correct horse", "password2": "correct horse" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: empty field, mismatch, or short password
/// - `409 Conflict`: name already taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    req.validate().map_err(validation_error)?;

    vault::register(
        state.store.as_ref(),
        &state.password_policy,
        &req.name,
        &req.password,
        &req.password2,
    )
    .await?;

    Ok(SuccessResponse::ok())
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "login": "alice", "password": "correct horse" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: unknown account or wrong password, same body for both
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(validation_error)?;

    let user = vault::verify_login(state.store.as_ref(), &req.login, &req.password).await?;
    let issued = state.tokens.issue(user.id)?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        token: issued.token,
        user,
        expires_at: issued.expires_at,
    }))
}

/// Echoes the authenticated user
pub async fn whoami(State(state): State<AppState>, identity: Identity) -> ApiResult<Json<User>> {
    let account = state
        .store
        .find_account_by_id(identity.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    Ok(Json(User::from(&account)))
}
