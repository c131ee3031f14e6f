//! Registration, login, and password reset.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use tracing::info;

use crate::auth::{jwt, password};
use crate::domain::model::Role;
use crate::storage::users;
use crate::transport::http::error::ApiError;
use crate::transport::http::types::{
    AppState, DetailResponse, ErrorResponse, LoginRequest, PasswordResetConfirm,
    PasswordResetRequest, RegisterRequest, TokenResponse, UserResponse,
};

/// Reset tokens live for one hour.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if users::find_by_email(&state.pool, &payload.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let hash = password::hash_password(&payload.password).map_err(ApiError::Internal)?;
    // Role is server-assigned; a role field in the request body is ignored.
    let user = users::insert(
        &state.pool,
        &payload.email,
        &hash,
        payload.name.as_deref(),
        Role::Manufacturer,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = users::find_by_email(&state.pool, &payload.email)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if !password::verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let access_token = jwt::create_access_token(
        user.id,
        &state.settings.secret_key,
        state.settings.access_token_expire_minutes,
    )?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/password-reset-request",
    request_body = PasswordResetRequest,
    responses(
        (status = 202, description = "Generic acknowledgement", body = DetailResponse)
    )
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<(StatusCode, Json<DetailResponse>), ApiError> {
    // Same body whether or not the account exists, to avoid enumeration.
    let generic = DetailResponse {
        detail: "If an account exists, a reset link will be sent".to_string(),
    };

    if let Some(user) = users::find_by_email(&state.pool, &payload.email).await? {
        let token = password::generate_reset_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        users::insert_reset_token(&state.pool, user.id, &token, expires_at).await?;
        // Stand-in for email delivery.
        info!(email = %payload.email, token, "password reset token issued");
    }

    Ok((StatusCode::ACCEPTED, Json(generic)))
}

#[utoipa::path(
    post,
    path = "/auth/password-reset",
    request_body = PasswordResetConfirm,
    responses(
        (status = 200, description = "Password reset", body = DetailResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirm>,
) -> Result<Json<DetailResponse>, ApiError> {
    let record = users::find_reset_token(&state.pool, &payload.token)
        .await?
        .filter(|t| t.expires_at > Utc::now())
        .ok_or_else(|| ApiError::Validation("Invalid or expired token".to_string()))?;

    let hash = password::hash_password(&payload.new_password).map_err(ApiError::Internal)?;
    users::consume_reset_token(&state.pool, record.id, record.user_id, &hash).await?;

    Ok(Json(DetailResponse {
        detail: "Password reset successfully".to_string(),
    }))
}
