//! Profile and role management.

use axum::extract::{Path, State};
use axum::Json;

use crate::storage::users;
use crate::transport::http::error::ApiError;
use crate::transport::http::extract::{AdminUser, AuthUser};
use crate::transport::http::types::{
    AppState, ErrorResponse, RoleUpdateRequest, UserResponse, UserUpdateRequest,
};

#[utoipa::path(
    get,
    path = "/users/me",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

#[utoipa::path(
    put,
    path = "/users/me",
    security(("bearer" = [])),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 409, description = "Email already taken", body = ErrorResponse)
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UserUpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(ref email) = payload.email {
        if let Some(existing) = users::find_by_email(&state.pool, email).await? {
            if existing.id != user.id {
                return Err(ApiError::Conflict("Email already taken".to_string()));
            }
        }
    }

    let updated = users::update_profile(
        &state.pool,
        user.id,
        payload.email.as_deref(),
        payload.name.as_deref(),
    )
    .await?;
    // The cache entry for the old profile ages out on its own; reads may see
    // the stale row until the TTL passes.
    Ok(Json(updated.into()))
}

#[utoipa::path(
    put,
    path = "/users/{user_id}/role",
    security(("bearer" = [])),
    params(("user_id" = i64, Path, description = "User to change")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<RoleUpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let updated = users::update_role(&state.pool, user_id, payload.role)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(updated.into()))
}
