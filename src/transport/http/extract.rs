//! Bearer-token extractors.
//!
//! `AuthUser` resolves the JWT to a user row (through the TTL identity
//! cache); `AdminUser` additionally requires the admin role.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::jwt;
use crate::domain::model::{Role, User};
use crate::storage::users;
use crate::transport::http::error::ApiError;
use crate::transport::http::types::AppState;

pub struct AuthUser(pub User);

pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

        let user_id = jwt::decode_access_token(token, &state.settings.secret_key)?;

        if let Some(user) = state.identity_cache.get(user_id) {
            return Ok(AuthUser(user));
        }

        let user = users::find_by_id(&state.pool, user_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;
        state.identity_cache.insert(user.clone());
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(ApiError::Forbidden("Admins only"));
        }
        Ok(AdminUser(user))
    }
}

/// Manufacturer-only guard used by the catalog and dashboard handlers.
pub fn require_manufacturer(user: &User, action: &'static str) -> Result<(), ApiError> {
    if user.role != Role::Manufacturer {
        return Err(ApiError::Forbidden(action));
    }
    Ok(())
}
