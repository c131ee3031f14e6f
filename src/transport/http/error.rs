//! API error taxonomy and HTTP mapping.
//!
//! Ownership failures are reported as NotFound, never Forbidden, so callers
//! cannot probe for the existence of rows they do not own. Chain faults keep
//! their cause and map to 502, distinct from tampered/invalid verification
//! outcomes (which are 200-level results, not errors).

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::app::minting::{AssignError, MintError};
use crate::app::verification::VerifyError;
use crate::auth::jwt::InvalidToken;
use crate::infra::chain::ChainError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("could not validate credentials")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Upstream(#[from] ChainError),
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Internal(source) => {
                error!(error = %source, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(serde_json::json!({ "error": message }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        // Concurrent writers can slip past a handler-level existence check and
        // hit the unique constraint instead; that is still a conflict, not a
        // server fault.
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return ApiError::Conflict("Duplicate value for a unique field".into());
            }
        }
        ApiError::Internal(e.into())
    }
}

impl From<InvalidToken> for ApiError {
    fn from(_: InvalidToken) -> Self {
        ApiError::Unauthorized
    }
}

impl From<MintError> for ApiError {
    fn from(e: MintError) -> Self {
        match e {
            MintError::InvalidCount => ApiError::Validation(e.to_string()),
            MintError::ProductNotOwned => ApiError::NotFound("Product not found"),
            MintError::Chain(cause) => ApiError::Upstream(cause),
            MintError::Db(db) => ApiError::Internal(db.into()),
        }
    }
}

impl From<AssignError> for ApiError {
    fn from(e: AssignError) -> Self {
        match e {
            AssignError::InvalidCount => ApiError::Validation(e.to_string()),
            AssignError::ProductNotOwned => {
                ApiError::NotFound("Product not found or not owned by manufacturer")
            }
            AssignError::Insufficient { available } => ApiError::Validation(format!(
                "Not enough tags available. Only {available} tags are in stock. Please contact TrueTag admin."
            )),
            AssignError::Db(db) => ApiError::Internal(db.into()),
        }
    }
}

impl From<VerifyError> for ApiError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::TagNotFound => ApiError::NotFound("Tag not found"),
            VerifyError::Db(db) => ApiError::Internal(db.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Forbidden("Admins only").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("Tag not found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("Email already registered".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Upstream(ChainError::Timeout(120)).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn chain_causes_stay_distinguishable() {
        let timeout = ApiError::from(MintError::Chain(ChainError::Timeout(120)));
        let revert = ApiError::from(MintError::Chain(ChainError::Reverted("nope".into())));
        assert_eq!(timeout.to_string(), "blockchain call timed out after 120s");
        assert_eq!(revert.to_string(), "contract rejected transaction: nope");
    }

    #[test]
    fn insufficient_pool_is_a_bad_request_with_stock_count() {
        let e = ApiError::from(AssignError::Insufficient { available: 2 });
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert!(e.to_string().contains("Only 2 tags are in stock"));
    }
}
