//! Status enums shared between the database layer and the API.
//!
//! All of these are stored as plain TEXT columns; the sqlx `Type` derive maps
//! them to their lowercase string form.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User role. Registration always assigns `Manufacturer`; only an existing
/// admin can promote a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manufacturer,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
    Draft,
}

/// Batch lifecycle: `pending -> {minted, failed}`. A batch whose chain call
/// failed keeps zero tag rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Minted,
    Assigned,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MintType {
    Warehouse,
    Direct,
}

/// Tag lifecycle: `unused -> active -> flagged`. `flagged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TagStatus {
    Unused,
    Active,
    Flagged,
}

/// Outcome of a single verification attempt, recorded exactly once per scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationResult {
    Valid,
    Invalid,
    Duplicate,
    Tampered,
    BlockchainError,
}

impl VerificationResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationResult::Valid => "valid",
            VerificationResult::Invalid => "invalid",
            VerificationResult::Duplicate => "duplicate",
            VerificationResult::Tampered => "tampered",
            VerificationResult::BlockchainError => "blockchain_error",
        }
    }
}
