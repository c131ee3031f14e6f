//! Shared state and request/response DTOs.

use std::sync::Arc;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::IdentityCache;
use crate::domain::model::{
    Batch, BatchStatus, MintType, Product, ProductStatus, Role, User, VerificationResult,
};
use crate::infra::chain::TagMinter;
use crate::infra::config::Settings;
use crate::storage::scans::{MonthlyCount, ScanDetail};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub minter: Arc<dyn TagMinter>,
    pub identity_cache: Arc<IdentityCache>,
    pub settings: Arc<Settings>,
    /// Expected owner of warehouse/verified tokens, parsed once at startup.
    pub admin_wallet: Address,
}

// --- Auth ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DetailResponse {
    pub detail: String,
}

// --- Users ---

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleUpdateRequest {
    pub role: Role,
}

// --- Products ---

/// Structured metadata carried on a product (stored as JSONB).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductMetadata {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub production_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub manufacturer_id: i64,
    pub category: String,
    #[schema(value_type = Object)]
    pub meta_data: Option<serde_json::Value>,
    pub image_url: String,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            manufacturer_id: p.manufacturer_id,
            category: p.category,
            meta_data: p.meta_data,
            image_url: p.image_url,
            status: p.status,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListProductsQuery {
    pub status: Option<ProductStatus>,
    pub category: Option<String>,
}

// --- Tags / batches ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct MintRequest {
    #[serde(default)]
    pub product_id: Option<i64>,
    pub count: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchResponse {
    pub id: i64,
    pub product_id: Option<i64>,
    pub manufacturer_id: i64,
    pub count: i32,
    pub status: BatchStatus,
    pub mint_type: MintType,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Batch> for BatchResponse {
    fn from(b: Batch) -> Self {
        Self {
            id: b.id,
            product_id: b.product_id,
            manufacturer_id: b.manufacturer_id,
            count: b.count,
            status: b.status,
            mint_type: b.mint_type,
            tx_hash: b.tx_hash,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AssignQuery {
    pub product_id: i64,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentResponse {
    pub message: String,
    pub assigned_tag_codes: Vec<String>,
}

// --- Verification ---

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifyQuery {
    pub location: Option<String>,
}

/// Public product fields are nullable: an unused pool tag has no product yet,
/// and its scan still records an `invalid` result.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerificationResponse {
    pub tag_id: i64,
    pub tag_code: String,
    pub verification_result: VerificationResult,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_category: Option<String>,
    pub product_image_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// --- Dashboard ---

#[derive(Debug, Deserialize, IntoParams)]
pub struct DashboardQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub product_id: Option<i64>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_scans: i64,
    pub scans_by_month: Vec<MonthlyCount>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanResponse {
    pub id: i64,
    pub tag_id: i64,
    pub verification_result: VerificationResult,
    pub location: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub tag_code: String,
    pub product_name: String,
    pub product_description: Option<String>,
    pub product_category: String,
    pub product_image_url: String,
}

impl From<ScanDetail> for ScanResponse {
    fn from(s: ScanDetail) -> Self {
        Self {
            id: s.id,
            tag_id: s.tag_id,
            verification_result: s.verification_result,
            location: s.location,
            timestamp: s.timestamp,
            tag_code: s.tag_code,
            product_name: s.product_name,
            product_description: s.product_description,
            product_category: s.product_category,
            product_image_url: s.product_image_url,
        }
    }
}

// --- Misc ---

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body shape shared by every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
