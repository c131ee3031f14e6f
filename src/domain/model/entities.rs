//! Row types for the six TrueTag tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{BatchStatus, MintType, ProductStatus, Role, TagStatus, VerificationResult};

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub manufacturer_id: i64,
    pub category: String,
    pub meta_data: Option<serde_json::Value>,
    pub image_url: String,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Batch {
    pub id: i64,
    pub product_id: Option<i64>,
    pub manufacturer_id: i64,
    pub count: i32,
    pub status: BatchStatus,
    pub mint_type: MintType,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Tag {
    pub id: i64,
    pub tag_code: String,
    pub token_id: String,
    pub tx_hash: Option<String>,
    pub status: TagStatus,
    pub product_id: Option<i64>,
    pub batch_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Scan {
    pub id: i64,
    pub tag_id: i64,
    pub user_id: Option<i64>,
    pub location: Option<String>,
    pub verification_result: VerificationResult,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
