//! Minting, pool assignment, and on-chain verification.

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::app::{MintingService, VerificationService};
use crate::domain::verify::OnChainPolicy;
use crate::transport::http::error::ApiError;
use crate::transport::http::extract::{require_manufacturer, AdminUser, AuthUser};
use crate::transport::http::types::{
    AppState, AssignQuery, AssignmentResponse, BatchResponse, ErrorResponse, MintRequest,
    VerificationResponse, VerifyQuery,
};

#[utoipa::path(
    post,
    path = "/tags/mint/warehouse",
    security(("bearer" = [])),
    request_body = MintRequest,
    responses(
        (status = 200, description = "Minted batch", body = BatchResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 502, description = "Chain fault, batch marked failed", body = ErrorResponse)
    )
)]
pub async fn mint_warehouse(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<MintRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let service = MintingService::new(state.pool.clone(), state.minter.clone());
    let batch = service.mint_warehouse(admin.id, payload.count).await?;
    Ok(Json(batch.into()))
}

#[utoipa::path(
    post,
    path = "/tags/mint/direct",
    security(("bearer" = [])),
    request_body = MintRequest,
    responses(
        (status = 200, description = "Minted batch", body = BatchResponse),
        (status = 400, description = "product_id is required", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "No such product", body = ErrorResponse),
        (status = 502, description = "Chain fault, batch marked failed", body = ErrorResponse)
    )
)]
pub async fn mint_direct(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<MintRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let product_id = payload
        .product_id
        .ok_or_else(|| ApiError::Validation("product_id is required for direct minting".to_string()))?;
    let service = MintingService::new(state.pool.clone(), state.minter.clone());
    let batch = service.mint_direct(admin.id, product_id, payload.count).await?;
    Ok(Json(batch.into()))
}

#[utoipa::path(
    post,
    path = "/tags/generate",
    security(("bearer" = [])),
    params(AssignQuery),
    responses(
        (status = 200, description = "Tags assigned", body = AssignmentResponse),
        (status = 400, description = "Pool too small, nothing assigned", body = ErrorResponse),
        (status = 403, description = "Manufacturers only", body = ErrorResponse),
        (status = 404, description = "Product not found or not owned", body = ErrorResponse)
    )
)]
pub async fn generate_tags(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<AssignQuery>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    require_manufacturer(&user, "Only manufacturers can generate tags")?;

    let service = MintingService::new(state.pool.clone(), state.minter.clone());
    let (product, assigned_tag_codes) = service
        .assign_to_product(user.id, query.product_id, query.count)
        .await?;

    Ok(Json(AssignmentResponse {
        message: format!(
            "Successfully assigned {} tags to product '{}' (ID: {}).",
            assigned_tag_codes.len(),
            product.name,
            product.id
        ),
        assigned_tag_codes,
    }))
}

#[utoipa::path(
    get,
    path = "/tags/verify/{tag_code}",
    params(
        ("tag_code" = String, Path, description = "Tag code from the QR label"),
        VerifyQuery
    ),
    responses(
        (status = 200, description = "Verification outcome", body = VerificationResponse),
        (status = 404, description = "Unknown tag code, no scan recorded", body = ErrorResponse)
    )
)]
pub async fn verify_on_chain(
    State(state): State<AppState>,
    Path(tag_code): Path<String>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerificationResponse>, ApiError> {
    let policy = OnChainPolicy::new(state.minter.clone(), state.admin_wallet);
    let service = VerificationService::new(state.pool.clone());
    let outcome = service
        .verify(&policy, &tag_code, None, query.location.as_deref())
        .await?;

    Ok(Json(VerificationResponse {
        tag_id: outcome.tag.id,
        tag_code: outcome.tag.tag_code,
        verification_result: outcome.result,
        product_name: outcome.tag.product_name,
        product_description: outcome.tag.product_description,
        product_category: outcome.tag.product_category,
        product_image_url: outcome.tag.product_image_url,
        timestamp: outcome.scan.timestamp,
    }))
}
