//! Public QR verification. No authentication, no chain access; first scan of
//! an active tag wins, later scans come back `duplicate`.

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::app::VerificationService;
use crate::domain::verify::DuplicateCheckPolicy;
use crate::transport::http::error::ApiError;
use crate::transport::http::types::{AppState, ErrorResponse, VerificationResponse, VerifyQuery};

#[utoipa::path(
    get,
    path = "/verify/{tag_code}",
    params(
        ("tag_code" = String, Path, description = "Tag code from the QR label"),
        VerifyQuery
    ),
    responses(
        (status = 200, description = "Verification outcome", body = VerificationResponse),
        (status = 404, description = "Unknown tag code, no scan recorded", body = ErrorResponse)
    )
)]
pub async fn verify_public(
    State(state): State<AppState>,
    Path(tag_code): Path<String>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerificationResponse>, ApiError> {
    let service = VerificationService::new(state.pool.clone());
    let outcome = service
        .verify(&DuplicateCheckPolicy, &tag_code, None, query.location.as_deref())
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
