//! Manufacturer dashboard: aggregate scan stats and the raw scan feed.

use axum::extract::{Query, State};
use axum::Json;

use crate::storage::products;
use crate::storage::scans::{self, ScanFilter};
use crate::transport::http::error::ApiError;
use crate::transport::http::extract::{require_manufacturer, AuthUser};
use crate::transport::http::types::{
    AppState, DashboardQuery, ErrorResponse, ScanResponse, StatsResponse,
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

async fn build_filter(
    state: &AppState,
    manufacturer_id: i64,
    query: &DashboardQuery,
) -> Result<ScanFilter, ApiError> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if end < start {
            return Err(ApiError::Validation(
                "end_date must not precede start_date".to_string(),
            ));
        }
    }
    if let Some(product_id) = query.product_id {
        // Filtering by someone else's product reads as a missing product.
        products::find_owned(&state.pool, product_id, manufacturer_id)
            .await?
            .ok_or(ApiError::NotFound("Product not found"))?;
    }
    Ok(ScanFilter {
        product_id: query.product_id,
        start_date: query.start_date,
        end_date: query.end_date,
    })
}

#[utoipa::path(
    get,
    path = "/dashboard/stats",
    security(("bearer" = [])),
    params(DashboardQuery),
    responses(
        (status = 200, description = "Scan totals and monthly series", body = StatsResponse),
        (status = 400, description = "Inverted date range", body = ErrorResponse),
        (status = 403, description = "Manufacturers only", body = ErrorResponse)
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
    require_manufacturer(&user, "Only manufacturers can view dashboard stats")?;
    let filter = build_filter(&state, user.id, &query).await?;

    let total_scans = scans::total_for_manufacturer(&state.pool, user.id, &filter).await?;
    let scans_by_month = scans::monthly_for_manufacturer(&state.pool, user.id, &filter).await?;

    Ok(Json(StatsResponse {
        total_scans,
        scans_by_month,
    }))
}

#[utoipa::path(
    get,
    path = "/dashboard/scans",
    security(("bearer" = [])),
    params(DashboardQuery),
    responses(
        (status = 200, description = "Scan feed, newest first", body = [ScanResponse]),
        (status = 400, description = "Inverted date range", body = ErrorResponse),
        (status = 403, description = "Manufacturers only", body = ErrorResponse)
    )
)]
pub async fn list_scans(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<ScanResponse>>, ApiError> {
    require_manufacturer(&user, "Only manufacturers can view scans")?;
    let filter = build_filter(&state, user.id, &query).await?;

    let offset = query.offset.unwrap_or(0).max(0);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let rows = scans::list_for_manufacturer(&state.pool, user.id, &filter, offset, limit).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
