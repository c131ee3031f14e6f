use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::transport::http::types::{AppState, HealthResponse};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy (DB reachable)", body = HealthResponse),
        (status = 503, description = "Service is unhealthy (DB unreachable)", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, body) = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };
    (
        status,
        Json(HealthResponse {
            status: body.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
