use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::model::{
    BatchStatus, MintType, ProductStatus, Role, TagStatus, VerificationResult,
};
use crate::storage::scans::MonthlyCount;
use crate::transport::http::handlers::{auth, dashboard, health, products, tags, users, verify};
use crate::transport::http::types::{
    AppState, AssignmentResponse, BatchResponse, DetailResponse, ErrorResponse, HealthResponse,
    LoginRequest, MintRequest, PasswordResetConfirm, PasswordResetRequest, ProductMetadata,
    ProductResponse, RegisterRequest, RoleUpdateRequest, ScanResponse, StatsResponse,
    TokenResponse, UserResponse, UserUpdateRequest, VerificationResponse,
};

/// Uploads are product images; 10 MiB is generous for a PNG/JPEG.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register,
        auth::login,
        auth::request_password_reset,
        auth::reset_password,
        users::get_me,
        users::update_me,
        users::update_role,
        products::create_product,
        products::list_products,
        products::get_product,
        products::update_product,
        products::delete_product,
        tags::mint_warehouse,
        tags::mint_direct,
        tags::generate_tags,
        tags::verify_on_chain,
        verify::verify_public,
        dashboard::stats,
        dashboard::list_scans
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        TokenResponse,
        PasswordResetRequest,
        PasswordResetConfirm,
        DetailResponse,
        UserResponse,
        UserUpdateRequest,
        RoleUpdateRequest,
        ProductMetadata,
        ProductResponse,
        MintRequest,
        BatchResponse,
        AssignmentResponse,
        VerificationResponse,
        StatsResponse,
        MonthlyCount,
        ScanResponse,
        HealthResponse,
        ErrorResponse,
        Role,
        ProductStatus,
        BatchStatus,
        MintType,
        TagStatus,
        VerificationResult
    )),
    modifiers(&BearerAuth)
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    let static_dir = app_state.settings.static_dir.clone();
    Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/password-reset-request", post(auth::request_password_reset))
        .route("/auth/password-reset", post(auth::reset_password))
        .route("/users/me", get(users::get_me).put(users::update_me))
        .route("/users/:user_id/role", put(users::update_role))
        .route(
            "/products",
            post(products::create_product).get(products::list_products),
        )
        .route(
            "/products/:product_id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/tags/mint/warehouse", post(tags::mint_warehouse))
        .route("/tags/mint/direct", post(tags::mint_direct))
        .route("/tags/generate", post(tags::generate_tags))
        .route("/tags/verify/:tag_code", get(tags::verify_on_chain))
        .route("/verify/:tag_code", get(verify::verify_public))
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/scans", get(dashboard::list_scans))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
