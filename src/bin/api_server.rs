// src/bin/api_server.rs

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use truetag::auth::IdentityCache;
use truetag::infra::config;
use truetag::transport;
use truetag::{EvmTagMinter, TagMinter};
use truetag::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::from_env();
    let admin_wallet = Address::from_str(&settings.admin_wallet)?;

    info!("connecting to Postgres");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config::database_url())
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("initializing chain client");
    let minter: Arc<dyn TagMinter> = Arc::new(EvmTagMinter::new(
        &config::blockchain_rpc(),
        &config::contract_address(),
        &config::admin_private_key(),
        config::chain_call_timeout(),
    )?);

    let app_state = transport::http::AppState {
        pool,
        minter,
        identity_cache: Arc::new(IdentityCache::new(settings.cache_expiration)),
        settings: Arc::new(settings),
        admin_wallet,
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);

    let bind_addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "API server listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}
