//! HTTP-level flows: each test migrates its own database, spawns the router on
//! an ephemeral port and drives it with reqwest, the same way a frontend
//! client would.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{address, Address, U256};
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{json, Value};
use sqlx::PgPool;

use truetag::auth::IdentityCache;
use truetag::domain::model::Role;
use truetag::infra::chain::{ChainError, TagMinter};
use truetag::storage::{products, users};
use truetag::transport::http::error::ApiError;
use truetag::transport::http::{create_router, AppState};
use truetag::Settings;

const ADMIN_WALLET: Address = address!("00000000000000000000000000000000000000aa");

/// Chain client stub: mints always confirm, ownership reads always come back
/// as the admin wallet.
struct FakeMinter;

#[async_trait]
impl TagMinter for FakeMinter {
    async fn mint_warehouse_batch(&self, _tag_codes: &[String]) -> Result<String, ChainError> {
        Ok("0xfeed".to_string())
    }

    async fn mint_batch(
        &self,
        _tag_codes: &[String],
        _manufacturer_id: i64,
    ) -> Result<String, ChainError> {
        Ok("0xfeed".to_string())
    }

    async fn owner_of(&self, _token_id: U256) -> Result<Address, ChainError> {
        Ok(ADMIN_WALLET)
    }

    async fn assign_tags(
        &self,
        _token_ids: &[U256],
        _manufacturer_id: i64,
    ) -> Result<String, ChainError> {
        Ok("0xfeed".to_string())
    }
}

struct TestServer {
    base_url: String,
    static_dir: String,
    client: reqwest::Client,
}

async fn spawn_server(pool: PgPool) -> TestServer {
    let static_dir = std::env::temp_dir()
        .join(format!("truetag-test-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    let settings = Settings {
        secret_key: "test-secret".to_string(),
        access_token_expire_minutes: 60,
        cache_expiration: Duration::from_secs(60),
        static_dir: static_dir.clone(),
        admin_wallet: ADMIN_WALLET.to_string(),
    };
    let state = AppState {
        pool,
        minter: Arc::new(FakeMinter),
        identity_cache: Arc::new(IdentityCache::new(settings.cache_expiration)),
        settings: Arc::new(settings),
        admin_wallet: ADMIN_WALLET,
    };
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        static_dir,
        client: reqwest::Client::new(),
    }
}

impl TestServer {
    async fn register(&self, email: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/auth/register", self.base_url))
            .json(&json!({ "email": email, "password": "hunter2hunter2" }))
            .send()
            .await
            .unwrap()
    }

    async fn login(&self, email: &str) -> String {
        let body: Value = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&json!({ "email": email, "password": "hunter2hunter2" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }
}

#[sqlx::test]
async fn duplicate_registration_is_a_conflict(pool: PgPool) {
    let server = spawn_server(pool.clone()).await;

    let first = server.register("maker@acme.io").await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = server.register("maker@acme.io").await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["error"], "Email already registered");

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM users WHERE email = $1")
        .bind("maker@acme.io")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test]
async fn unique_violation_maps_to_conflict_without_a_pre_check(pool: PgPool) {
    // Two concurrent registrations can both pass the existence check; the
    // loser then hits the unique index and must still surface as 409.
    users::insert(&pool, "maker@acme.io", "$argon2id$fake", None, Role::Manufacturer)
        .await
        .unwrap();
    let err = users::insert(&pool, "maker@acme.io", "$argon2id$fake", None, Role::Manufacturer)
        .await
        .unwrap_err();

    assert_eq!(ApiError::from(err).status_code(), StatusCode::CONFLICT);
}

#[sqlx::test]
async fn failed_product_insert_removes_the_uploaded_image(pool: PgPool) {
    let server = spawn_server(pool.clone()).await;
    server.register("maker@acme.io").await;
    let token = server.login("maker@acme.io").await;

    // Sabotage the catalog so the row insert fails after the file is written.
    sqlx::query("DROP TABLE products CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    let image = reqwest::multipart::Part::bytes(b"fake png bytes".to_vec())
        .file_name("pump.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("name", "Water Pump")
        .text("category", "industrial")
        .part("image", image);

    let response = server
        .client
        .post(format!("{}/products", server.base_url))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let leftovers = match std::fs::read_dir(&server.static_dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    };
    assert_eq!(leftovers, 0, "orphaned upload left in {}", server.static_dir);
}

#[sqlx::test]
async fn mint_assign_and_public_verify_flow(pool: PgPool) {
    let server = spawn_server(pool.clone()).await;

    server.register("admin@truetag.io").await;
    server.register("maker@acme.io").await;
    let admin = users::find_by_email(&pool, "admin@truetag.io")
        .await
        .unwrap()
        .unwrap();
    users::update_role(&pool, admin.id, Role::Admin).await.unwrap();
    let admin_token = server.login("admin@truetag.io").await;
    let maker_token = server.login("maker@acme.io").await;

    let maker = users::find_by_email(&pool, "maker@acme.io").await.unwrap().unwrap();
    let product = products::insert(
        &pool,
        maker.id,
        "Water Pump",
        None,
        "industrial",
        None,
        "/static/pump.png",
    )
    .await
    .unwrap();

    let minted: Value = server
        .client
        .post(format!("{}/tags/mint/warehouse", server.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "count": 5 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(minted["status"], "minted");
    assert_eq!(minted["count"], 5);

    let assigned: Value = server
        .client
        .post(format!("{}/tags/generate", server.base_url))
        .query(&[("product_id", product.id.to_string()), ("count", "3".to_string())])
        .bearer_auth(&maker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let codes = assigned["assigned_tag_codes"].as_array().unwrap();
    assert_eq!(codes.len(), 3);

    // Public scans need no credentials. First scan is valid, the replay is a
    // duplicate, and the product details come back either way.
    let code = codes[0].as_str().unwrap();
    let first: Value = server
        .client
        .get(format!("{}/verify/{code}", server.base_url))
        .query(&[("location", "Lagos")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["verification_result"], "valid");
    assert_eq!(first["product_name"], "Water Pump");

    let replay: Value = server
        .client
        .get(format!("{}/verify/{code}", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replay["verification_result"], "duplicate");
}
