//! Database-backed coverage for the mint, assign and verify workflows, driven
//! through a fake chain client so no RPC endpoint is needed. Each test runs
//! against its own migrated database.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use sqlx::PgPool;

use truetag::app::minting::{AssignError, MintError, MintingService};
use truetag::app::verification::{VerificationService, VerifyError};
use truetag::domain::model::{
    BatchStatus, ProductStatus, Role, TagStatus, User, VerificationResult,
};
use truetag::domain::verify::DuplicateCheckPolicy;
use truetag::infra::chain::{token_id_hex, ChainError, TagMinter};
use truetag::storage::{products, tags, users};

/// Canned mint answers; `ownerOf` is never reached from these workflows.
struct FakeMinter {
    mint: Box<dyn Fn() -> Result<String, ChainError> + Send + Sync>,
}

impl FakeMinter {
    fn minting(mint: impl Fn() -> Result<String, ChainError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self { mint: Box::new(mint) })
    }
}

#[async_trait]
impl TagMinter for FakeMinter {
    async fn mint_warehouse_batch(&self, _tag_codes: &[String]) -> Result<String, ChainError> {
        (self.mint)()
    }

    async fn mint_batch(
        &self,
        _tag_codes: &[String],
        _manufacturer_id: i64,
    ) -> Result<String, ChainError> {
        (self.mint)()
    }

    async fn owner_of(&self, _token_id: U256) -> Result<Address, ChainError> {
        panic!("minting and assignment must not read ownership");
    }

    async fn assign_tags(
        &self,
        _token_ids: &[U256],
        _manufacturer_id: i64,
    ) -> Result<String, ChainError> {
        panic!("pool assignment is database-only");
    }
}

async fn seed_user(pool: &PgPool, email: &str, role: Role) -> User {
    users::insert(pool, email, "$argon2id$fake", None, role)
        .await
        .unwrap()
}

async fn seed_product(pool: &PgPool, manufacturer_id: i64) -> i64 {
    products::insert(
        pool,
        manufacturer_id,
        "Water Pump",
        Some("10k litre/day"),
        "industrial",
        None,
        "/static/pump.png",
    )
    .await
    .unwrap()
    .id
}

async fn tag_count(pool: &PgPool, batch_id: i64) -> i64 {
    sqlx::query_scalar("SELECT count(*) FROM tags WHERE batch_id = $1")
        .bind(batch_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn batch_status(pool: &PgPool, batch_id: i64) -> BatchStatus {
    sqlx::query_scalar("SELECT status FROM batches WHERE id = $1")
        .bind(batch_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn scan_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT count(*) FROM scans")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test]
async fn failed_warehouse_mint_leaves_no_tags(pool: PgPool) {
    let admin = seed_user(&pool, "admin@truetag.io", Role::Admin).await;
    let service = MintingService::new(
        pool.clone(),
        FakeMinter::minting(|| Err(ChainError::Rpc("connection refused".into()))),
    );

    let err = service.mint_warehouse(admin.id, 5).await.unwrap_err();
    assert!(matches!(err, MintError::Chain(ChainError::Rpc(_))));

    let batch_id: i64 = sqlx::query_scalar("SELECT id FROM batches")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(batch_status(&pool, batch_id).await, BatchStatus::Failed);
    assert_eq!(tag_count(&pool, batch_id).await, 0);
}

#[sqlx::test]
async fn confirmed_mint_with_failed_commit_flips_batch_to_failed(pool: PgPool) {
    let admin = seed_user(&pool, "admin@truetag.io", Role::Admin).await;
    let service = MintingService::new(pool.clone(), FakeMinter::minting(|| Ok("0xfeed".into())));

    // Break the tag ledger so the post-mint commit cannot land.
    sqlx::query("DROP TABLE tags CASCADE").execute(&pool).await.unwrap();

    let err = service.mint_warehouse(admin.id, 3).await.unwrap_err();
    assert!(matches!(err, MintError::Db(_)));

    let batch_id: i64 = sqlx::query_scalar("SELECT id FROM batches")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(batch_status(&pool, batch_id).await, BatchStatus::Failed);
}

#[sqlx::test]
async fn warehouse_mint_materializes_unused_tags(pool: PgPool) {
    let admin = seed_user(&pool, "admin@truetag.io", Role::Admin).await;
    let service = MintingService::new(pool.clone(), FakeMinter::minting(|| Ok("0xfeed".into())));

    let batch = service.mint_warehouse(admin.id, 5).await.unwrap();
    assert_eq!(batch.status, BatchStatus::Minted);
    assert_eq!(batch.tx_hash.as_deref(), Some("0xfeed"));

    let minted = tags::list_for_batch(&pool, batch.id).await.unwrap();
    assert_eq!(minted.len(), 5);
    for tag in &minted {
        assert_eq!(tag.status, TagStatus::Unused);
        assert_eq!(tag.product_id, None);
        assert_eq!(tag.token_id, token_id_hex(&tag.tag_code));
        assert_eq!(tag.tx_hash.as_deref(), Some("0xfeed"));
    }
}

#[sqlx::test]
async fn warehouse_mint_survives_bind_parameter_limit(pool: PgPool) {
    // 11000 rows at six binds each would blow the 65535-parameter statement
    // cap if the insert were not chunked.
    let admin = seed_user(&pool, "admin@truetag.io", Role::Admin).await;
    let service = MintingService::new(pool.clone(), FakeMinter::minting(|| Ok("0xbig".into())));

    let batch = service.mint_warehouse(admin.id, 11_000).await.unwrap();
    assert_eq!(batch.status, BatchStatus::Minted);
    assert_eq!(tag_count(&pool, batch.id).await, 11_000);
}

#[sqlx::test]
async fn assignment_is_all_or_nothing(pool: PgPool) {
    let admin = seed_user(&pool, "admin@truetag.io", Role::Admin).await;
    let maker = seed_user(&pool, "maker@acme.io", Role::Manufacturer).await;
    let product_id = seed_product(&pool, maker.id).await;

    let service = MintingService::new(pool.clone(), FakeMinter::minting(|| Ok("0xfeed".into())));
    service.mint_warehouse(admin.id, 5).await.unwrap();

    let err = service
        .assign_to_product(maker.id, product_id, 8)
        .await
        .unwrap_err();
    assert!(matches!(err, AssignError::Insufficient { available: 5 }));

    // A short draw must not consume anything from the pool.
    let unused: i64 = sqlx::query_scalar("SELECT count(*) FROM tags WHERE status = 'unused'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(unused, 5);

    let (product, codes) = service.assign_to_product(maker.id, product_id, 3).await.unwrap();
    assert_eq!(product.id, product_id);
    assert_eq!(codes.len(), 3);

    let linked: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM tags WHERE status = 'active' AND product_id = $1",
    )
    .bind(product_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(linked, 3);
}

#[sqlx::test]
async fn assignment_rejects_foreign_products(pool: PgPool) {
    let admin = seed_user(&pool, "admin@truetag.io", Role::Admin).await;
    let owner = seed_user(&pool, "owner@acme.io", Role::Manufacturer).await;
    let rival = seed_user(&pool, "rival@acme.io", Role::Manufacturer).await;
    let product_id = seed_product(&pool, owner.id).await;

    let service = MintingService::new(pool.clone(), FakeMinter::minting(|| Ok("0xfeed".into())));
    service.mint_warehouse(admin.id, 2).await.unwrap();

    let err = service
        .assign_to_product(rival.id, product_id, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AssignError::ProductNotOwned));
}

#[sqlx::test]
async fn every_verification_appends_exactly_one_scan(pool: PgPool) {
    let admin = seed_user(&pool, "admin@truetag.io", Role::Admin).await;
    let maker = seed_user(&pool, "maker@acme.io", Role::Manufacturer).await;
    let product_id = seed_product(&pool, maker.id).await;

    let minting = MintingService::new(pool.clone(), FakeMinter::minting(|| Ok("0xfeed".into())));
    let batch = minting.mint_direct(admin.id, product_id, 1).await.unwrap();
    let tag_code = tags::list_for_batch(&pool, batch.id).await.unwrap()[0]
        .tag_code
        .clone();

    let verification = VerificationService::new(pool.clone());

    // Unknown code fails before any tag exists, so nothing is recorded.
    let err = verification
        .verify(&DuplicateCheckPolicy, "no-such-code", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::TagNotFound));
    assert_eq!(scan_count(&pool).await, 0);

    let first = verification
        .verify(&DuplicateCheckPolicy, &tag_code, None, Some("Lagos"))
        .await
        .unwrap();
    assert_eq!(first.result, VerificationResult::Valid);
    assert_eq!(scan_count(&pool).await, 1);

    let second = verification
        .verify(&DuplicateCheckPolicy, &tag_code, None, None)
        .await
        .unwrap();
    assert_eq!(second.result, VerificationResult::Duplicate);
    assert_eq!(scan_count(&pool).await, 2);
}

#[sqlx::test]
async fn soft_deleted_product_stays_readable_but_off_active_listings(pool: PgPool) {
    let maker = seed_user(&pool, "maker@acme.io", Role::Manufacturer).await;
    let product_id = seed_product(&pool, maker.id).await;

    assert!(products::soft_delete(&pool, product_id, maker.id).await.unwrap());

    let kept = products::find_owned(&pool, product_id, maker.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.status, ProductStatus::Inactive);

    let active = products::list_owned(&pool, maker.id, Some(ProductStatus::Active), None)
        .await
        .unwrap();
    assert!(active.is_empty());

    let all = products::list_owned(&pool, maker.id, None, None).await.unwrap();
    assert_eq!(all.len(), 1);
}
