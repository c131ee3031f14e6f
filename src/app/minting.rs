//! Batch minting and pool assignment workflows.
//!
//! Batch state machine: `pending -> minted` on a confirmed contract call,
//! `pending -> failed` on any chain fault. A failed batch never has tag rows;
//! there is no retry, the operator re-runs the mint.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::model::{Batch, MintType, Product, TagStatus};
use crate::infra::chain::{ChainError, TagMinter};
use crate::storage::{products, tags};
use crate::storage::tags::AssignOutcome;

#[derive(Debug, Error)]
pub enum MintError {
    #[error("count must be greater than zero")]
    InvalidCount,
    #[error("product not found or not owned")]
    ProductNotOwned,
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum AssignError {
    #[error("count must be greater than zero")]
    InvalidCount,
    #[error("product not found or not owned")]
    ProductNotOwned,
    #[error("only {available} tags are in stock")]
    Insufficient { available: i64 },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub struct MintingService {
    pool: PgPool,
    minter: Arc<dyn TagMinter>,
}

impl MintingService {
    pub fn new(pool: PgPool, minter: Arc<dyn TagMinter>) -> Self {
        Self { pool, minter }
    }

    /// Mints `count` tags into the shared warehouse pool. Tags materialize
    /// `unused`, with no product.
    pub async fn mint_warehouse(&self, admin_id: i64, count: i32) -> Result<Batch, MintError> {
        if count <= 0 {
            return Err(MintError::InvalidCount);
        }
        let tag_codes = generate_tag_codes(count as usize);
        let batch =
            tags::insert_batch(&self.pool, None, admin_id, count, MintType::Warehouse).await?;
        info!(batch_id = batch.id, count, "warehouse mint started");

        let tx_hash = match self.minter.mint_warehouse_batch(&tag_codes).await {
            Ok(hash) => hash,
            Err(e) => return Err(self.fail_batch(batch.id, e).await),
        };

        self.finalize(batch.id, &tx_hash, &tag_codes, TagStatus::Unused, None)
            .await
    }

    /// Mints `count` tags pre-linked to an owned product, with on-chain
    /// ownership assigned to the manufacturer of record.
    pub async fn mint_direct(
        &self,
        admin_id: i64,
        product_id: i64,
        count: i32,
    ) -> Result<Batch, MintError> {
        if count <= 0 {
            return Err(MintError::InvalidCount);
        }
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(MintError::ProductNotOwned)?;

        let tag_codes = generate_tag_codes(count as usize);
        let batch = tags::insert_batch(
            &self.pool,
            Some(product.id),
            admin_id,
            count,
            MintType::Direct,
        )
        .await?;
        info!(batch_id = batch.id, product_id, count, "direct mint started");

        let tx_hash = match self
            .minter
            .mint_batch(&tag_codes, product.manufacturer_id)
            .await
        {
            Ok(hash) => hash,
            Err(e) => return Err(self.fail_batch(batch.id, e).await),
        };

        self.finalize(
            batch.id,
            &tx_hash,
            &tag_codes,
            TagStatus::Active,
            Some(product.id),
        )
        .await
    }

    async fn finalize(
        &self,
        batch_id: i64,
        tx_hash: &str,
        tag_codes: &[String],
        tag_status: TagStatus,
        product_id: Option<i64>,
    ) -> Result<Batch, MintError> {
        match tags::finalize_minted_batch(
            &self.pool,
            batch_id,
            tx_hash,
            tag_codes,
            tag_status,
            product_id,
        )
        .await
        {
            Ok(batch) => {
                info!(batch_id, tx_hash, "batch minted");
                Ok(batch)
            }
            Err(e) => {
                // The chain call confirmed but the local commit did not. Flip
                // to failed so the minted-iff-tags-exist invariant holds; the
                // operator reconciles the orphaned on-chain tokens manually.
                error!(batch_id, tx_hash, error = %e, "mint confirmed on-chain but local commit failed");
                if let Err(mark_err) = tags::mark_batch_failed(&self.pool, batch_id).await {
                    error!(batch_id, error = %mark_err, "could not mark batch failed");
                }
                Err(MintError::Db(e))
            }
        }
    }

    async fn fail_batch(&self, batch_id: i64, cause: ChainError) -> MintError {
        error!(batch_id, error = %cause, "mint failed, marking batch failed");
        if let Err(e) = tags::mark_batch_failed(&self.pool, batch_id).await {
            error!(batch_id, error = %e, "could not mark batch failed");
        }
        MintError::Chain(cause)
    }

    /// Pool draw: assigns `count` unused tags to an owned product,
    /// all-or-nothing.
    pub async fn assign_to_product(
        &self,
        manufacturer_id: i64,
        product_id: i64,
        count: i64,
    ) -> Result<(Product, Vec<String>), AssignError> {
        if count <= 0 {
            return Err(AssignError::InvalidCount);
        }
        let product = products::find_owned(&self.pool, product_id, manufacturer_id)
            .await?
            .ok_or(AssignError::ProductNotOwned)?;

        match tags::assign_unused_tags(&self.pool, product.id, count).await? {
            AssignOutcome::Assigned(codes) => {
                info!(product_id, assigned = codes.len(), "tags assigned from pool");
                Ok((product, codes))
            }
            AssignOutcome::Insufficient { available } => {
                Err(AssignError::Insufficient { available })
            }
        }
    }
}

fn generate_tag_codes(count: usize) -> Vec<String> {
    (0..count).map(|_| Uuid::new_v4().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_codes_are_unique_uuids() {
        let codes = generate_tag_codes(100);
        assert_eq!(codes.len(), 100);
        let mut dedup = codes.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 100);
        assert!(codes.iter().all(|c| Uuid::parse_str(c).is_ok()));
    }
}
