//! Verification workflow.
//!
//! One workflow for both endpoints; the policy decides the outcome. Whatever
//! the outcome, exactly one Scan row is appended; the only case without a
//! scan is an unknown tag code, which fails before a tag exists.

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::domain::model::{Scan, VerificationResult};
use crate::domain::verify::{TagFacts, VerificationPolicy};
use crate::storage::tags::TagWithProduct;
use crate::storage::{scans, tags};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("tag not found")]
    TagNotFound,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug)]
pub struct VerifiedScan {
    pub tag: TagWithProduct,
    pub scan: Scan,
    pub result: VerificationResult,
}

pub struct VerificationService {
    pool: PgPool,
}

impl VerificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn verify(
        &self,
        policy: &dyn VerificationPolicy,
        tag_code: &str,
        user_id: Option<i64>,
        location: Option<&str>,
    ) -> Result<VerifiedScan, VerifyError> {
        let tag = tags::find_by_code_with_product(&self.pool, tag_code)
            .await?
            .ok_or(VerifyError::TagNotFound)?;

        let facts = TagFacts {
            tag_code: tag.tag_code.clone(),
            status: tag.status,
            token_id: tag.token_id.clone(),
            has_prior_scan: scans::has_prior_scan(&self.pool, tag.id).await?,
        };

        let result = policy.evaluate(&facts).await;

        if result == VerificationResult::Tampered {
            tags::flag_tag(&self.pool, tag.id).await?;
        }

        let scan = scans::insert(&self.pool, tag.id, user_id, location, result).await?;
        info!(tag_code, result = result.as_str(), scan_id = scan.id, "verification recorded");

        Ok(VerifiedScan { tag, scan, result })
    }
}
