//! Verification policies.
//!
//! Both verification endpoints share one workflow (lookup, evaluate, record a
//! scan); only the evaluation step differs. The two rules live behind
//! [`VerificationPolicy`] so they cannot drift apart:
//!
//! - [`OnChainPolicy`] (`/tags/verify/{code}`): database status first, then
//!   an ownership check against the admin wallet.
//! - [`DuplicateCheckPolicy`] (public `/verify/{code}`): database status plus
//!   a first-scan-wins duplicate rule, no chain access.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use tracing::warn;

use crate::domain::model::{TagStatus, VerificationResult};
use crate::infra::chain::{parse_token_id, ChainError, TagMinter};

/// Everything a policy may look at. Gathered by the workflow before
/// evaluation so policies stay free of database access.
#[derive(Debug, Clone)]
pub struct TagFacts {
    pub tag_code: String,
    pub status: TagStatus,
    pub token_id: String,
    pub has_prior_scan: bool,
}

#[async_trait]
pub trait VerificationPolicy: Send + Sync {
    async fn evaluate(&self, facts: &TagFacts) -> VerificationResult;
}

/// A tag that is not `active` can never verify, regardless of policy.
pub fn db_precheck(status: TagStatus) -> Option<VerificationResult> {
    match status {
        TagStatus::Unused | TagStatus::Flagged => Some(VerificationResult::Invalid),
        TagStatus::Active => None,
    }
}

/// First scan of an active tag is valid; every later scan is a duplicate.
pub fn duplicate_outcome(status: TagStatus, has_prior_scan: bool) -> VerificationResult {
    if let Some(result) = db_precheck(status) {
        return result;
    }
    if has_prior_scan {
        VerificationResult::Duplicate
    } else {
        VerificationResult::Valid
    }
}

/// Maps the on-chain ownership answer to a verification outcome. A contract
/// revert means the token does not exist on-chain (fake or burned); transport
/// faults degrade to `blockchain_error` instead of failing the request.
pub fn ownership_outcome(
    owner: Result<Address, ChainError>,
    expected_owner: Address,
) -> VerificationResult {
    match owner {
        Ok(owner) if owner == expected_owner => VerificationResult::Valid,
        Ok(_) => VerificationResult::Tampered,
        Err(ChainError::Reverted(_)) => VerificationResult::Invalid,
        Err(_) => VerificationResult::BlockchainError,
    }
}

pub struct DuplicateCheckPolicy;

#[async_trait]
impl VerificationPolicy for DuplicateCheckPolicy {
    async fn evaluate(&self, facts: &TagFacts) -> VerificationResult {
        duplicate_outcome(facts.status, facts.has_prior_scan)
    }
}

pub struct OnChainPolicy {
    minter: Arc<dyn TagMinter>,
    expected_owner: Address,
}

impl OnChainPolicy {
    pub fn new(minter: Arc<dyn TagMinter>, expected_owner: Address) -> Self {
        Self {
            minter,
            expected_owner,
        }
    }
}

#[async_trait]
impl VerificationPolicy for OnChainPolicy {
    async fn evaluate(&self, facts: &TagFacts) -> VerificationResult {
        if let Some(result) = db_precheck(facts.status) {
            return result;
        }
        let token_id = match parse_token_id(&facts.token_id) {
            Ok(id) => id,
            Err(e) => {
                warn!(tag_code = %facts.tag_code, error = %e, "stored token id is unparseable");
                return VerificationResult::BlockchainError;
            }
        };
        let owner = self.minter.owner_of(token_id).await;
        let result = ownership_outcome(owner, self.expected_owner);
        if result == VerificationResult::Tampered {
            warn!(tag_code = %facts.tag_code, "owner mismatch, tag tampered");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const ADMIN: Address = address!("00000000000000000000000000000000000000aa");
    const OTHER: Address = address!("00000000000000000000000000000000000000bb");

    #[test]
    fn non_active_tags_are_invalid() {
        assert_eq!(db_precheck(TagStatus::Unused), Some(VerificationResult::Invalid));
        assert_eq!(db_precheck(TagStatus::Flagged), Some(VerificationResult::Invalid));
        assert_eq!(db_precheck(TagStatus::Active), None);
    }

    #[test]
    fn duplicate_rule() {
        assert_eq!(
            duplicate_outcome(TagStatus::Active, false),
            VerificationResult::Valid
        );
        assert_eq!(
            duplicate_outcome(TagStatus::Active, true),
            VerificationResult::Duplicate
        );
        assert_eq!(
            duplicate_outcome(TagStatus::Unused, false),
            VerificationResult::Invalid
        );
        assert_eq!(
            duplicate_outcome(TagStatus::Flagged, true),
            VerificationResult::Invalid
        );
    }

    #[test]
    fn ownership_mapping() {
        assert_eq!(ownership_outcome(Ok(ADMIN), ADMIN), VerificationResult::Valid);
        assert_eq!(ownership_outcome(Ok(OTHER), ADMIN), VerificationResult::Tampered);
        assert_eq!(
            ownership_outcome(Err(ChainError::Reverted("ownerOf: nonexistent token".into())), ADMIN),
            VerificationResult::Invalid
        );
        assert_eq!(
            ownership_outcome(Err(ChainError::Rpc("connection refused".into())), ADMIN),
            VerificationResult::BlockchainError
        );
        assert_eq!(
            ownership_outcome(Err(ChainError::Timeout(120)), ADMIN),
            VerificationResult::BlockchainError
        );
    }
}
