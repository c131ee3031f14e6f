//! Smart-contract collaborator: the TrueTag minting contract.
//!
//! Workflows depend on the [`TagMinter`] trait, never on the concrete RPC
//! client, so tests can substitute a fake minter without touching process
//! state. Chain faults keep their cause class instead of collapsing into one
//! message string; the HTTP layer maps them to distinct responses.

pub mod client;
pub mod contract;

pub use client::EvmTagMinter;

use alloy::primitives::{keccak256, Address, U256};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport-level fault: RPC unreachable, connection reset, bad response.
    #[error("blockchain RPC fault: {0}")]
    Rpc(String),
    /// The bounded call deadline elapsed before the transaction confirmed.
    #[error("blockchain call timed out after {0}s")]
    Timeout(u64),
    /// The contract rejected the call (revert).
    #[error("contract rejected transaction: {0}")]
    Reverted(String),
    /// The transaction was mined but its receipt reports failure.
    #[error("transaction {0} failed on-chain")]
    TxFailed(String),
    #[error("invalid contract or wallet address: {0}")]
    BadAddress(String),
    #[error("invalid token id: {0}")]
    BadTokenId(String),
}

/// The three contract entry points plus the ownership read used during
/// verification. Every call blocks until the transaction is confirmed or
/// errors.
#[async_trait]
pub trait TagMinter: Send + Sync {
    /// `mintWarehouseBatch(string[] tagCodes)`: mints into the admin-owned
    /// warehouse pool. Returns the transaction hash.
    async fn mint_warehouse_batch(&self, tag_codes: &[String]) -> Result<String, ChainError>;

    /// `mintBatch(string[] tagCodes, uint256 manufacturerId)`: mints with
    /// on-chain ownership assigned to the manufacturer. Returns the
    /// transaction hash.
    async fn mint_batch(
        &self,
        tag_codes: &[String],
        manufacturer_id: i64,
    ) -> Result<String, ChainError>;

    /// `ownerOf(uint256 tokenId)`: current owner of a minted token.
    async fn owner_of(&self, token_id: U256) -> Result<Address, ChainError>;

    /// `assignTagsToManufacturer(uint256[] tokenIds, uint256 manufacturerId)`:
    /// reassigns existing tokens on-chain. Returns the transaction hash.
    async fn assign_tags(
        &self,
        token_ids: &[U256],
        manufacturer_id: i64,
    ) -> Result<String, ChainError>;
}

/// Token ids are derived by the contract as `keccak256(tagCode)`, so the
/// service can always recompute the id it has to query without a chain read.
pub fn token_id_for_code(tag_code: &str) -> U256 {
    U256::from_be_bytes(keccak256(tag_code.as_bytes()).0)
}

/// Hex form stored in `tags.token_id` (0x-prefixed, 64 nibbles).
pub fn token_id_hex(tag_code: &str) -> String {
    format!("{:#066x}", token_id_for_code(tag_code))
}

/// Parses a stored `tags.token_id` back into the on-chain id.
pub fn parse_token_id(stored: &str) -> Result<U256, ChainError> {
    let trimmed = stored.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed).map_err(|_| ChainError::BadTokenId(stored.to_string()))?;
    if bytes.len() > 32 {
        return Err(ChainError::BadTokenId(stored.to_string()));
    }
    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(U256::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_id_is_deterministic_and_round_trips() {
        let code = "0b6c8e1e-0f4e-4b7a-9c2d-1a2b3c4d5e6f";
        let id = token_id_for_code(code);
        let stored = token_id_hex(code);
        assert!(stored.starts_with("0x"));
        assert_eq!(stored.len(), 66);
        assert_eq!(parse_token_id(&stored).unwrap(), id);
        // Distinct codes yield distinct ids.
        assert_ne!(id, token_id_for_code("another-code"));
    }

    #[test]
    fn parse_token_id_rejects_garbage() {
        assert!(parse_token_id("TOKEN_abc").is_err());
        assert!(parse_token_id(&format!("0x{}", "ff".repeat(33))).is_err());
    }
}
