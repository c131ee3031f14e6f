//! EVM implementation of [`TagMinter`] over JSON-RPC.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::{info, warn};

use super::contract::ITrueTag;
use super::{ChainError, TagMinter};

pub struct EvmTagMinter {
    rpc_url: String,
    contract_address: Address,
    signer: PrivateKeySigner,
    call_timeout: Duration,
}

impl EvmTagMinter {
    pub fn new(
        rpc_url: &str,
        contract_address: &str,
        admin_private_key: &str,
        call_timeout: Duration,
    ) -> Result<Self, ChainError> {
        let contract_address = Address::from_str(contract_address)
            .map_err(|_| ChainError::BadAddress(contract_address.to_string()))?;
        let signer = PrivateKeySigner::from_str(admin_private_key)
            .map_err(|_| ChainError::BadAddress("admin private key".to_string()))?;

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            contract_address,
            signer,
            call_timeout,
        })
    }

    pub fn admin_wallet(&self) -> Address {
        self.signer.address()
    }

    fn provider(&self) -> Result<impl Provider, ChainError> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let url = self
            .rpc_url
            .parse()
            .map_err(|_| ChainError::BadAddress(self.rpc_url.clone()))?;
        Ok(ProviderBuilder::new().wallet(wallet).connect_http(url))
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, ChainError>
    where
        F: Future<Output = Result<T, ChainError>>,
    {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| ChainError::Timeout(self.call_timeout.as_secs()))?
    }
}

/// A JSON-RPC error response means the node executed the call and the contract
/// rejected it; anything else is a transport fault.
fn classify(err: alloy::contract::Error) -> ChainError {
    match &err {
        alloy::contract::Error::TransportError(rpc_err) if rpc_err.as_error_resp().is_some() => {
            ChainError::Reverted(err.to_string())
        }
        alloy::contract::Error::TransportError(_) => ChainError::Rpc(err.to_string()),
        other => ChainError::Rpc(other.to_string()),
    }
}

#[async_trait]
impl TagMinter for EvmTagMinter {
    async fn mint_warehouse_batch(&self, tag_codes: &[String]) -> Result<String, ChainError> {
        let provider = self.provider()?;
        let contract = ITrueTag::new(self.contract_address, &provider);
        let codes = tag_codes.to_vec();

        self.bounded(async {
            let pending = contract
                .mintWarehouseBatch(codes)
                .send()
                .await
                .map_err(classify)?;
            let receipt = pending
                .get_receipt()
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?;
            let tx_hash = format!("{:#x}", receipt.transaction_hash);
            if !receipt.status() {
                warn!(tx_hash, "warehouse mint reverted after inclusion");
                return Err(ChainError::TxFailed(tx_hash));
            }
            info!(tx_hash, count = tag_codes.len(), "warehouse batch minted");
            Ok(tx_hash)
        })
        .await
    }

    async fn mint_batch(
        &self,
        tag_codes: &[String],
        manufacturer_id: i64,
    ) -> Result<String, ChainError> {
        let provider = self.provider()?;
        let contract = ITrueTag::new(self.contract_address, &provider);
        let codes = tag_codes.to_vec();

        self.bounded(async {
            let pending = contract
                .mintBatch(codes, U256::from(manufacturer_id as u64))
                .send()
                .await
                .map_err(classify)?;
            let receipt = pending
                .get_receipt()
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?;
            let tx_hash = format!("{:#x}", receipt.transaction_hash);
            if !receipt.status() {
                warn!(tx_hash, "direct mint reverted after inclusion");
                return Err(ChainError::TxFailed(tx_hash));
            }
            info!(tx_hash, count = tag_codes.len(), manufacturer_id, "direct batch minted");
            Ok(tx_hash)
        })
        .await
    }

    async fn owner_of(&self, token_id: U256) -> Result<Address, ChainError> {
        let provider = self.provider()?;
        let contract = ITrueTag::new(self.contract_address, &provider);

        self.bounded(async { contract.ownerOf(token_id).call().await.map_err(classify) })
            .await
    }

    async fn assign_tags(
        &self,
        token_ids: &[U256],
        manufacturer_id: i64,
    ) -> Result<String, ChainError> {
        let provider = self.provider()?;
        let contract = ITrueTag::new(self.contract_address, &provider);
        let ids = token_ids.to_vec();

        self.bounded(async {
            let pending = contract
                .assignTagsToManufacturer(ids, U256::from(manufacturer_id as u64))
                .send()
                .await
                .map_err(classify)?;
            let receipt = pending
                .get_receipt()
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?;
            let tx_hash = format!("{:#x}", receipt.transaction_hash);
            if !receipt.status() {
                return Err(ChainError::TxFailed(tx_hash));
            }
            info!(tx_hash, manufacturer_id, "tags reassigned on-chain");
            Ok(tx_hash)
        })
        .await
    }
}
