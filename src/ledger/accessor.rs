// src/ledger/accessor.rs
// Typed view calls over a LedgerRpc; no caching happens here

use super::{LedgerRpc, RpcError};
use crate::drops::{AttendeeKey, Drop, KeyInfo};
use crate::keys::PublicKey;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// How a drop is looked up
#[derive(Clone, Debug)]
pub enum DropLookup<'a> {
    Id(&'a str),
    Key(&'a PublicKey),
}

/// Thin call wrapper bound to one contract.
///
/// Cloning is cheap; use [`RemoteAccessor::with_contract`] to talk to another
/// deployment through the same transport.
#[derive(Clone)]
pub struct RemoteAccessor {
    rpc: Arc<dyn LedgerRpc>,
    contract_id: String,
}

impl RemoteAccessor {
    pub fn new(rpc: Arc<dyn LedgerRpc>, contract_id: impl Into<String>) -> Self {
        Self {
            rpc,
            contract_id: contract_id.into(),
        }
    }

    pub fn with_contract(&self, contract_id: impl Into<String>) -> Self {
        Self {
            rpc: self.rpc.clone(),
            contract_id: contract_id.into(),
        }
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    /// Raw view call against an arbitrary contract. Failures propagate unchanged.
    pub async fn invoke(&self, contract_id: &str, method: &str, args: Value) -> Result<Value, RpcError> {
        debug!(contract = %contract_id, %method, %args, "calling view function");
        self.rpc.invoke(contract_id, method, args).await
    }

    async fn view<T: DeserializeOwned>(&self, method: &str, args: Value) -> Result<T, RpcError> {
        let value = self.invoke(&self.contract_id, method, args).await?;
        serde_json::from_value(value).map_err(|e| RpcError::decode(method, e))
    }

    pub async fn view_account(&self, account_id: &str) -> Result<Value, RpcError> {
        debug!(%account_id, "viewing account");
        self.rpc.view_account(account_id).await
    }

    // ------------------------------------------------------------------
    // Drops by owner
    // ------------------------------------------------------------------

    pub async fn drop_supply_for_owner(&self, account_id: &str) -> Result<u64, RpcError> {
        self.view("get_drop_supply_for_owner", json!({ "account_id": account_id }))
            .await
    }

    pub async fn drops_for_owner(&self, account_id: &str, from_index: u64, limit: u64) -> Result<Vec<Drop>, RpcError> {
        self.view(
            "get_drops_for_owner",
            json!({
                "account_id": account_id,
                "from_index": from_index.to_string(),
                "limit": limit,
            }),
        )
        .await
    }

    pub async fn drop_information(&self, lookup: DropLookup<'_>) -> Result<Drop, RpcError> {
        let args = match lookup {
            DropLookup::Id(drop_id) => json!({ "drop_id": drop_id }),
            DropLookup::Key(public_key) => json!({ "key": public_key.as_str() }),
        };
        self.view("get_drop_information", args).await
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    pub async fn key_supply_for_drop(&self, drop_id: &str) -> Result<u64, RpcError> {
        self.view("get_key_supply_for_drop", json!({ "drop_id": drop_id }))
            .await
    }

    /// `None` when the key no longer exists on the ledger
    pub async fn key_information(&self, public_key: &PublicKey) -> Result<Option<KeyInfo>, RpcError> {
        self.view("get_key_information", json!({ "key": public_key.as_str() }))
            .await
    }

    pub async fn key_information_batch(&self, public_keys: &[PublicKey]) -> Result<Vec<Option<KeyInfo>>, RpcError> {
        let keys: Vec<&str> = public_keys.iter().map(PublicKey::as_str).collect();
        let infos: Vec<Option<KeyInfo>> = self
            .view("get_key_information_batch", json!({ "keys": keys }))
            .await?;
        if infos.len() != public_keys.len() {
            return Err(RpcError::decode(
                "get_key_information_batch",
                format!("asked for {} keys, got {}", public_keys.len(), infos.len()),
            ));
        }
        Ok(infos)
    }

    pub async fn keys_for_drop(&self, drop_id: &str, from_index: u64, limit: u64) -> Result<Vec<AttendeeKey>, RpcError> {
        self.view(
            "get_keys_for_drop",
            json!({
                "drop_id": drop_id,
                "from_index": from_index.to_string(),
                "limit": limit,
            }),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Drops by funder (events deployment)
    // ------------------------------------------------------------------

    pub async fn drop_supply_for_funder(&self, account_id: &str) -> Result<u64, RpcError> {
        self.view("get_drop_supply_for_funder", json!({ "account_id": account_id }))
            .await
    }

    pub async fn drops_for_funder(&self, account_id: &str, from_index: u64, limit: u64) -> Result<Vec<Drop>, RpcError> {
        self.view(
            "get_drops_for_funder",
            json!({
                "account_id": account_id,
                "from_index": from_index.to_string(),
                "limit": limit,
            }),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Asset contracts
    // ------------------------------------------------------------------

    pub async fn ft_metadata(&self, ft_contract_id: &str) -> Result<Value, RpcError> {
        self.invoke(ft_contract_id, "ft_metadata", json!({})).await
    }

    /// Series info on an NFT series contract; `mint_id` is the drop id.
    pub async fn series_info(&self, nft_contract_id: &str, mint_id: &str) -> Result<Value, RpcError> {
        let mint_id: Value = mint_id
            .parse::<u64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(mint_id));
        self.invoke(nft_contract_id, "get_series_info", json!({ "mint_id": mint_id }))
            .await
    }
}
