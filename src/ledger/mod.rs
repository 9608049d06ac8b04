// src/ledger/mod.rs
//! Remote ledger boundary
//!
//! Everything this crate knows about the ledger goes through two narrow seams:
//! - [`LedgerRpc`]: read-only `invoke(contract, method, args) -> JSON` plus an
//!   account lookup
//! - [`ClaimSigner`]: submits a claim signed with the link's secret key
//!
//! [`RemoteAccessor`] layers typed helpers over `LedgerRpc` without caching, and
//! [`JsonRpcClient`] is the HTTP transport used outside of tests.

mod accessor;
mod jsonrpc;

pub use accessor::{DropLookup, RemoteAccessor};
pub use jsonrpc::JsonRpcClient;

use crate::keys::SecretKey;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("ledger rejected {method}: {message}")]
    Server { method: String, message: String },

    #[error("could not decode {method} response: {message}")]
    Decode { method: String, message: String },

    #[error("operation not supported by this transport: {0}")]
    Unsupported(String),
}

impl RpcError {
    pub fn server(method: &str, message: impl Into<String>) -> Self {
        Self::Server {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub fn decode(method: &str, message: impl ToString) -> Self {
        Self::Decode {
            method: method.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Read-only query surface of the ledger.
///
/// Implementations apply no caching and no retry.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Call a view method on `contract_id` and return its JSON result
    async fn invoke(&self, contract_id: &str, method: &str, args: Value) -> Result<Value, RpcError>;

    /// Fetch the on-chain state of an account; errors when it does not exist
    async fn view_account(&self, account_id: &str) -> Result<Value, RpcError>;
}

/// Arguments of the `claim` call
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ClaimRequest {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Submits claims. Signing is done with the link's own access key, so the
/// implementation owns whatever key store and transaction plumbing that needs.
#[async_trait]
pub trait ClaimSigner: Send + Sync {
    async fn claim(
        &self,
        contract_id: &str,
        secret_key: &SecretKey,
        request: &ClaimRequest,
    ) -> Result<Value, RpcError>;
}
