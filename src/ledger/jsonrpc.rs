// src/ledger/jsonrpc.rs
// HTTP JSON-RPC transport for view calls

use super::{LedgerRpc, RpcError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::trace;

const REQUEST_ID: &str = "linkdrop-client";

/// Talks to a node's `query` endpoint.
///
/// View calls are sent as `call_function` with base64 encoded JSON args; the
/// node answers with the raw result bytes, which hold the method's JSON return.
#[derive(Clone)]
pub struct JsonRpcClient {
    http: Client,
    node_url: String,
}

impl JsonRpcClient {
    pub fn new(node_url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            node_url: node_url.into(),
        })
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    async fn query(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": REQUEST_ID,
            "method": "query",
            "params": params,
        });
        trace!(node = %self.node_url, %method, "sending query");

        let response = self
            .http
            .post(&self.node_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Transport(format!("node answered HTTP {}", status)));
        }
        let envelope: Value = response
            .json()
            .await
            .map_err(|e| RpcError::decode(method, e))?;
        unwrap_envelope(method, envelope)
    }
}

#[async_trait]
impl LedgerRpc for JsonRpcClient {
    async fn invoke(&self, contract_id: &str, method: &str, args: Value) -> Result<Value, RpcError> {
        let params = call_function_params(contract_id, method, &args)?;
        let result = self.query(method, params).await?;
        decode_call_result(method, &result)
    }

    async fn view_account(&self, account_id: &str) -> Result<Value, RpcError> {
        let params = json!({
            "request_type": "view_account",
            "finality": "final",
            "account_id": account_id,
        });
        self.query("view_account", params).await
    }
}

pub(crate) fn call_function_params(contract_id: &str, method: &str, args: &Value) -> Result<Value, RpcError> {
    let encoded = serde_json::to_vec(args).map_err(|e| RpcError::decode(method, e))?;
    Ok(json!({
        "request_type": "call_function",
        "finality": "optimistic",
        "account_id": contract_id,
        "method_name": method,
        "args_base64": STANDARD.encode(encoded),
    }))
}

/// Splits a JSON-RPC envelope into its result or a ledger error.
///
/// Nodes report contract panics inside `result.error` rather than the
/// top-level `error`, so both are checked.
pub(crate) fn unwrap_envelope(method: &str, envelope: Value) -> Result<Value, RpcError> {
    if let Some(error) = envelope.get("error") {
        let message = error
            .get("data")
            .or_else(|| error.get("message"))
            .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
            .unwrap_or_else(|| error.to_string());
        return Err(RpcError::server(method, message));
    }

    let result = envelope
        .get("result")
        .cloned()
        .ok_or_else(|| RpcError::decode(method, "missing result"))?;

    if let Some(error) = result.get("error") {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(RpcError::server(method, message));
    }

    Ok(result)
}

pub(crate) fn decode_call_result(method: &str, result: &Value) -> Result<Value, RpcError> {
    let bytes = result
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| RpcError::decode(method, "missing result bytes"))?
        .iter()
        .map(|b| {
            b.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| RpcError::decode(method, "result byte out of range"))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    // Methods returning unit come back as an empty byte string.
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| RpcError::decode(method, e))
}
