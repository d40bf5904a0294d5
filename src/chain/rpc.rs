use crate::error::AppError;
use alloy_primitives::{Address, Bytes, B256, U256};
use backoff::future::retry_notify;
use backoff::Error as BackoffError;
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

/// How often the receipt poll re-queries the node.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Give up waiting for a receipt after this long.
const RECEIPT_POLL_TIMEOUT: Duration = Duration::from_secs(120);

/// Thin JSON-RPC 2.0 client over HTTP. The endpoint is expected to be
/// wallet-enabled: `eth_sendTransaction` leaves signing, nonce and gas
/// management to the node, mirroring how the embedded wallet provider owns
/// those concerns.
pub struct RpcClient {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Unsigned transaction request, signed by the wallet-enabled endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub logs: Vec<RpcLog>,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        matches!(self.status.as_deref(), Some("0x1"))
    }
}

impl RpcClient {
    pub fn new(url: Url) -> Self {
        RpcClient {
            http: reqwest::Client::new(),
            url,
            next_id: AtomicU64::new(1),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "sending JSON-RPC request");
        let response = self.http.post(self.url.clone()).json(&body).send().await?;
        let envelope: RpcEnvelope = response.json().await?;

        if let Some(err) = envelope.error {
            tracing::warn!(method, code = err.code, "JSON-RPC error: {}", err.message);
            // Surface the node's message verbatim; it is what the user sees.
            return Err(AppError::RpcError(err.message));
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }

    /// Read-only contract call at the latest block.
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, AppError> {
        let result = self
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Submit a transaction for the node's wallet to sign and broadcast.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, AppError> {
        let result = self
            .request("eth_sendTransaction", json!([tx]))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, AppError> {
        let result = self
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(result)?))
    }

    pub async fn chain_id(&self) -> Result<u64, AppError> {
        let result = self.request("eth_chainId", json!([])).await?;
        let raw: String = serde_json::from_value(result)?;
        parse_hex_quantity(&raw)
    }

    /// Poll until the transaction is mined, then check its status. A mined
    /// transaction with status 0x0 is reported as a failure.
    #[tracing::instrument(skip(self), fields(tx = %hash))]
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, AppError> {
        let poll = ExponentialBackoff {
            initial_interval: RECEIPT_POLL_INTERVAL,
            randomization_factor: 0.0,
            multiplier: 1.0,
            max_interval: RECEIPT_POLL_INTERVAL,
            max_elapsed_time: Some(RECEIPT_POLL_TIMEOUT),
            ..ExponentialBackoff::default()
        };

        let receipt = retry_notify(
            poll,
            || async {
                match self.transaction_receipt(hash).await {
                    Ok(Some(receipt)) => Ok(receipt),
                    Ok(None) => Err(BackoffError::transient(anyhow::anyhow!(
                        "transaction not yet mined"
                    ))),
                    // A transport hiccup must not abort the wait; the node's
                    // own error responses do.
                    Err(err @ AppError::HttpError(_)) => {
                        Err(BackoffError::transient(anyhow::anyhow!(err.to_string())))
                    }
                    Err(e) => Err(BackoffError::permanent(anyhow::anyhow!(e.to_string()))),
                }
            },
            |err, duration: Duration| {
                tracing::debug!(
                    "still waiting for receipt ({}); next poll in {:.1}s",
                    err,
                    duration.as_secs_f32()
                );
            },
        )
        .await
        .map_err(|e| AppError::RpcError(e.to_string()))?;

        if !receipt.is_success() {
            return Err(AppError::TxFailed(format!(
                "transaction {} reverted",
                receipt.transaction_hash
            )));
        }

        Ok(receipt)
    }
}

pub fn parse_hex_quantity(raw: &str) -> Result<u64, AppError> {
    let trimmed = raw.trim_start_matches("0x");
    u64::from_str_radix(trimmed, 16)
        .map_err(|e| AppError::RpcError(format!("invalid hex quantity {}: {}", raw, e)))
}
