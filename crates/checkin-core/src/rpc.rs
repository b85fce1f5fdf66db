//! JSON-RPC transport to a Solana-compatible ledger node.
//!
//! [`LedgerRpc`] is the seam between the protocol and the network; the
//! gateway is the only caller. Failures come back as raw [`RpcFailure`]s
//! and are classified by the gateway, never here.

use std::time::Duration;

use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use chain_sol::{address_to_bytes, bytes_to_address};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::Commitment;

/// Account contents as returned by the node.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountData {
    /// Raw bytes (`base64` encoding).
    Binary(Vec<u8>),
    /// A decoded object, from nodes or indexers that parse the account.
    Parsed(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: [u8; 32],
    pub executable: bool,
    pub data: AccountData,
}

/// A raw failure from the node or the network.
#[derive(Debug, Clone, Error)]
pub enum RpcFailure {
    /// The request never produced a JSON-RPC response.
    #[error("{0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object. For rejected
    /// transactions `err` carries the structured transaction error and
    /// `logs` the program logs from preflight simulation.
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        err: Option<Value>,
        logs: Vec<String>,
    },

    /// The response was JSON but not the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The transaction passed preflight, landed, and then failed on chain.
    /// `err` has the same shape as a preflight `err`.
    #[error("transaction {signature} failed: {err}")]
    TransactionFailed { signature: String, err: Value },
}

/// Where a submitted transaction stands, from `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureStatus {
    pub confirmation: Commitment,
    /// The on-chain transaction error, if execution failed.
    pub err: Option<Value>,
}

impl SignatureStatus {
    pub fn satisfies(&self, commitment: Commitment) -> bool {
        self.confirmation >= commitment
    }
}

#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Where requests go; used in error messages.
    fn endpoint(&self) -> &str;

    /// `None` when no account exists at `address`.
    async fn get_account_info(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, RpcFailure>;

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], RpcFailure>;

    async fn get_minimum_balance_for_rent_exemption(&self, space: u64) -> Result<u64, RpcFailure>;

    /// Submit a signed wire transaction; returns its signature (Base58).
    /// Success only means the node accepted it after preflight.
    async fn send_transaction(&self, wire: &[u8]) -> Result<String, RpcFailure>;

    /// `None` while the node has not seen the transaction land.
    async fn get_signature_status(&self, signature: &str) -> Result<Option<SignatureStatus>, RpcFailure>;

    /// Whether a transaction built on `blockhash` can still land.
    async fn is_blockhash_valid(&self, blockhash: &[u8; 32]) -> Result<bool, RpcFailure>;
}

// ─── HTTP client ────────────────────────────────────────────────────

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`LedgerRpc`] over HTTP JSON-RPC 2.0.
#[derive(Debug, Clone)]
pub struct HttpRpcClient {
    http: reqwest::Client,
    url: String,
    commitment: Commitment,
}

impl HttpRpcClient {
    pub fn new(url: impl Into<String>, commitment: Commitment) -> Result<Self, RpcFailure> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RpcFailure::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
            commitment,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, RpcFailure> {
        debug!(endpoint = %self.url, method, "rpc request");

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(e.to_string()))?;

        let status = response.status();
        let body: JsonRpcResponse<T> = response.json().await.map_err(|e| {
            if status.is_success() {
                RpcFailure::Malformed(e.to_string())
            } else {
                RpcFailure::Transport(format!("HTTP {status}"))
            }
        })?;

        if let Some(error) = body.error {
            return Err(error.into_failure());
        }
        body.result
            .ok_or_else(|| RpcFailure::Malformed(format!("{method}: missing result")))
    }
}

#[async_trait]
impl LedgerRpc for HttpRpcClient {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn get_account_info(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, RpcFailure> {
        let result: WithContext<Option<RawAccount>> = self
            .call(
                "getAccountInfo",
                json!([
                    bytes_to_address(address),
                    { "encoding": "base64", "commitment": self.commitment }
                ]),
            )
            .await?;
        result.value.map(RawAccount::into_account_info).transpose()
    }

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], RpcFailure> {
        let result: WithContext<RawBlockhash> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment }]),
            )
            .await?;
        address_to_bytes(&result.value.blockhash)
            .map_err(|e| RpcFailure::Malformed(format!("blockhash: {e}")))
    }

    async fn get_minimum_balance_for_rent_exemption(&self, space: u64) -> Result<u64, RpcFailure> {
        self.call("getMinimumBalanceForRentExemption", json!([space]))
            .await
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<String, RpcFailure> {
        self.call(
            "sendTransaction",
            json!([
                BASE64_STANDARD.encode(wire),
                { "encoding": "base64", "preflightCommitment": self.commitment }
            ]),
        )
        .await
    }

    async fn get_signature_status(&self, signature: &str) -> Result<Option<SignatureStatus>, RpcFailure> {
        let result: WithContext<Vec<Option<RawSignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([[signature], { "searchTransactionHistory": false }]),
            )
            .await?;
        Ok(result
            .value
            .into_iter()
            .next()
            .flatten()
            .map(RawSignatureStatus::into_status))
    }

    async fn is_blockhash_valid(&self, blockhash: &[u8; 32]) -> Result<bool, RpcFailure> {
        let result: WithContext<bool> = self
            .call(
                "isBlockhashValid",
                json!([bytes_to_address(blockhash), { "commitment": self.commitment }]),
            )
            .await?;
        Ok(result.value)
    }
}

// ─── Wire shapes ────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl JsonRpcError {
    /// Preflight failures put the transaction error and logs under `data`.
    fn into_failure(self) -> RpcFailure {
        let err = self
            .data
            .as_ref()
            .and_then(|d| d.get("err"))
            .filter(|e| !e.is_null())
            .cloned();
        let logs = self
            .data
            .as_ref()
            .and_then(|d| d.get("logs"))
            .and_then(Value::as_array)
            .map(|lines| {
                lines
                    .iter()
                    .filter_map(|l| l.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default();
        RpcFailure::Rpc {
            code: self.code,
            message: self.message,
            err,
            logs,
        }
    }
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct RawBlockhash {
    blockhash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSignatureStatus {
    confirmation_status: Option<Commitment>,
    /// `null` once the slot is rooted.
    confirmations: Option<u64>,
    err: Option<Value>,
}

impl RawSignatureStatus {
    fn into_status(self) -> SignatureStatus {
        // Nodes that predate `confirmationStatus` report only the count.
        let confirmation = self.confirmation_status.unwrap_or(match self.confirmations {
            None => Commitment::Finalized,
            Some(_) => Commitment::Processed,
        });
        SignatureStatus {
            confirmation,
            err: self.err.filter(|e| !e.is_null()),
        }
    }
}

#[derive(Deserialize)]
struct RawAccount {
    lamports: u64,
    owner: String,
    executable: bool,
    data: RawAccountData,
}

/// `["<base64>", "base64"]` or `{ "parsed": ..., "program": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAccountData {
    Encoded(String, String),
    Parsed { parsed: Value },
}

impl RawAccount {
    fn into_account_info(self) -> Result<AccountInfo, RpcFailure> {
        let owner = address_to_bytes(&self.owner)
            .map_err(|e| RpcFailure::Malformed(format!("account owner: {e}")))?;
        let data = match self.data {
            RawAccountData::Encoded(payload, encoding) if encoding == "base64" => {
                AccountData::Binary(
                    BASE64_STANDARD
                        .decode(payload)
                        .map_err(|e| RpcFailure::Malformed(format!("account data: {e}")))?,
                )
            }
            RawAccountData::Encoded(_, encoding) => {
                return Err(RpcFailure::Malformed(format!(
                    "unexpected account encoding {encoding:?}"
                )))
            }
            // jsonParsed nests the fields under `info` for most programs.
            RawAccountData::Parsed { parsed } => match parsed.get("info") {
                Some(info) => AccountData::Parsed(info.clone()),
                None => AccountData::Parsed(parsed),
            },
        };
        Ok(AccountInfo {
            lamports: self.lamports,
            owner,
            executable: self.executable,
            data,
        })
    }
}
