use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::derive::parse_key;
use crate::error::ProtocolError;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
pub const DEFAULT_PROGRAM_ID: &str = "B5Zjd3jeSG45nRbbBJqAttHm7aVBFERuGXJv9Pm4WXpd";

pub const ENV_RPC_URL: &str = "CHECKIN_RPC_URL";
pub const ENV_PROGRAM_ID: &str = "CHECKIN_PROGRAM_ID";
pub const ENV_COMMITMENT: &str = "CHECKIN_COMMITMENT";

/// How settled the state a node reports must be. Ordered from least to
/// most settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(ProtocolError::Config(format!(
                "unknown commitment {other:?} (expected processed, confirmed or finalized)"
            ))),
        }
    }
}

/// Where the ledger lives and which program to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub rpc_url: String,
    pub program_id: String,
    pub commitment: Commitment,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            program_id: DEFAULT_PROGRAM_ID.to_string(),
            commitment: Commitment::default(),
        }
    }
}

impl ProtocolConfig {
    pub fn from_json(contents: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(contents).map_err(|e| ProtocolError::Config(e.to_string()))
    }

    /// Defaults overridden by `CHECKIN_*` environment variables.
    pub fn from_env() -> Result<Self, ProtocolError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ProtocolError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_RPC_URL) {
            config.rpc_url = url;
        }
        if let Some(program_id) = lookup(ENV_PROGRAM_ID) {
            config.program_id = program_id;
        }
        if let Some(commitment) = lookup(ENV_COMMITMENT) {
            config.commitment = commitment.parse()?;
        }
        Ok(config)
    }

    /// Checks the URL scheme and decodes the program id. Whether the
    /// program is actually deployed is only known at first use.
    pub fn validate(&self) -> Result<[u8; 32], ProtocolError> {
        let url = self.rpc_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ProtocolError::Config(format!(
                "rpc url {url:?} must start with http:// or https://"
            )));
        }
        parse_key(&self.program_id)
    }
}
