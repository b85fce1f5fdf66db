//! Reads ledger state and submits transactions, classifying every raw
//! transport failure into a [`ProtocolError`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chain_sol::bytes_to_address;
use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::composer::Operation;
use crate::config::Commitment;
use crate::error::{DeploymentIssue, ProtocolError};
use crate::program::ProgramErrorCode;
use crate::records::{BadgeRecord, CheckInRecord, RecordError};
use crate::rpc::{AccountData, AccountInfo, LedgerRpc, RpcFailure, SignatureStatus};

/// How a sent transaction is followed until it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub commitment: Commitment,
    pub poll_interval: Duration,
    /// Upper bound on waiting for a transaction that landed but has not
    /// reached `commitment`. An unlanded one ends earlier, when its
    /// blockhash expires.
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            commitment: Commitment::Confirmed,
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(90),
        }
    }
}

impl ConfirmationPolicy {
    pub fn new(commitment: Commitment) -> Self {
        Self {
            commitment,
            ..Self::default()
        }
    }
}

/// Outcome of an account lookup. A missing account is a valid state (the
/// owner never initialized it), not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    NotFound,
}

impl<T> Fetched<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Fetched::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Found(value) => Some(value),
            Fetched::NotFound => None,
        }
    }
}

pub struct LedgerGateway {
    rpc: Arc<dyn LedgerRpc>,
    program_id: [u8; 32],
    /// Set once the program account has been seen executable. Cleared on
    /// any transport failure so the next call checks again.
    program_verified: AtomicBool,
    confirmation: ConfirmationPolicy,
}

impl LedgerGateway {
    pub fn new(rpc: Arc<dyn LedgerRpc>, program_id: [u8; 32]) -> Self {
        Self {
            rpc,
            program_id,
            program_verified: AtomicBool::new(false),
            confirmation: ConfirmationPolicy::default(),
        }
    }

    pub fn with_confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn confirmation(&self) -> &ConfirmationPolicy {
        &self.confirmation
    }

    pub fn endpoint(&self) -> &str {
        self.rpc.endpoint()
    }

    pub fn program_id(&self) -> &[u8; 32] {
        &self.program_id
    }

    pub fn is_program_verified(&self) -> bool {
        self.program_verified.load(Ordering::Acquire)
    }

    pub async fn fetch_account(&self, address: &[u8; 32]) -> Result<Fetched<AccountInfo>, ProtocolError> {
        match self.rpc.get_account_info(address).await {
            Ok(Some(info)) => Ok(Fetched::Found(info)),
            Ok(None) => {
                debug!(address = %bytes_to_address(address), "account not found");
                Ok(Fetched::NotFound)
            }
            Err(failure) => Err(self.classify(failure, None)),
        }
    }

    /// Fails with `ProgramNotDeployed` if the configured program is missing
    /// or not executable. Only the first success is remembered.
    pub async fn assert_program_deployed(&self) -> Result<(), ProtocolError> {
        if self.is_program_verified() {
            return Ok(());
        }

        let issue = match self.fetch_account(&self.program_id).await? {
            Fetched::Found(info) if info.executable => None,
            Fetched::Found(_) => Some(DeploymentIssue::NotExecutable),
            Fetched::NotFound => Some(DeploymentIssue::Missing),
        };

        match issue {
            None => {
                self.program_verified.store(true, Ordering::Release);
                info!(
                    endpoint = self.endpoint(),
                    program = %bytes_to_address(&self.program_id),
                    "program deployment verified"
                );
                Ok(())
            }
            Some(issue) => Err(self.not_deployed(issue)),
        }
    }

    pub async fn fetch_check_in(&self, address: &[u8; 32]) -> Result<Fetched<CheckInRecord>, ProtocolError> {
        self.fetch_record(address, CheckInRecord::decode).await
    }

    pub async fn fetch_badges(&self, address: &[u8; 32]) -> Result<Fetched<BadgeRecord>, ProtocolError> {
        self.fetch_record(address, BadgeRecord::decode).await
    }

    async fn fetch_record<T>(
        &self,
        address: &[u8; 32],
        decode: impl FnOnce(&AccountData) -> Result<T, RecordError>,
    ) -> Result<Fetched<T>, ProtocolError> {
        let info = match self.fetch_account(address).await? {
            Fetched::Found(info) => info,
            Fetched::NotFound => return Ok(Fetched::NotFound),
        };

        let decode_error = |reason: String| ProtocolError::AccountDecode {
            address: bytes_to_address(address),
            reason,
        };
        if info.owner != self.program_id {
            return Err(decode_error(format!(
                "owned by {}, not the check-in program",
                bytes_to_address(&info.owner)
            )));
        }
        decode(&info.data)
            .map(Fetched::Found)
            .map_err(|e| decode_error(e.to_string()))
    }

    pub async fn latest_blockhash(&self) -> Result<[u8; 32], ProtocolError> {
        self.rpc
            .get_latest_blockhash()
            .await
            .map_err(|failure| self.classify(failure, None))
    }

    pub async fn rent_exempt_minimum(&self, space: u64) -> Result<u64, ProtocolError> {
        self.rpc
            .get_minimum_balance_for_rent_exemption(space)
            .await
            .map_err(|failure| self.classify(failure, None))
    }

    /// Send a signed transaction and wait until it lands at the
    /// configured commitment. Returns the transaction signature.
    pub async fn submit(
        &self,
        wire: &[u8],
        recent_blockhash: &[u8; 32],
        operation: &Operation,
    ) -> Result<String, ProtocolError> {
        let signature = self.send(wire, operation).await?;
        self.confirm(&signature, recent_blockhash, operation).await?;
        Ok(signature)
    }

    /// Preflight and broadcast only. The transaction may still never land.
    pub async fn send(&self, wire: &[u8], operation: &Operation) -> Result<String, ProtocolError> {
        match self.rpc.send_transaction(wire).await {
            Ok(signature) => {
                debug!(operation = operation.name(), %signature, "transaction sent");
                Ok(signature)
            }
            Err(failure) => Err(self.classify(failure, Some(operation))),
        }
    }

    /// Wait for `signature` to land. An on-chain failure is classified like a
    /// preflight rejection; a blockhash that expires first is
    /// `FreshnessExpired`, since the transaction can no longer land.
    pub async fn confirm(
        &self,
        signature: &str,
        recent_blockhash: &[u8; 32],
        operation: &Operation,
    ) -> Result<(), ProtocolError> {
        let started = Instant::now();
        loop {
            match self.signature_status(signature).await? {
                Some(SignatureStatus { err: Some(err), .. }) => {
                    let failure = RpcFailure::TransactionFailed {
                        signature: signature.to_string(),
                        err,
                    };
                    return Err(self.classify(failure, Some(operation)));
                }
                Some(status) if status.satisfies(self.confirmation.commitment) => {
                    info!(
                        operation = operation.name(),
                        %signature,
                        commitment = %self.confirmation.commitment,
                        "transaction confirmed"
                    );
                    return Ok(());
                }
                Some(_) => {}
                None => {
                    let valid = self
                        .rpc
                        .is_blockhash_valid(recent_blockhash)
                        .await
                        .map_err(|failure| self.classify(failure, None))?;
                    if !valid {
                        // It may have landed between the two requests.
                        if self.signature_status(signature).await?.is_some() {
                            continue;
                        }
                        warn!(%signature, "blockhash expired before the transaction landed");
                        return Err(ProtocolError::FreshnessExpired {
                            endpoint: self.endpoint().to_string(),
                        });
                    }
                }
            }

            if started.elapsed() >= self.confirmation.timeout {
                let failure = RpcFailure::Transport(format!(
                    "transaction {signature} not {} after {:?}",
                    self.confirmation.commitment, self.confirmation.timeout
                ));
                return Err(self.classify(failure, None));
            }
            sleep(self.confirmation.poll_interval).await;
        }
    }

    async fn signature_status(&self, signature: &str) -> Result<Option<SignatureStatus>, ProtocolError> {
        self.rpc
            .get_signature_status(signature)
            .await
            .map_err(|failure| self.classify(failure, None))
    }

    fn not_deployed(&self, issue: DeploymentIssue) -> ProtocolError {
        self.program_verified.store(false, Ordering::Release);
        ProtocolError::ProgramNotDeployed {
            endpoint: self.endpoint().to_string(),
            program_id: bytes_to_address(&self.program_id),
            issue,
        }
    }

    fn classify(&self, failure: RpcFailure, operation: Option<&Operation>) -> ProtocolError {
        let endpoint = self.endpoint().to_string();
        let classified = match classify_failure(&failure) {
            Classified::FreshnessExpired => ProtocolError::FreshnessExpired { endpoint },
            Classified::Program(code) => match operation {
                Some(op) => op.rejection(code),
                None => ProtocolError::Transport {
                    endpoint,
                    message: failure.to_string(),
                },
            },
            Classified::ProgramMissing(issue) => self.not_deployed(issue),
            Classified::Other => ProtocolError::Transport {
                endpoint,
                message: failure.to_string(),
            },
        };

        if matches!(classified, ProtocolError::Transport { .. }) {
            self.program_verified.store(false, Ordering::Release);
        }
        warn!(error = %classified, "ledger request failed");
        classified
    }
}

// ─── Failure classification ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classified {
    FreshnessExpired,
    Program(ProgramErrorCode),
    ProgramMissing(DeploymentIssue),
    Other,
}

/// The structured `err` value decides first; message text and program
/// logs are only consulted when it is absent or unrecognized.
fn classify_failure(failure: &RpcFailure) -> Classified {
    let (message, err, logs) = match failure {
        RpcFailure::Rpc {
            message, err, logs, ..
        } => (message, err, logs),
        RpcFailure::TransactionFailed { err, .. } => {
            return classify_err_value(err).unwrap_or(Classified::Other);
        }
        RpcFailure::Transport(_) | RpcFailure::Malformed(_) => return Classified::Other,
    };

    if let Some(found) = err.as_ref().and_then(classify_err_value) {
        return found;
    }
    classify_text(message, logs)
}

fn classify_err_value(err: &Value) -> Option<Classified> {
    match err {
        Value::String(kind) => match kind.as_str() {
            "BlockhashNotFound" => Some(Classified::FreshnessExpired),
            "ProgramAccountNotFound" => Some(Classified::ProgramMissing(DeploymentIssue::Missing)),
            "InvalidProgramForExecution" => {
                Some(Classified::ProgramMissing(DeploymentIssue::NotExecutable))
            }
            _ => None,
        },
        Value::Object(map) => {
            // {"InstructionError": [index, {"Custom": code}]}
            let custom = map
                .get("InstructionError")?
                .get(1)?
                .get("Custom")?
                .as_u64()?;
            let code = u32::try_from(custom).ok()?;
            ProgramErrorCode::from_code(code).map(Classified::Program)
        }
        _ => None,
    }
}

fn classify_text(message: &str, logs: &[String]) -> Classified {
    if message.contains("Blockhash not found") {
        return Classified::FreshnessExpired;
    }
    if message.contains("Attempt to load a program that does not exist") {
        return Classified::ProgramMissing(DeploymentIssue::Missing);
    }
    if let Some(code) = custom_code_in(message) {
        return Classified::Program(code);
    }
    for line in logs {
        if let Some(code) = custom_code_in(line).or_else(|| anchor_error_in(line)) {
            return Classified::Program(code);
        }
    }
    Classified::Other
}

/// `... custom program error: 0x1770`
fn custom_code_in(text: &str) -> Option<ProgramErrorCode> {
    let (_, rest) = text.split_once("custom program error: 0x")?;
    let hex: String = rest.chars().take_while(char::is_ascii_hexdigit).collect();
    ProgramErrorCode::from_code(u32::from_str_radix(&hex, 16).ok()?)
}

/// Anchor's log line: `... Error Code: AlreadyCheckedInToday. Error Number: 6000. ...`
fn anchor_error_in(line: &str) -> Option<ProgramErrorCode> {
    let (_, rest) = line.split_once("Error Number: ")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    ProgramErrorCode::from_code(digits.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rpc_failure(message: &str, err: Option<Value>, logs: &[&str]) -> RpcFailure {
        RpcFailure::Rpc {
            code: -32002,
            message: message.into(),
            err,
            logs: logs.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn blockhash_not_found_is_freshness() {
        let failure = rpc_failure("whatever", Some(json!("BlockhashNotFound")), &[]);
        assert_eq!(classify_failure(&failure), Classified::FreshnessExpired);

        let failure = rpc_failure(
            "Transaction simulation failed: Blockhash not found",
            None,
            &[],
        );
        assert_eq!(classify_failure(&failure), Classified::FreshnessExpired);
    }

    #[test]
    fn structured_custom_error_wins_over_text() {
        let failure = rpc_failure(
            "Blockhash not found",
            Some(json!({ "InstructionError": [1, { "Custom": 6000 }] })),
            &[],
        );
        assert_eq!(
            classify_failure(&failure),
            Classified::Program(ProgramErrorCode::AlreadyCheckedInToday)
        );
    }

    #[test]
    fn hex_code_in_message() {
        let failure = rpc_failure(
            "Transaction simulation failed: Error processing Instruction 5: custom program error: 0x1773",
            None,
            &[],
        );
        assert_eq!(
            classify_failure(&failure),
            Classified::Program(ProgramErrorCode::BadgeAlreadyClaimed)
        );
    }

    #[test]
    fn anchor_log_line() {
        let failure = rpc_failure(
            "simulation failed",
            None,
            &["Program log: AnchorError thrown in programs/program/src/lib.rs:62. Error Code: NotEnoughCheckins. Error Number: 6002. Error Message: x."],
        );
        assert_eq!(
            classify_failure(&failure),
            Classified::Program(ProgramErrorCode::NotEnoughCheckins)
        );
    }

    #[test]
    fn foreign_custom_code_is_not_a_business_rejection() {
        // System program "account already in use".
        let failure = rpc_failure(
            "custom program error: 0x0",
            Some(json!({ "InstructionError": [0, { "Custom": 0 }] })),
            &[],
        );
        assert_eq!(classify_failure(&failure), Classified::Other);
    }

    #[test]
    fn missing_program() {
        let failure = rpc_failure("x", Some(json!("ProgramAccountNotFound")), &[]);
        assert_eq!(
            classify_failure(&failure),
            Classified::ProgramMissing(DeploymentIssue::Missing)
        );

        let failure = rpc_failure(
            "Transaction simulation failed: Attempt to load a program that does not exist",
            None,
            &[],
        );
        assert_eq!(
            classify_failure(&failure),
            Classified::ProgramMissing(DeploymentIssue::Missing)
        );
    }

    #[test]
    fn network_errors_are_other() {
        assert_eq!(
            classify_failure(&RpcFailure::Transport("connection refused".into())),
            Classified::Other
        );
        assert_eq!(
            classify_failure(&RpcFailure::Malformed("bad json".into())),
            Classified::Other
        );
    }

    #[test]
    fn on_chain_failure_uses_the_structured_err() {
        let failure = RpcFailure::TransactionFailed {
            signature: "5sig".into(),
            err: json!({ "InstructionError": [5, { "Custom": 6003 }] }),
        };
        assert_eq!(
            classify_failure(&failure),
            Classified::Program(ProgramErrorCode::BadgeAlreadyClaimed)
        );

        let failure = RpcFailure::TransactionFailed {
            signature: "5sig".into(),
            err: json!({ "InstructionError": [0, "InvalidAccountData"] }),
        };
        assert_eq!(classify_failure(&failure), Classified::Other);
    }

    #[test]
    fn default_confirmation_waits_for_confirmed() {
        let policy = ConfirmationPolicy::default();
        assert_eq!(policy.commitment, Commitment::Confirmed);
        assert_eq!(ConfirmationPolicy::new(Commitment::Finalized).timeout, policy.timeout);
    }

    #[test]
    fn fetched_helpers() {
        assert!(Fetched::Found(1).is_found());
        assert_eq!(Fetched::<u8>::NotFound.into_option(), None);
    }
}
