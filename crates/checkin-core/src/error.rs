use chain_sol::SolError;
use thiserror::Error;

/// Why the configured program failed the deployment check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentIssue {
    /// No account exists at the program address.
    Missing,
    /// An account exists but is not marked executable.
    NotExecutable,
}

impl std::fmt::Display for DeploymentIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentIssue::Missing => f.write_str("no account at this address"),
            DeploymentIssue::NotExecutable => {
                f.write_str("account exists but is not executable")
            }
        }
    }
}

/// Every failure a caller of the check-in protocol can observe.
///
/// Transport-level failures are classified into exactly one of these
/// variants before they leave the crate.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid key {input:?}: {reason}")]
    InvalidKey { input: String, reason: String },

    #[error(
        "program {program_id} is not deployed at {endpoint} ({issue}); \
         redeploy it or point the client at the right cluster"
    )]
    ProgramNotDeployed {
        endpoint: String,
        program_id: String,
        issue: DeploymentIssue,
    },

    #[error("recent blockhash expired before the transaction landed at {endpoint}")]
    FreshnessExpired { endpoint: String },

    #[error("already checked in today")]
    AlreadyCheckedInToday,

    #[error("badge level {level} already claimed")]
    BadgeAlreadyClaimed { level: u8 },

    #[error("badge level {level} needs {threshold} check-ins, have {total}")]
    InsufficientCheckIns { level: u8, threshold: u32, total: u32 },

    #[error("unknown badge level {0}")]
    InvalidBadgeLevel(u8),

    #[error("another check-in or claim for {owner} is still in flight")]
    OperationInFlight { owner: String },

    #[error("account {address} could not be decoded: {reason}")]
    AccountDecode { address: String, reason: String },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("transaction build failed: {0}")]
    TransactionBuild(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transport error talking to {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
}

impl ProtocolError {
    /// Failures worth rebuilding and resending once.
    pub fn is_freshness_expired(&self) -> bool {
        matches!(self, ProtocolError::FreshnessExpired { .. })
    }

    /// Rejections produced by the ledger program's own rules.
    pub fn is_business_rejection(&self) -> bool {
        matches!(
            self,
            ProtocolError::AlreadyCheckedInToday
                | ProtocolError::BadgeAlreadyClaimed { .. }
                | ProtocolError::InsufficientCheckIns { .. }
                | ProtocolError::InvalidBadgeLevel(_)
        )
    }

    pub(crate) fn invalid_key(input: impl Into<String>, reason: impl ToString) -> Self {
        ProtocolError::InvalidKey {
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<SolError> for ProtocolError {
    fn from(e: SolError) -> Self {
        match e {
            // User-supplied keys go through `parse_key`, which keeps the input.
            // An address failing here was produced while composing.
            SolError::InvalidPrivateKey(reason) => ProtocolError::invalid_key("<secret key>", reason),
            SolError::MissingSignature(_) | SolError::InvalidSignature(_) => {
                ProtocolError::Signing(e.to_string())
            }
            other => ProtocolError::TransactionBuild(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_not_deployed_names_endpoint_and_address() {
        let err = ProtocolError::ProgramNotDeployed {
            endpoint: "http://127.0.0.1:8899".into(),
            program_id: "B5Zjd3jeSG45nRbbBJqAttHm7aVBFERuGXJv9Pm4WXpd".into(),
            issue: DeploymentIssue::NotExecutable,
        };
        let msg = err.to_string();
        assert!(msg.contains("http://127.0.0.1:8899"));
        assert!(msg.contains("B5Zjd3jeSG45nRbbBJqAttHm7aVBFERuGXJv9Pm4WXpd"));
        assert!(msg.contains("not executable"));
    }

    #[test]
    fn display_business_rejections() {
        assert_eq!(
            ProtocolError::AlreadyCheckedInToday.to_string(),
            "already checked in today"
        );
        assert_eq!(
            ProtocolError::BadgeAlreadyClaimed { level: 2 }.to_string(),
            "badge level 2 already claimed"
        );
        assert_eq!(
            ProtocolError::InsufficientCheckIns {
                level: 3,
                threshold: 30,
                total: 4
            }
            .to_string(),
            "badge level 3 needs 30 check-ins, have 4"
        );
    }

    #[test]
    fn classification_helpers() {
        let fresh = ProtocolError::FreshnessExpired {
            endpoint: "e".into(),
        };
        assert!(fresh.is_freshness_expired());
        assert!(!fresh.is_business_rejection());
        assert!(ProtocolError::AlreadyCheckedInToday.is_business_rejection());
        assert!(!ProtocolError::AlreadyCheckedInToday.is_freshness_expired());
    }

    #[test]
    fn sol_address_error_maps_to_build_with_its_reason() {
        let err: ProtocolError = SolError::InvalidAddress("expected 32 bytes, got 31".into()).into();
        assert!(
            matches!(&err, ProtocolError::TransactionBuild(m) if m.contains("expected 32 bytes")),
            "{err:?}"
        );
        assert!(!err.to_string().contains("\"\""));
    }

    #[test]
    fn sol_private_key_error_names_the_input() {
        let err: ProtocolError = SolError::InvalidPrivateKey("expected 32 or 64 bytes".into()).into();
        assert_eq!(
            err.to_string(),
            "invalid key \"<secret key>\": expected 32 or 64 bytes"
        );
    }

    #[test]
    fn sol_missing_signature_maps_to_signing() {
        let err: ProtocolError = SolError::MissingSignature("abc".into()).into();
        assert!(matches!(err, ProtocolError::Signing(_)));
    }

    #[test]
    fn sol_serialization_error_maps_to_build() {
        let err: ProtocolError = SolError::SerializationError("overflow".into()).into();
        assert!(matches!(err, ProtocolError::TransactionBuild(m) if m.contains("overflow")));
    }
}
