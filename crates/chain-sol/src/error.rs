use thiserror::Error;

/// Solana wire-level errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("missing signature for signer {0}")]
    MissingSignature(String),

    #[error("signature does not verify for signer {0}")]
    InvalidSignature(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::address_to_bytes;
    use crate::keypair::Keypair;

    #[test]
    fn bad_base58_is_an_invalid_address() {
        let err = address_to_bytes("0OIl").unwrap_err();
        assert!(matches!(err, SolError::InvalidAddress(_)));
        assert!(err.to_string().starts_with("invalid address: "));
    }

    #[test]
    fn wrong_length_secret_is_an_invalid_private_key() {
        let err = Keypair::from_bytes(&[1u8; 31]).unwrap_err();
        assert!(matches!(err, SolError::InvalidPrivateKey(_)));
    }

    #[test]
    fn missing_signature_names_the_signer() {
        let err = SolError::MissingSignature("11111111111111111111111111111111".into());
        assert_eq!(
            err.to_string(),
            "missing signature for signer 11111111111111111111111111111111"
        );
    }
}
