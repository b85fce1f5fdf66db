//! Ed25519 keypairs for transaction signers.
//!
//! Used for the throwaway mint account that co-signs a reward claim and for
//! local wallets loaded from a Solana CLI keypair file.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::address::bytes_to_address;
use crate::error::SolError;

/// An Ed25519 signing keypair. The secret half is zeroized on drop by
/// `ed25519-dalek`.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS random number generator.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a keypair from secret key material.
    ///
    /// Accepts either the 32-byte Ed25519 seed or the 64-byte
    /// `seed || public key` layout written by `solana-keygen`. For the
    /// 64-byte form the embedded public key must match the seed.
    pub fn from_bytes(secret: &[u8]) -> Result<Self, SolError> {
        let mut seed: [u8; 32] = match secret.len() {
            32 | 64 => secret[..32]
                .try_into()
                .map_err(|_| SolError::InvalidPrivateKey("seed slice".into()))?,
            n => {
                return Err(SolError::InvalidPrivateKey(format!(
                    "expected 32 or 64 bytes, got {n}"
                )))
            }
        };
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();

        if secret.len() == 64 && signing_key.verifying_key().as_bytes() != &secret[32..] {
            return Err(SolError::InvalidPrivateKey(
                "embedded public key does not match seed".into(),
            ));
        }

        Ok(Self { signing_key })
    }

    pub fn pubkey(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn address(&self) -> String {
        bytes_to_address(&self.pubkey())
    }

    /// Sign an arbitrary message (a serialized transaction message).
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, VerifyingKey};

    #[test]
    fn generated_keypairs_differ() {
        assert_ne!(Keypair::generate().pubkey(), Keypair::generate().pubkey());
    }

    #[test]
    fn from_32_byte_seed_is_deterministic() {
        let a = Keypair::from_bytes(&[0x42; 32]).unwrap();
        let b = Keypair::from_bytes(&[0x42; 32]).unwrap();
        assert_eq!(a.pubkey(), b.pubkey());
    }

    #[test]
    fn from_64_byte_keygen_layout() {
        let seeded = Keypair::from_bytes(&[0x42; 32]).unwrap();
        let mut secret = vec![0x42u8; 32];
        secret.extend_from_slice(&seeded.pubkey());

        let loaded = Keypair::from_bytes(&secret).unwrap();
        assert_eq!(loaded.pubkey(), seeded.pubkey());
    }

    #[test]
    fn mismatched_embedded_pubkey_fails() {
        let mut secret = vec![0x42u8; 32];
        secret.extend_from_slice(&[0u8; 32]);
        assert!(Keypair::from_bytes(&secret).is_err());
    }

    #[test]
    fn wrong_length_fails() {
        let err = Keypair::from_bytes(&[1u8; 16]).unwrap_err();
        assert!(err.to_string().contains("got 16"));
    }

    #[test]
    fn signature_verifies() {
        let keypair = Keypair::from_bytes(&[0x55; 32]).unwrap();
        let sig = keypair.sign(b"message");
        let vk = VerifyingKey::from_bytes(&keypair.pubkey()).unwrap();
        assert!(vk
            .verify_strict(b"message", &Signature::from_bytes(&sig))
            .is_ok());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let keypair = Keypair::from_bytes(&[0x55; 32]).unwrap();
        let debug = format!("{keypair:?}");
        assert!(debug.contains(&keypair.address()));
        assert!(!debug.contains("signing_key"));
    }
}
