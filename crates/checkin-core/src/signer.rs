use async_trait::async_trait;
use chain_sol::{bytes_to_address, Keypair};
use zeroize::Zeroizing;

use crate::error::ProtocolError;

/// Whatever holds the owner's key: a local keypair, a hardware wallet, a
/// browser extension behind a bridge.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> [u8; 32];

    /// Sign a serialized transaction message.
    async fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], ProtocolError>;

    fn address(&self) -> String {
        bytes_to_address(&self.pubkey())
    }
}

/// An in-process ed25519 keypair.
#[derive(Debug)]
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, ProtocolError> {
        Keypair::from_bytes(secret)
            .map(Self::new)
            .map_err(|e| ProtocolError::invalid_key("<secret key>", e))
    }

    /// Parse a Solana CLI keypair file: a JSON array of 64 (or 32) bytes.
    pub fn from_json(contents: &str) -> Result<Self, ProtocolError> {
        let secret: Zeroizing<Vec<u8>> = Zeroizing::new(
            serde_json::from_str(contents)
                .map_err(|e| ProtocolError::invalid_key("<keypair file>", e))?,
        );
        Self::from_secret_bytes(&secret)
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn pubkey(&self) -> [u8; 32] {
        self.keypair.pubkey()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], ProtocolError> {
        Ok(self.keypair.sign(message))
    }
}
