//! Deterministic account addresses for an owner.
//!
//! These must match the ledger program's own seeds exactly. A mismatch does
//! not fail loudly: the client would simply read or create the wrong account.

use chain_sol::{address_to_bytes, derive_associated_token_address, find_program_address};

use crate::error::ProtocolError;

pub const USER_CHECKIN_SEED: &[u8] = b"user_checkin";
pub const USER_BADGES_SEED: &[u8] = b"user_badges";

/// Which sub-account of an owner to derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// The owner's `UserCheckin` record.
    CheckIn,
    /// The owner's `UserBadges` record.
    Badges,
    /// The owner's token account for `mint`.
    AssociatedToken { mint: [u8; 32] },
}

/// Derives program-owned addresses under one program id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: [u8; 32],
}

impl AddressDeriver {
    pub fn new(program_id: [u8; 32]) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> &[u8; 32] {
        &self.program_id
    }

    pub fn derive(&self, domain: Domain, owner: &[u8; 32]) -> Result<[u8; 32], ProtocolError> {
        let derived = match domain {
            Domain::CheckIn => {
                find_program_address(&[USER_CHECKIN_SEED, &owner[..]], &self.program_id)
                    .map(|(address, _)| address)
            }
            Domain::Badges => find_program_address(&[USER_BADGES_SEED, &owner[..]], &self.program_id)
                .map(|(address, _)| address),
            Domain::AssociatedToken { mint } => derive_associated_token_address(owner, &mint),
        };
        derived.map_err(|e| ProtocolError::invalid_key(chain_sol::bytes_to_address(owner), e))
    }

    /// Same as [`derive`](Self::derive) for a Base58 owner address.
    pub fn derive_for(&self, domain: Domain, owner: &str) -> Result<[u8; 32], ProtocolError> {
        self.derive(domain, &parse_key(owner)?)
    }
}

/// Decode a Base58 public key, classifying failures as `InvalidKey`.
pub fn parse_key(input: &str) -> Result<[u8; 32], ProtocolError> {
    address_to_bytes(input).map_err(|e| ProtocolError::invalid_key(input, e))
}
