//! Solana address encoding and program-derived address (PDA) search.
//!
//! Solana addresses are Base58-encoded 32-byte values. Wallet addresses are
//! Ed25519 public keys; program-derived addresses are SHA-256 outputs that
//! deliberately fall OFF the Ed25519 curve so that no private key exists
//! for them and only the owning program can sign for the account.

use sha2::{Digest, Sha256};

use crate::error::SolError;

/// The string appended to PDA derivation: "ProgramDerivedAddress".
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Seeds are limited to 16 entries of at most 32 bytes each by the runtime.
pub const MAX_SEEDS: usize = 16;
pub const MAX_SEED_LEN: usize = 32;

/// Validate a Solana address string.
///
/// A valid Solana address is a Base58-encoded string that decodes to exactly
/// 32 bytes.
pub fn validate_address(address: &str) -> Result<bool, SolError> {
    address_to_bytes(address).map(|_| true)
}

/// Decode a Solana address string to its 32-byte representation.
///
/// Returns an error if the address is not valid Base58 or does not decode
/// to exactly 32 bytes.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })?;

    Ok(arr)
}

/// Encode 32 bytes as a Solana address (Base58 string).
pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}

/// Find a valid Program Derived Address (PDA) for the given seeds and program.
///
/// Iterates bump seeds from 255 down to 0, computing
/// `SHA-256(seed_0 || seed_1 || ... || bump || program_id || "ProgramDerivedAddress")`
/// and returning the first result that is NOT a valid Ed25519 point,
/// together with the bump that produced it.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &[u8; 32],
) -> Result<([u8; 32], u8), SolError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(SolError::InvalidAddress(format!(
            "too many seeds: {} (max {})",
            seeds.len(),
            MAX_SEEDS - 1
        )));
    }

    for bump in (0u8..=255).rev() {
        if let Ok(address) = create_program_address(seeds, &[bump], program_id) {
            return Ok((address, bump));
        }
    }

    Err(SolError::InvalidAddress(
        "could not find valid PDA bump seed".into(),
    ))
}

/// Create a PDA from seeds + bump + program_id.
///
/// Fails if any seed exceeds 32 bytes or if the hash lands on the Ed25519
/// curve (the caller should try the next bump).
pub fn create_program_address(
    seeds: &[&[u8]],
    bump_seed: &[u8],
    program_id: &[u8; 32],
) -> Result<[u8; 32], SolError> {
    let mut hasher = Sha256::new();

    for seed in seeds.iter().chain(std::iter::once(&bump_seed)) {
        if seed.len() > MAX_SEED_LEN {
            return Err(SolError::InvalidAddress(format!(
                "seed of {} bytes exceeds {MAX_SEED_LEN}",
                seed.len()
            )));
        }
        hasher.update(seed);
    }
    hasher.update(program_id);
    hasher.update(PDA_MARKER);

    let hash: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&hash) {
        return Err(SolError::InvalidAddress(
            "derived address lies on the ed25519 curve".into(),
        ));
    }

    Ok(hash)
}

/// Check if 32 bytes represent a valid Ed25519 curve point.
///
/// Uses `curve25519-dalek` to attempt decompression. If it succeeds, the
/// point is on the curve.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}
