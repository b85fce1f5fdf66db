//! Solana wire primitives for the check-in client.
//!
//! This crate handles Solana addresses, program-derived address search,
//! manual transaction wire format serialization and the SPL Token
//! instructions needed to mint a reward token, all without pulling in
//! `solana-sdk` (which drags in tokio and 200+ transitive dependencies).
//!
//! Instead we implement Solana's compact binary wire format by hand, using
//! `ed25519-dalek` for Ed25519 signing and `bs58` for Base58 encoding.

pub mod address;
pub mod error;
pub mod keypair;
pub mod spl_token;
pub mod transaction;

// Re-export key public types for ergonomic imports.
pub use address::{
    address_to_bytes, bytes_to_address, create_program_address, find_program_address,
    is_on_curve, validate_address,
};
pub use error::SolError;
pub use keypair::Keypair;
pub use spl_token::{
    build_create_associated_token_account, build_initialize_mint, build_mint_to,
    build_revoke_mint_authority, derive_associated_token_address, AuthorityType,
    ASSOCIATED_TOKEN_PROGRAM_ID, MINT_SIZE, TOKEN_PROGRAM_ID,
};
pub use transaction::{
    build_create_account, compile_transaction, decode_compact_u16, encode_compact_u16,
    parse_transaction, serialize_message, serialize_transaction, CompiledInstruction,
    ParsedTransaction, SolAccountMeta, SolInstruction, SolTransaction, SYSTEM_PROGRAM_ID,
    SYSVAR_RENT_ID,
};
