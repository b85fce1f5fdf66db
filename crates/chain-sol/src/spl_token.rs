//! SPL Token operations for Solana.
//!
//! Implements the handful of SPL Token instructions needed to mint a
//! one-of-one reward token (initialize mint, mint to, revoke mint authority),
//! the associated token account (ATA) create instruction and ATA address
//! derivation, without pulling in the `solana-sdk` or the `spl-token` crates.

use crate::address::find_program_address;
use crate::error::SolError;
use crate::transaction::{SolAccountMeta, SolInstruction, SYSTEM_PROGRAM_ID, SYSVAR_RENT_ID};

// ---------------------------------------------------------------------------
// Well-known program IDs
// ---------------------------------------------------------------------------

/// SPL Token Program ID: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: [u8; 32] = [
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79,
    0xac, 0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff,
    0x00, 0xa9,
];

/// Associated Token Account Program ID: `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: [u8; 32] = [
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d,
    0x83, 0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9,
    0xf8, 0x59,
];

/// Size of an SPL Token mint account in bytes.
pub const MINT_SIZE: u64 = 82;

// Instruction tags (first data byte) from the token program's ABI.
const INITIALIZE_MINT_TAG: u8 = 0;
const SET_AUTHORITY_TAG: u8 = 6;
const MINT_TO_TAG: u8 = 7;

/// `COption::None` marker.
const OPTION_NONE: u8 = 0;

/// Authority selector for `SetAuthority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuthorityType {
    MintTokens = 0,
    FreezeAccount = 1,
    AccountOwner = 2,
    CloseAccount = 3,
}

// ---------------------------------------------------------------------------
// Mint lifecycle
// ---------------------------------------------------------------------------

/// Build an SPL Token `InitializeMint` instruction with no freeze authority.
///
/// # Wire format
///
/// `[0] + decimals + mint_authority (32) + [0]` (freeze authority absent).
/// Total data: 35 bytes. The rent sysvar must be passed as the second account.
pub fn build_initialize_mint(
    mint: &[u8; 32],
    decimals: u8,
    mint_authority: &[u8; 32],
) -> SolInstruction {
    let mut data = Vec::with_capacity(35);
    data.push(INITIALIZE_MINT_TAG);
    data.push(decimals);
    data.extend_from_slice(mint_authority);
    data.push(OPTION_NONE);

    SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*mint, false),
            SolAccountMeta::readonly(SYSVAR_RENT_ID, false),
        ],
        data,
    }
}

/// Build an SPL Token `MintTo` instruction.
///
/// # Wire format
///
/// `[7] + amount (u64 LE)`. Total data: 9 bytes.
pub fn build_mint_to(
    mint: &[u8; 32],
    destination: &[u8; 32],
    authority: &[u8; 32],
    amount: u64,
) -> Result<SolInstruction, SolError> {
    if amount == 0 {
        return Err(SolError::TransactionBuildError(
            "mint amount must be > 0".into(),
        ));
    }

    let mut data = Vec::with_capacity(9);
    data.push(MINT_TO_TAG);
    data.extend_from_slice(&amount.to_le_bytes());

    Ok(SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*mint, false),
            SolAccountMeta::writable(*destination, false),
            SolAccountMeta::readonly(*authority, true),
        ],
        data,
    })
}

/// Build an SPL Token `SetAuthority` instruction that clears the mint
/// authority, permanently fixing the supply.
///
/// # Wire format
///
/// `[6] + [0] (MintTokens) + [0] (new authority absent)`. Total data: 3 bytes.
pub fn build_revoke_mint_authority(
    mint: &[u8; 32],
    current_authority: &[u8; 32],
) -> SolInstruction {
    SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*mint, false),
            SolAccountMeta::readonly(*current_authority, true),
        ],
        data: vec![
            SET_AUTHORITY_TAG,
            AuthorityType::MintTokens as u8,
            OPTION_NONE,
        ],
    }
}

// ---------------------------------------------------------------------------
// Associated Token Account
// ---------------------------------------------------------------------------

/// Derive the associated token account address for a wallet + mint pair.
///
/// The ATA is a Program Derived Address (PDA) with seeds
/// `[wallet_address, token_program_id, mint_address]`
/// derived from the Associated Token Account program.
pub fn derive_associated_token_address(
    wallet: &[u8; 32],
    mint: &[u8; 32],
) -> Result<[u8; 32], SolError> {
    find_program_address(
        &[wallet.as_ref(), &TOKEN_PROGRAM_ID, mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|(address, _bump)| address)
}

/// Build the Associated Token Account program's `Create` instruction.
///
/// Data is empty; the seven accounts are, in order: payer, ATA, wallet,
/// mint, system program, token program, rent sysvar.
pub fn build_create_associated_token_account(
    payer: &[u8; 32],
    ata: &[u8; 32],
    wallet: &[u8; 32],
    mint: &[u8; 32],
) -> SolInstruction {
    SolInstruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*payer, true),
            SolAccountMeta::writable(*ata, false),
            SolAccountMeta::readonly(*wallet, false),
            SolAccountMeta::readonly(*mint, false),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
            SolAccountMeta::readonly(TOKEN_PROGRAM_ID, false),
            SolAccountMeta::readonly(SYSVAR_RENT_ID, false),
        ],
        data: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;

    const MINT: [u8; 32] = [0x0Au8; 32];
    const DEST: [u8; 32] = [0x0Bu8; 32];
    const AUTH: [u8; 32] = [0x0Cu8; 32];

    // -- Constant verification ----------------------------------------------

    #[test]
    fn token_program_id_roundtrip() {
        let addr = address::bytes_to_address(&TOKEN_PROGRAM_ID);
        assert_eq!(addr, "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
    }

    #[test]
    fn associated_token_program_id_roundtrip() {
        let addr = address::bytes_to_address(&ASSOCIATED_TOKEN_PROGRAM_ID);
        assert_eq!(addr, "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
    }

    // -- Fixed byte vectors -------------------------------------------------

    #[test]
    fn mint_to_one_matches_fixed_vector() {
        let ix = build_mint_to(&MINT, &DEST, &AUTH, 1).unwrap();
        assert_eq!(ix.data, vec![0x07, 0x01, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn mint_to_amount_is_little_endian() {
        let ix = build_mint_to(&MINT, &DEST, &AUTH, 0x0102_0304_0506_0708).unwrap();
        assert_eq!(
            ix.data,
            vec![0x07, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn initialize_mint_matches_fixed_vector() {
        let ix = build_initialize_mint(&MINT, 0, &AUTH);

        let mut expected = vec![0x00, 0x00];
        expected.extend_from_slice(&[0x0C; 32]);
        expected.push(0x00);
        assert_eq!(ix.data, expected);
        assert_eq!(ix.data.len(), 35);
    }

    #[test]
    fn revoke_mint_authority_matches_fixed_vector() {
        let ix = build_revoke_mint_authority(&MINT, &AUTH);
        assert_eq!(ix.data, vec![0x06, 0x00, 0x00]);
    }

    // -- Account roles ------------------------------------------------------

    #[test]
    fn initialize_mint_accounts() {
        let ix = build_initialize_mint(&MINT, 0, &AUTH);
        assert_eq!(ix.program_id, TOKEN_PROGRAM_ID);
        assert_eq!(
            ix.accounts,
            vec![
                SolAccountMeta::writable(MINT, false),
                SolAccountMeta::readonly(SYSVAR_RENT_ID, false),
            ]
        );
    }

    #[test]
    fn mint_to_account_roles() {
        let ix = build_mint_to(&MINT, &DEST, &AUTH, 1).unwrap();

        assert_eq!(ix.accounts.len(), 3);
        assert!(ix.accounts[0].is_writable && !ix.accounts[0].is_signer);
        assert!(ix.accounts[1].is_writable && !ix.accounts[1].is_signer);
        assert!(ix.accounts[2].is_signer && !ix.accounts[2].is_writable);
    }

    #[test]
    fn mint_to_zero_amount_fails() {
        assert!(build_mint_to(&MINT, &DEST, &AUTH, 0).is_err());
    }

    #[test]
    fn revoke_requires_current_authority_signature() {
        let ix = build_revoke_mint_authority(&MINT, &AUTH);
        assert_eq!(ix.accounts[1], SolAccountMeta::readonly(AUTH, true));
    }

    #[test]
    fn create_ata_account_list() {
        let ix = build_create_associated_token_account(&AUTH, &DEST, &AUTH, &MINT);
        assert_eq!(ix.program_id, ASSOCIATED_TOKEN_PROGRAM_ID);
        assert!(ix.data.is_empty());
        assert_eq!(ix.accounts.len(), 7);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1], SolAccountMeta::writable(DEST, false));
        assert_eq!(ix.accounts[5].pubkey, TOKEN_PROGRAM_ID);
        assert_eq!(ix.accounts[6].pubkey, SYSVAR_RENT_ID);
    }

    // -- ATA derivation -----------------------------------------------------

    #[test]
    fn ata_matches_known_vector() {
        let ata = derive_associated_token_address(&[7u8; 32], &[9u8; 32]).unwrap();
        assert_eq!(
            address::bytes_to_address(&ata),
            "BjmJ1yi1Sc4s9xQaiv4DbRuUhgfjUSc8cYSuwsFqoS9"
        );
    }

    #[test]
    fn ata_is_off_curve_and_deterministic() {
        let a = derive_associated_token_address(&[0x11; 32], &[0x22; 32]).unwrap();
        let b = derive_associated_token_address(&[0x11; 32], &[0x22; 32]).unwrap();
        assert_eq!(a, b);
        assert!(!address::is_on_curve(&a));
    }

    #[test]
    fn ata_differs_per_wallet_and_mint() {
        let base = derive_associated_token_address(&[1u8; 32], &[2u8; 32]).unwrap();
        assert_ne!(base, derive_associated_token_address(&[3u8; 32], &[2u8; 32]).unwrap());
        assert_ne!(base, derive_associated_token_address(&[1u8; 32], &[3u8; 32]).unwrap());
    }
}
