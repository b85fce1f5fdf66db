//! Instruction encoders for the check-in ledger program.
//!
//! The program is an Anchor program: instruction data starts with
//! `SHA-256("global:<name>")[..8]`, followed by Borsh-encoded arguments.
//! Custom program errors start at 6000 in declaration order.

use chain_sol::{SolAccountMeta, SolInstruction, SYSTEM_PROGRAM_ID};
use sha2::{Digest, Sha256};

/// `SHA-256("global:initialize_user")[..8]`
pub const INITIALIZE_USER_DISCRIMINATOR: [u8; 8] = [111, 17, 185, 250, 60, 122, 38, 254];
/// `SHA-256("global:check_in")[..8]`
pub const CHECK_IN_DISCRIMINATOR: [u8; 8] = [209, 253, 4, 217, 250, 241, 207, 50];
/// `SHA-256("global:claim_badge")[..8]`
pub const CLAIM_BADGE_DISCRIMINATOR: [u8; 8] = [111, 30, 18, 17, 228, 252, 239, 102];

/// Custom error codes raised by the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ProgramErrorCode {
    AlreadyCheckedInToday = 6000,
    InvalidBadgeLevel = 6001,
    NotEnoughCheckins = 6002,
    BadgeAlreadyClaimed = 6003,
}

impl ProgramErrorCode {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            6000 => Some(Self::AlreadyCheckedInToday),
            6001 => Some(Self::InvalidBadgeLevel),
            6002 => Some(Self::NotEnoughCheckins),
            6003 => Some(Self::BadgeAlreadyClaimed),
            _ => None,
        }
    }

    /// Anchor's error name, as it appears in program logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AlreadyCheckedInToday => "AlreadyCheckedInToday",
            Self::InvalidBadgeLevel => "InvalidBadgeLevel",
            Self::NotEnoughCheckins => "NotEnoughCheckins",
            Self::BadgeAlreadyClaimed => "BadgeAlreadyClaimed",
        }
    }
}

/// Anchor-style 8-byte discriminator for `namespace:name`.
pub fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Creates the owner's check-in record.
pub fn initialize_user(program_id: &[u8; 32], authority: &[u8; 32], user_checkin: &[u8; 32]) -> SolInstruction {
    SolInstruction {
        program_id: *program_id,
        accounts: vec![
            SolAccountMeta::writable(*authority, true),
            SolAccountMeta::writable(*user_checkin, false),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data: INITIALIZE_USER_DISCRIMINATOR.to_vec(),
    }
}

pub fn check_in(program_id: &[u8; 32], authority: &[u8; 32], user_checkin: &[u8; 32]) -> SolInstruction {
    SolInstruction {
        program_id: *program_id,
        accounts: vec![
            SolAccountMeta::writable(*authority, true),
            SolAccountMeta::writable(*user_checkin, false),
        ],
        data: CHECK_IN_DISCRIMINATOR.to_vec(),
    }
}

/// Records a claim for `level`. The program creates the badge record on
/// first use, so no separate initialize step is needed for it.
pub fn claim_badge(
    program_id: &[u8; 32],
    authority: &[u8; 32],
    user_checkin: &[u8; 32],
    user_badges: &[u8; 32],
    level: u8,
) -> SolInstruction {
    let mut data = Vec::with_capacity(9);
    data.extend_from_slice(&CLAIM_BADGE_DISCRIMINATOR);
    data.push(level);

    SolInstruction {
        program_id: *program_id,
        accounts: vec![
            SolAccountMeta::writable(*authority, true),
            SolAccountMeta::writable(*user_checkin, false),
            SolAccountMeta::writable(*user_badges, false),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data,
    }
}
