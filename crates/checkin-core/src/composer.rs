//! Builds the single atomic transaction for one check-in or badge claim.
//!
//! Instruction order is fixed. Later instructions reference accounts that
//! earlier ones create in the same transaction, and the ledger applies all
//! of them or none.

use chain_sol::{
    build_create_account, build_create_associated_token_account, build_initialize_mint,
    build_mint_to, build_revoke_mint_authority, compile_transaction, serialize_message,
    serialize_transaction, CompiledInstruction, Keypair, SolInstruction, SolTransaction,
    MINT_SIZE, TOKEN_PROGRAM_ID,
};
use tracing::debug;

use crate::badges::find_tier;
use crate::derive::{AddressDeriver, Domain};
use crate::error::ProtocolError;
use crate::gateway::LedgerGateway;
use crate::program::{self, ProgramErrorCode};
use crate::signer::TransactionSigner;

/// Reward tokens are whole, indivisible units.
const REWARD_DECIMALS: u8 = 0;

/// A mutating action against the ledger program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CheckIn,
    /// `total_checkins` is the snapshot the claim was gated on; it is only
    /// used to describe a ledger rejection.
    ClaimBadge { level: u8, total_checkins: u32 },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CheckIn => "check_in",
            Operation::ClaimBadge { .. } => "claim_badge",
        }
    }

    /// Map a ledger program rejection to the caller-facing error.
    pub fn rejection(&self, code: ProgramErrorCode) -> ProtocolError {
        let (level, total) = match *self {
            Operation::ClaimBadge {
                level,
                total_checkins,
            } => (level, total_checkins),
            Operation::CheckIn => (0, 0),
        };
        match code {
            ProgramErrorCode::AlreadyCheckedInToday => ProtocolError::AlreadyCheckedInToday,
            ProgramErrorCode::InvalidBadgeLevel => ProtocolError::InvalidBadgeLevel(level),
            ProgramErrorCode::NotEnoughCheckins => ProtocolError::InsufficientCheckIns {
                level,
                threshold: find_tier(level).map_or(0, |tier| tier.threshold),
                total,
            },
            ProgramErrorCode::BadgeAlreadyClaimed => ProtocolError::BadgeAlreadyClaimed { level },
        }
    }
}

/// A compiled message plus any throwaway keys that must co-sign it.
#[derive(Debug)]
pub struct UnsignedTransaction {
    pub message: SolTransaction,
    co_signers: Vec<Keypair>,
    /// Whether an `initialize_user` instruction was prepended.
    pub initializes_record: bool,
    /// The fresh reward mint, for badge claims.
    pub reward_mint: Option<[u8; 32]>,
}

impl UnsignedTransaction {
    pub fn instructions(&self) -> &[CompiledInstruction] {
        &self.message.compiled_instructions
    }

    /// Signs with the owner and every co-signer, returning the wire bytes.
    pub async fn sign(&self, owner: &dyn TransactionSigner) -> Result<Vec<u8>, ProtocolError> {
        let message = serialize_message(&self.message)?;

        let mut signatures = Vec::with_capacity(1 + self.co_signers.len());
        signatures.push((owner.pubkey(), owner.sign_message(&message).await?));
        for keypair in &self.co_signers {
            signatures.push((keypair.pubkey(), keypair.sign(&message)));
        }

        Ok(serialize_transaction(&self.message, &signatures)?)
    }
}

/// Borrowed per attempt; a retry builds a new transaction from scratch.
pub struct TransactionComposer<'a> {
    gateway: &'a LedgerGateway,
    deriver: &'a AddressDeriver,
}

impl<'a> TransactionComposer<'a> {
    pub fn new(gateway: &'a LedgerGateway, deriver: &'a AddressDeriver) -> Self {
        Self { gateway, deriver }
    }

    pub async fn compose(
        &self,
        owner: &[u8; 32],
        operation: &Operation,
    ) -> Result<UnsignedTransaction, ProtocolError> {
        let program_id = self.deriver.program_id();
        let user_checkin = self.deriver.derive(Domain::CheckIn, owner)?;

        let mut instructions: Vec<SolInstruction> = Vec::with_capacity(7);

        // Initialize-then-act: both operations need the check-in record.
        let initializes_record = !self.gateway.fetch_account(&user_checkin).await?.is_found();
        if initializes_record {
            instructions.push(program::initialize_user(program_id, owner, &user_checkin));
        }

        let mut co_signers = Vec::new();
        let mut reward_mint = None;

        match *operation {
            Operation::CheckIn => {
                instructions.push(program::check_in(program_id, owner, &user_checkin));
            }
            Operation::ClaimBadge { level, .. } => {
                let user_badges = self.deriver.derive(Domain::Badges, owner)?;
                let mint = Keypair::generate();
                let mint_key = mint.pubkey();
                let token_account = self
                    .deriver
                    .derive(Domain::AssociatedToken { mint: mint_key }, owner)?;
                let lamports = self.gateway.rent_exempt_minimum(MINT_SIZE).await?;

                instructions.push(build_create_account(
                    owner,
                    &mint_key,
                    lamports,
                    MINT_SIZE,
                    &TOKEN_PROGRAM_ID,
                ));
                instructions.push(build_initialize_mint(&mint_key, REWARD_DECIMALS, owner));
                instructions.push(build_create_associated_token_account(
                    owner,
                    &token_account,
                    owner,
                    &mint_key,
                ));
                instructions.push(build_mint_to(&mint_key, &token_account, owner, 1)?);
                instructions.push(build_revoke_mint_authority(&mint_key, owner));
                instructions.push(program::claim_badge(
                    program_id,
                    owner,
                    &user_checkin,
                    &user_badges,
                    level,
                ));

                co_signers.push(mint);
                reward_mint = Some(mint_key);
            }
        }

        // Last network call before signing, to keep the blockhash fresh.
        let blockhash = self.gateway.latest_blockhash().await?;
        let message = compile_transaction(&instructions, owner, &blockhash)?;

        debug!(
            operation = operation.name(),
            instructions = instructions.len(),
            initializes_record,
            "composed transaction"
        );

        Ok(UnsignedTransaction {
            message,
            co_signers,
            initializes_record,
            reward_mint,
        })
    }
}
