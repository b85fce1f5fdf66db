//! The public check-in contract.
//!
//! Reads take an owner address. Mutations take the owner's signer, and the
//! owner is whoever that signer signs for. The ledger program is the only
//! authority on streaks and claims; this layer reads its snapshots, gates
//! what it can locally and classifies whatever the ledger rejects.

use std::sync::Arc;

use chain_sol::bytes_to_address;
use tracing::info;

use crate::badges::{find_tier, BADGE_CATALOG};
use crate::clock::{day_date, day_start, Clock, SystemClock};
use crate::composer::{Operation, TransactionComposer};
use crate::config::ProtocolConfig;
use crate::derive::{parse_key, AddressDeriver, Domain};
use crate::error::ProtocolError;
use crate::gateway::{ConfirmationPolicy, LedgerGateway};
use crate::records::CheckInRecord;
use crate::retry::RetryPolicy;
use crate::rpc::{HttpRpcClient, LedgerRpc};
use crate::signer::TransactionSigner;
use crate::single_flight::SingleFlight;
use crate::types::{BadgeStatus, CheckInStats, HistoryEntry, Submission};

/// Days shown by [`CheckInProtocol::get_history`], ending today.
pub const HISTORY_DAYS: i64 = 7;

pub struct CheckInProtocol {
    gateway: LedgerGateway,
    deriver: AddressDeriver,
    clock: Arc<dyn Clock>,
    flights: SingleFlight,
    retry: RetryPolicy,
}

impl CheckInProtocol {
    pub fn new(rpc: Arc<dyn LedgerRpc>, program_id: [u8; 32]) -> Self {
        Self::with_clock(rpc, program_id, Arc::new(SystemClock))
    }

    pub fn with_clock(rpc: Arc<dyn LedgerRpc>, program_id: [u8; 32], clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway: LedgerGateway::new(rpc, program_id),
            deriver: AddressDeriver::new(program_id),
            clock,
            flights: SingleFlight::new(),
            retry: RetryPolicy,
        }
    }

    /// Talk to `config.rpc_url` over HTTP.
    pub fn from_config(config: &ProtocolConfig) -> Result<Self, ProtocolError> {
        let program_id = config.validate()?;
        let rpc = HttpRpcClient::new(config.rpc_url.trim(), config.commitment).map_err(|e| {
            ProtocolError::Transport {
                endpoint: config.rpc_url.clone(),
                message: e.to_string(),
            }
        })?;
        Ok(Self::new(Arc::new(rpc), program_id)
            .with_confirmation(ConfirmationPolicy::new(config.commitment)))
    }

    /// How long mutations wait for their transaction to land.
    pub fn with_confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.gateway = self.gateway.with_confirmation(confirmation);
        self
    }

    pub fn gateway(&self) -> &LedgerGateway {
        &self.gateway
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    pub async fn get_stats(&self, owner: &str) -> Result<CheckInStats, ProtocolError> {
        let owner = parse_key(owner)?;
        let record = self.load_check_in(&owner).await?;
        Ok(stats_from(record.as_ref(), self.clock.today()))
    }

    pub async fn check_in(&self, signer: &dyn TransactionSigner) -> Result<Submission, ProtocolError> {
        let owner = signer.pubkey();
        let _flight = self.flights.try_acquire(&owner)?;
        self.gateway.assert_program_deployed().await?;

        let submission = self.submit(signer, Operation::CheckIn).await?;
        info!(
            owner = %bytes_to_address(&owner),
            signature = %submission.signature,
            "checked in"
        );
        Ok(submission)
    }

    pub async fn get_badges(&self, owner: &str) -> Result<Vec<BadgeStatus>, ProtocolError> {
        let owner = parse_key(owner)?;
        let total = self
            .load_check_in(&owner)
            .await?
            .map_or(0, |record| record.total_checkins);

        let badges_address = self.deriver.derive(Domain::Badges, &owner)?;
        let badges = self.gateway.fetch_badges(&badges_address).await?.into_option();

        Ok(BADGE_CATALOG
            .iter()
            .map(|tier| {
                let claimed = badges.is_some_and(|b| b.is_claimed(tier.level));
                BadgeStatus::new(tier, total, claimed)
            })
            .collect())
    }

    /// Gated locally on the catalog, the owner's total and the claimed mask
    /// before anything is built; the ledger re-checks all three.
    pub async fn claim_badge(
        &self,
        signer: &dyn TransactionSigner,
        level: u8,
    ) -> Result<Submission, ProtocolError> {
        let tier = find_tier(level).ok_or(ProtocolError::InvalidBadgeLevel(level))?;
        let owner = signer.pubkey();
        let _flight = self.flights.try_acquire(&owner)?;

        let total = self
            .load_check_in(&owner)
            .await?
            .map_or(0, |record| record.total_checkins);
        if !tier.is_unlocked(total) {
            return Err(ProtocolError::InsufficientCheckIns {
                level,
                threshold: tier.threshold,
                total,
            });
        }

        let badges_address = self.deriver.derive(Domain::Badges, &owner)?;
        if let Some(badges) = self.gateway.fetch_badges(&badges_address).await?.into_option() {
            if badges.is_claimed(level) {
                return Err(ProtocolError::BadgeAlreadyClaimed { level });
            }
        }

        let submission = self
            .submit(
                signer,
                Operation::ClaimBadge {
                    level,
                    total_checkins: total,
                },
            )
            .await?;
        info!(
            owner = %bytes_to_address(&owner),
            level,
            mint = submission.reward_mint.as_deref().unwrap_or_default(),
            "badge claimed"
        );
        Ok(submission)
    }

    pub async fn get_history(&self, owner: &str) -> Result<Vec<HistoryEntry>, ProtocolError> {
        let owner = parse_key(owner)?;
        let record = self.load_check_in(&owner).await?;
        Ok(history_from(record.as_ref(), self.clock.today()))
    }

    /// Deployment check, then the owner's check-in record if it exists.
    async fn load_check_in(&self, owner: &[u8; 32]) -> Result<Option<CheckInRecord>, ProtocolError> {
        self.gateway.assert_program_deployed().await?;
        let address = self.deriver.derive(Domain::CheckIn, owner)?;
        Ok(self.gateway.fetch_check_in(&address).await?.into_option())
    }

    async fn submit(
        &self,
        signer: &dyn TransactionSigner,
        operation: Operation,
    ) -> Result<Submission, ProtocolError> {
        let owner = signer.pubkey();
        let operation = &operation;
        self.retry
            .run(operation.name(), |attempt| async move {
                let composer = TransactionComposer::new(&self.gateway, &self.deriver);
                let unsigned = composer.compose(&owner, operation).await?;
                let wire = unsigned.sign(signer).await?;
                let signature = self
                    .gateway
                    .submit(&wire, &unsigned.message.recent_blockhash, operation)
                    .await?;
                Ok(Submission {
                    signature,
                    attempts: attempt,
                    reward_mint: unsigned.reward_mint.as_ref().map(bytes_to_address),
                })
            })
            .await
    }
}

fn stats_from(record: Option<&CheckInRecord>, today: i64) -> CheckInStats {
    let Some(record) = record else {
        return CheckInStats::uninitialized();
    };
    let last_day = record.last_day();
    CheckInStats {
        total_checkins: record.total_checkins,
        streak: record.streak,
        last_checkin_time: last_day.and_then(day_start),
        last_checkin_day: last_day,
        can_check_in: !record.checked_in_on(today),
    }
}

/// Oldest first, today last.
fn history_from(record: Option<&CheckInRecord>, today: i64) -> Vec<HistoryEntry> {
    (today - (HISTORY_DAYS - 1)..=today)
        .map(|day| HistoryEntry {
            day_index: day,
            date: day_date(day).map(|d| d.to_string()).unwrap_or_default(),
            checked: record.is_some_and(|r| r.in_streak_window(day)),
        })
        .collect()
}
