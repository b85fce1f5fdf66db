//! Client-side protocol for the daily check-in ledger program.
//!
//! [`CheckInProtocol`] is the entry point: stats, check-in, badges, badge
//! claims and a seven-day history for one owner. Underneath it:
//!
//! - [`AddressDeriver`] maps an owner to its program-derived accounts.
//! - [`LedgerGateway`] reads and decodes accounts over a [`LedgerRpc`] and
//!   classifies every failure into a [`ProtocolError`].
//! - [`TransactionComposer`] builds one atomic transaction per attempt,
//!   prepending `initialize_user` when the owner has no record yet.
//! - [`RetryPolicy`] rebuilds and resends once when the blockhash expires,
//!   whether at preflight or while waiting for the transaction to land.

pub mod arcade;
pub mod badges;
pub mod clock;
pub mod composer;
pub mod config;
pub mod derive;
pub mod error;
pub mod gateway;
pub mod program;
pub mod protocol;
pub mod records;
pub mod retry;
pub mod rpc;
pub mod signer;
pub mod single_flight;
pub mod types;

pub use arcade::{ArcadeQuota, InMemoryArcadeQuota, QuotaInfo, QuotaPolicy};
pub use badges::{find_tier, BadgeTier, BADGE_CATALOG};
pub use clock::{day_index, Clock, ManualClock, SystemClock};
pub use composer::{Operation, TransactionComposer, UnsignedTransaction};
pub use config::{Commitment, ProtocolConfig};
pub use derive::{parse_key, AddressDeriver, Domain};
pub use error::{DeploymentIssue, ProtocolError};
pub use gateway::{ConfirmationPolicy, Fetched, LedgerGateway};
pub use program::ProgramErrorCode;
pub use protocol::CheckInProtocol;
pub use records::{BadgeRecord, CheckInRecord};
pub use retry::RetryPolicy;
pub use rpc::{AccountData, AccountInfo, HttpRpcClient, LedgerRpc, RpcFailure, SignatureStatus};
pub use signer::{KeypairSigner, TransactionSigner};
pub use types::{BadgeStatus, CheckInStats, HistoryEntry, Submission};
