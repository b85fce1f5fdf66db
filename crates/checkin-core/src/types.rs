use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::badges::BadgeTier;

/// Check-in summary for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStats {
    pub total_checkins: u32,
    pub streak: u16,
    /// UTC midnight of the last check-in day.
    pub last_checkin_time: Option<DateTime<Utc>>,
    pub last_checkin_day: Option<i64>,
    pub can_check_in: bool,
}

impl CheckInStats {
    /// Stats of an owner who never checked in.
    pub fn uninitialized() -> Self {
        Self {
            total_checkins: 0,
            streak: 0,
            last_checkin_time: None,
            last_checkin_day: None,
            can_check_in: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStatus {
    pub level: u8,
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub emoji: &'static str,
    pub threshold: u32,
    pub unlocked: bool,
    pub claimed: bool,
}

impl BadgeStatus {
    pub fn new(tier: &BadgeTier, total_checkins: u32, claimed: bool) -> Self {
        Self {
            level: tier.level,
            id: tier.id,
            name: tier.name,
            description: tier.description,
            emoji: tier.emoji,
            threshold: tier.threshold,
            unlocked: tier.is_unlocked(total_checkins),
            claimed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub day_index: i64,
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    pub checked: bool,
}

/// A transaction the ledger accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub signature: String,
    /// 1, or 2 when the first attempt's blockhash expired.
    pub attempts: u32,
    pub reward_mint: Option<String>,
}
