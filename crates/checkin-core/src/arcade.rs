//! Daily play quota for the arcade front end.
//!
//! Only the interface and a process-local reference implementation live
//! here. The day boundary is the same UTC day index the check-in layer
//! uses, so every owner's quota resets at the same instant.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaInfo {
    pub remaining: u32,
    pub daily_limit: u32,
    pub day_index: i64,
}

/// Plays per day, by caller kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaPolicy {
    /// No wallet connected.
    pub guest: u32,
    pub unchecked: u32,
    /// Owner has checked in today.
    pub checked_in: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            guest: 1,
            unchecked: 1,
            checked_in: 3,
        }
    }
}

impl QuotaPolicy {
    pub fn daily_limit(&self, owner: Option<&str>, checked_in_today: bool) -> u32 {
        match owner_key(owner) {
            None => self.guest,
            Some(_) if checked_in_today => self.checked_in,
            Some(_) => self.unchecked,
        }
    }
}

pub trait ArcadeQuota: Send + Sync {
    fn quota(&self, owner: Option<&str>, checked_in_today: bool) -> QuotaInfo;

    /// Uses one play if any remain; returns the quota afterwards. With
    /// nothing left this is a no-op.
    fn consume(&self, owner: Option<&str>, checked_in_today: bool) -> QuotaInfo;

    /// Forget plays used on `day_index` (today when `None`).
    fn reset(&self, owner: Option<&str>, day_index: Option<i64>);
}

/// Blank or absent owners share the guest bucket.
fn owner_key(owner: Option<&str>) -> Option<&str> {
    owner.map(str::trim).filter(|o| !o.is_empty())
}

const GUEST: &str = "guest";

pub struct InMemoryArcadeQuota {
    policy: QuotaPolicy,
    clock: Arc<dyn Clock>,
    used: Mutex<HashMap<(String, i64), u32>>,
}

impl InMemoryArcadeQuota {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: QuotaPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            used: Mutex::new(HashMap::new()),
        }
    }

    fn bucket(owner: Option<&str>, day: i64) -> (String, i64) {
        (owner_key(owner).unwrap_or(GUEST).to_string(), day)
    }
}

impl Default for InMemoryArcadeQuota {
    fn default() -> Self {
        Self::new(QuotaPolicy::default())
    }
}

impl ArcadeQuota for InMemoryArcadeQuota {
    fn quota(&self, owner: Option<&str>, checked_in_today: bool) -> QuotaInfo {
        let day_index = self.clock.today();
        let daily_limit = self.policy.daily_limit(owner, checked_in_today);
        let used = self
            .used
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&Self::bucket(owner, day_index))
            .copied()
            .unwrap_or(0);
        QuotaInfo {
            remaining: daily_limit.saturating_sub(used),
            daily_limit,
            day_index,
        }
    }

    fn consume(&self, owner: Option<&str>, checked_in_today: bool) -> QuotaInfo {
        let before = self.quota(owner, checked_in_today);
        if before.remaining == 0 {
            return before;
        }
        {
            let mut used = self.used.lock().unwrap_or_else(|e| e.into_inner());
            // Past days can never be read again through `quota`.
            used.retain(|(_, day), _| *day >= before.day_index);
            *used.entry(Self::bucket(owner, before.day_index)).or_insert(0) =
                before.daily_limit - before.remaining + 1;
        }
        self.quota(owner, checked_in_today)
    }

    fn reset(&self, owner: Option<&str>, day_index: Option<i64>) {
        let day = day_index.unwrap_or_else(|| self.clock.today());
        self.used
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&Self::bucket(owner, day));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const OWNER: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    fn arcade() -> (InMemoryArcadeQuota, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_704_067_200));
        (
            InMemoryArcadeQuota::with_clock(QuotaPolicy::default(), clock.clone()),
            clock,
        )
    }

    #[test]
    fn limits_follow_policy() {
        let policy = QuotaPolicy::default();
        assert_eq!(policy.daily_limit(None, true), 1);
        assert_eq!(policy.daily_limit(Some("  "), true), 1);
        assert_eq!(policy.daily_limit(Some(OWNER), false), 1);
        assert_eq!(policy.daily_limit(Some(OWNER), true), 3);
    }

    #[test]
    fn consume_counts_down_and_stops_at_zero() {
        let (arcade, _) = arcade();
        assert_eq!(arcade.quota(Some(OWNER), true).remaining, 3);
        assert_eq!(arcade.consume(Some(OWNER), true).remaining, 2);
        assert_eq!(arcade.consume(Some(OWNER), true).remaining, 1);
        assert_eq!(arcade.consume(Some(OWNER), true).remaining, 0);
        assert_eq!(arcade.consume(Some(OWNER), true).remaining, 0);
    }

    #[test]
    fn checking_in_raises_the_limit_mid_day() {
        let (arcade, _) = arcade();
        assert_eq!(arcade.consume(Some(OWNER), false).remaining, 0);
        assert_eq!(arcade.quota(Some(OWNER), true).remaining, 2);
    }

    #[test]
    fn quota_resets_at_utc_midnight() {
        let (arcade, clock) = arcade();
        arcade.consume(Some(OWNER), false);
        clock.advance_days(1);
        let info = arcade.quota(Some(OWNER), false);
        assert_eq!(info.remaining, 1);
        assert_eq!(info.day_index, 19_724);
    }

    #[test]
    fn reset_clears_one_day() {
        let (arcade, _) = arcade();
        arcade.consume(None, false);
        assert_eq!(arcade.quota(None, false).remaining, 0);
        arcade.reset(None, None);
        assert_eq!(arcade.quota(None, false).remaining, 1);
    }

    #[test]
    fn consuming_drops_buckets_from_earlier_days() {
        let (arcade, clock) = arcade();
        arcade.consume(Some(OWNER), false);
        arcade.consume(Some("other"), false);
        arcade.consume(None, false);
        assert_eq!(arcade.used.lock().unwrap().len(), 3);

        clock.advance_days(1);
        arcade.consume(Some(OWNER), false);
        let used = arcade.used.lock().unwrap();
        assert_eq!(used.len(), 1);
        assert!(used.keys().all(|(_, day)| *day == clock.today()));
    }

    #[test]
    fn owners_are_independent() {
        let (arcade, _) = arcade();
        arcade.consume(Some(OWNER), false);
        assert_eq!(arcade.quota(Some("other"), false).remaining, 1);
        assert_eq!(arcade.quota(None, false).remaining, 1);
    }
}
