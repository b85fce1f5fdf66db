use serde::Serialize;

/// A badge tier: static configuration, not ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeTier {
    pub level: u8,
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Minimum cumulative check-ins required to unlock.
    pub threshold: u32,
    pub emoji: &'static str,
}

impl BadgeTier {
    /// The tier's bit in the on-chain `claimed_mask`.
    pub fn mask_bit(&self) -> u32 {
        badge_bit(self.level).unwrap_or(0)
    }

    pub fn is_unlocked(&self, total_checkins: u32) -> bool {
        total_checkins >= self.threshold
    }
}

/// Tiers the ledger program accepts, ordered by level.
pub const BADGE_CATALOG: [BadgeTier; 3] = [
    BadgeTier {
        level: 1,
        id: "badge_1",
        name: "First Steps",
        description: "1 day checked in",
        threshold: 1,
        emoji: "🌱",
    },
    BadgeTier {
        level: 2,
        id: "badge_2",
        name: "Persistence",
        description: "21 days checked in",
        threshold: 21,
        emoji: "🔥",
    },
    BadgeTier {
        level: 3,
        id: "badge_3",
        name: "Check-in Master",
        description: "30 days checked in",
        threshold: 30,
        emoji: "🏆",
    },
];

pub fn find_tier(level: u8) -> Option<&'static BadgeTier> {
    BADGE_CATALOG.iter().find(|tier| tier.level == level)
}

/// `1 << (level - 1)`; `None` for level 0 or levels past the mask width.
pub fn badge_bit(level: u8) -> Option<u32> {
    1u32.checked_shl(u32::from(level.checked_sub(1)?))
}

/// Parse a level given either as a number or as a tier id (`"badge_2"`).
pub fn parse_level(input: &str) -> Option<u8> {
    let input = input.trim();
    if let Ok(level) = input.parse::<u8>() {
        return Some(level);
    }
    let digits_at = input
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    input[digits_at..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_ordered_by_level_and_threshold() {
        let levels: Vec<u8> = BADGE_CATALOG.iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        let thresholds: Vec<u32> = BADGE_CATALOG.iter().map(|t| t.threshold).collect();
        assert_eq!(thresholds, vec![1, 21, 30]);
    }

    #[test]
    fn mask_bits() {
        assert_eq!(badge_bit(0), None);
        assert_eq!(badge_bit(1), Some(0b001));
        assert_eq!(badge_bit(3), Some(0b100));
        assert_eq!(badge_bit(32), Some(1 << 31));
        assert_eq!(badge_bit(33), None);
        assert_eq!(find_tier(2).unwrap().mask_bit(), 0b010);
    }

    #[test]
    fn unlock_is_inclusive() {
        let tier = find_tier(2).unwrap();
        assert!(!tier.is_unlocked(20));
        assert!(tier.is_unlocked(21));
    }

    #[test]
    fn unknown_level_has_no_tier() {
        assert!(find_tier(0).is_none());
        assert!(find_tier(4).is_none());
    }

    #[test]
    fn parse_level_accepts_number_or_id() {
        assert_eq!(parse_level("2"), Some(2));
        assert_eq!(parse_level("badge_3"), Some(3));
        assert_eq!(parse_level(" badge_1 "), Some(1));
        assert_eq!(parse_level("badge"), None);
    }
}
