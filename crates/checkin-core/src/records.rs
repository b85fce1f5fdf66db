//! Typed views of the ledger program's accounts.
//!
//! Binary account data is Anchor's layout: an 8-byte account discriminator
//! followed by the Borsh-encoded struct. Some RPC providers and indexers
//! hand back a decoded JSON object instead; field names there are tried in a
//! fixed order, canonical camelCase first, then the legacy snake_case
//! spelling. A field absent under both names takes the value a freshly
//! initialized record would have.

use chain_sol::address_to_bytes;
use serde_json::Value;
use thiserror::Error;

use crate::badges::badge_bit;
use crate::clock::NEVER;
use crate::rpc::AccountData;

/// `SHA-256("account:UserCheckin")[..8]`
pub const USER_CHECKIN_DISCRIMINATOR: [u8; 8] = [189, 127, 89, 157, 162, 26, 18, 243];
/// `SHA-256("account:UserBadges")[..8]`
pub const USER_BADGES_DISCRIMINATOR: [u8; 8] = [90, 12, 46, 138, 175, 155, 176, 190];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("account discriminator mismatch")]
    WrongDiscriminator,

    #[error("account data too short: expected {expected} bytes, got {got}")]
    TooShort { expected: usize, got: usize },

    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Per-owner check-in state (`UserCheckin`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInRecord {
    pub authority: [u8; 32],
    pub total_checkins: u32,
    /// Day index of the last check-in, or [`NEVER`].
    pub last_checkin_day: i64,
    pub streak: u16,
    pub bump: u8,
}

impl CheckInRecord {
    /// Discriminator plus `32 + 4 + 8 + 2 + 1` bytes of fields.
    pub const LEN: usize = 8 + 32 + 4 + 8 + 2 + 1;

    pub fn decode(data: &AccountData) -> Result<Self, RecordError> {
        match data {
            AccountData::Binary(bytes) => Self::from_bytes(bytes),
            AccountData::Parsed(value) => Self::from_json(value),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        let mut reader = Reader::new(bytes, Self::LEN, &USER_CHECKIN_DISCRIMINATOR)?;
        Ok(Self {
            authority: reader.array()?,
            total_checkins: u32::from_le_bytes(reader.array()?),
            last_checkin_day: i64::from_le_bytes(reader.array()?),
            streak: u16::from_le_bytes(reader.array()?),
            bump: reader.array::<1>()?[0],
        })
    }

    pub fn from_json(value: &Value) -> Result<Self, RecordError> {
        Ok(Self {
            authority: json_pubkey(value, "authority")?,
            total_checkins: json_int(value, &["totalCheckins", "total_checkins"], 0)?,
            last_checkin_day: json_int(value, &["lastCheckinDay", "last_checkin_day"], NEVER)?,
            streak: json_int(value, &["streak"], 0)?,
            bump: json_int(value, &["bump"], 0)?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&USER_CHECKIN_DISCRIMINATOR);
        out.extend_from_slice(&self.authority);
        out.extend_from_slice(&self.total_checkins.to_le_bytes());
        out.extend_from_slice(&self.last_checkin_day.to_le_bytes());
        out.extend_from_slice(&self.streak.to_le_bytes());
        out.push(self.bump);
        out
    }

    pub fn last_day(&self) -> Option<i64> {
        (self.last_checkin_day >= 0).then_some(self.last_checkin_day)
    }

    pub fn checked_in_on(&self, day: i64) -> bool {
        self.last_checkin_day == day
    }

    /// Whether `day` falls inside the current run of consecutive check-ins.
    ///
    /// The program only extends `streak` when the previous check-in was the
    /// day before, so every day of `last - streak + 1 ..= last` was checked.
    pub fn in_streak_window(&self, day: i64) -> bool {
        match self.last_day() {
            Some(last) if self.streak > 0 => {
                day <= last && day > last - i64::from(self.streak)
            }
            _ => false,
        }
    }
}

/// Per-owner claimed-tier mask (`UserBadges`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeRecord {
    pub authority: [u8; 32],
    pub claimed_mask: u32,
    pub bump: u8,
}

impl BadgeRecord {
    pub const LEN: usize = 8 + 32 + 4 + 1;

    pub fn decode(data: &AccountData) -> Result<Self, RecordError> {
        match data {
            AccountData::Binary(bytes) => Self::from_bytes(bytes),
            AccountData::Parsed(value) => Self::from_json(value),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        let mut reader = Reader::new(bytes, Self::LEN, &USER_BADGES_DISCRIMINATOR)?;
        Ok(Self {
            authority: reader.array()?,
            claimed_mask: u32::from_le_bytes(reader.array()?),
            bump: reader.array::<1>()?[0],
        })
    }

    pub fn from_json(value: &Value) -> Result<Self, RecordError> {
        Ok(Self {
            authority: json_pubkey(value, "authority")?,
            claimed_mask: json_int(value, &["claimedMask", "claimed_mask"], 0)?,
            bump: json_int(value, &["bump"], 0)?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&USER_BADGES_DISCRIMINATOR);
        out.extend_from_slice(&self.authority);
        out.extend_from_slice(&self.claimed_mask.to_le_bytes());
        out.push(self.bump);
        out
    }

    pub fn is_claimed(&self, level: u8) -> bool {
        badge_bit(level).is_some_and(|bit| self.claimed_mask & bit != 0)
    }
}

// ─── Decoding helpers ───────────────────────────────────────────────

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Checks length and discriminator, leaving the cursor on the first field.
    /// Trailing bytes past `len` are ignored (accounts may be over-allocated).
    fn new(data: &'a [u8], len: usize, discriminator: &[u8; 8]) -> Result<Self, RecordError> {
        if data.len() < len {
            return Err(RecordError::TooShort {
                expected: len,
                got: data.len(),
            });
        }
        if &data[..8] != discriminator {
            return Err(RecordError::WrongDiscriminator);
        }
        Ok(Self { data, pos: 8 })
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], RecordError> {
        let end = self.pos + N;
        let slice = self.data.get(self.pos..end).ok_or(RecordError::TooShort {
            expected: end,
            got: self.data.len(),
        })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}

fn json_pubkey(value: &Value, field: &'static str) -> Result<[u8; 32], RecordError> {
    let raw = value
        .get(field)
        .ok_or(RecordError::MissingField(field))?
        .as_str()
        .ok_or_else(|| RecordError::InvalidField {
            field,
            reason: "expected a base58 string".into(),
        })?;
    address_to_bytes(raw).map_err(|e| RecordError::InvalidField {
        field,
        reason: e.to_string(),
    })
}

/// First present name wins. Integers may arrive as JSON numbers or as
/// decimal strings (64-bit values are often stringified).
fn json_int<T>(value: &Value, names: &[&'static str], default: T) -> Result<T, RecordError>
where
    T: TryFrom<i64>,
{
    let Some((field, raw)) = names
        .iter()
        .find_map(|name| value.get(*name).filter(|v| !v.is_null()).map(|v| (*name, v)))
    else {
        return Ok(default);
    };

    let wide = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| RecordError::InvalidField {
        field,
        reason: format!("expected an integer, got {raw}"),
    })?;

    T::try_from(wide).map_err(|_| RecordError::InvalidField {
        field,
        reason: format!("{wide} is out of range"),
    })
}
