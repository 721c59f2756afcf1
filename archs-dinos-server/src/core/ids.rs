//! Identifiers
//!
//! Newtypes for matches, users and catalog cards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest accepted match identifier.
pub const MAX_MATCH_ID_LEN: usize = 64;

// =============================================================================
// MATCH ID
// =============================================================================

/// Match identifier assigned by the lobby layer.
///
/// Validated on construction: non-empty, at most [`MAX_MATCH_ID_LEN`]
/// characters, no whitespace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchId(String);

impl MatchId {
    /// Parse and validate a match identifier.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty()
            || raw.len() > MAX_MATCH_ID_LEN
            || raw.chars().any(char::is_whitespace)
        {
            return None;
        }
        Some(Self(raw))
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Borrow the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MatchId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MatchId::parse(value.clone()).ok_or_else(|| format!("invalid match id: {value:?}"))
    }
}

impl From<MatchId> for String {
    fn from(id: MatchId) -> Self {
        id.0
    }
}

// =============================================================================
// USER ID
// =============================================================================

/// Account identifier of a player. Zero is reserved and never valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl UserId {
    /// Create from a raw account number.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Whether this id can belong to a real account.
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

// =============================================================================
// CARD ID
// =============================================================================

/// Catalog card identifier (1-based).
///
/// Each catalog card appears exactly once per match, so the id also
/// identifies the card instance in play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u16);

impl CardId {
    /// Create from the raw catalog number.
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Raw catalog number.
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card#{}", self.0)
    }
}
