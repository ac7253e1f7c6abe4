use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete, externally advanced time (block height, tick count).
pub type TimeUnit = u64;

pub type ContentId = u64;
pub type CategoryId = u64;

/// Opaque participant identifier. The core never authenticates it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// First-round decision carried by content once it has been finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn reversed(self) -> Self {
        match self {
            Decision::Approved => Decision::Rejected,
            Decision::Rejected => Decision::Approved,
        }
    }

    /// Majority rule shared by both rounds: strict majority for, otherwise rejected.
    pub fn from_tally(votes_for: u64, votes_against: u64) -> Self {
        if votes_for > votes_against {
            Decision::Approved
        } else {
            Decision::Rejected
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approved => write!(f, "approved"),
            Decision::Rejected => write!(f, "rejected"),
        }
    }
}

/// Window check used for both voting and appeal rounds.
pub fn window_closes_at(opened_at: TimeUnit, window: u64) -> TimeUnit {
    opened_at.saturating_add(window)
}

pub fn window_elapsed(opened_at: TimeUnit, window: u64, now: TimeUnit) -> bool {
    now >= window_closes_at(opened_at, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_is_rejected() {
        assert_eq!(Decision::from_tally(0, 0), Decision::Rejected);
        assert_eq!(Decision::from_tally(10, 10), Decision::Rejected);
        assert_eq!(Decision::from_tally(11, 10), Decision::Approved);
        assert_eq!(Decision::from_tally(3, 10), Decision::Rejected);
    }

    #[test]
    fn test_window_boundary() {
        assert!(!window_elapsed(10, 5, 14));
        assert!(window_elapsed(10, 5, 15));
        assert!(!window_elapsed(u64::MAX - 1, 5, u64::MAX - 1));
        assert!(window_elapsed(u64::MAX - 1, 5, u64::MAX));
    }

    #[test]
    fn test_participant_id_serializes_as_string() {
        let id = ParticipantId::from("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
    }
}
