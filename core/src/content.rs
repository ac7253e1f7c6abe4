use crate::appeal::Appeal;
use crate::error::{ModerationError, ModerationResult};
use crate::reputation::{load_or_new, require_reputation, Action, Settlement};
use crate::store::{EntityKind, Store};
use crate::types::{window_closes_at, CategoryId, ContentId, Decision, ParticipantId, TimeUnit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::info;

/// `Pending -> {Approved, Rejected} -> Appealed -> Resolved`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Pending,
    Approved,
    Rejected,
    Appealed,
    Resolved,
}

impl ContentStatus {
    pub fn is_appealable(&self) -> bool {
        matches!(self, ContentStatus::Approved | ContentStatus::Rejected)
    }
}

impl From<Decision> for ContentStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => ContentStatus::Approved,
            Decision::Rejected => ContentStatus::Rejected,
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentStatus::Pending => write!(f, "pending"),
            ContentStatus::Approved => write!(f, "approved"),
            ContentStatus::Rejected => write!(f, "rejected"),
            ContentStatus::Appealed => write!(f, "appealed"),
            ContentStatus::Resolved => write!(f, "resolved"),
        }
    }
}

/// Permanent moderation record for one piece of off-system content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    pub submitter: ParticipantId,
    pub content_hash: Vec<u8>,
    pub category_id: Option<CategoryId>,
    pub status: ContentStatus,
    pub submitted_at: TimeUnit,
    pub votes_for: u64,
    pub votes_against: u64,
    pub voters: BTreeSet<ParticipantId>,
    pub appeal: Option<Appeal>,

    /// Effective decision; flips if an appeal overturns the first round.
    pub outcome: Option<Decision>,
    pub finalized_at: Option<TimeUnit>,
    /// Category threshold evaluation at finalization, `None` without a category.
    pub threshold_met: Option<bool>,
}

impl Content {
    pub fn new(
        id: ContentId,
        submitter: ParticipantId,
        content_hash: Vec<u8>,
        category_id: Option<CategoryId>,
        submitted_at: TimeUnit,
    ) -> Self {
        Self {
            id,
            submitter,
            content_hash,
            category_id,
            status: ContentStatus::Pending,
            submitted_at,
            votes_for: 0,
            votes_against: 0,
            voters: BTreeSet::new(),
            appeal: None,
            outcome: None,
            finalized_at: None,
            threshold_met: None,
        }
    }

    pub fn total_votes(&self) -> u64 {
        self.votes_for.saturating_add(self.votes_against)
    }

    pub fn voting_closes_at(&self, voting_window: u64) -> TimeUnit {
        window_closes_at(self.submitted_at, voting_window)
    }

    pub fn has_open_appeal(&self) -> bool {
        self.appeal.as_ref().is_some_and(|a| !a.resolved)
    }

    pub fn content_hash_hex(&self) -> String {
        hex::encode(&self.content_hash)
    }

    /// Outcome view used by reputation scoring. Content that is still
    /// pending or under appeal has not settled.
    pub fn settlement(&self) -> Settlement {
        let outcome = match self.status {
            ContentStatus::Approved | ContentStatus::Rejected | ContentStatus::Resolved => {
                self.outcome
            }
            ContentStatus::Pending | ContentStatus::Appealed => None,
        };

        let appeal_overturned = self
            .appeal
            .as_ref()
            .and_then(|appeal| appeal.outcome)
            .map(|outcome| outcome.is_overturned());

        Settlement {
            outcome,
            appeal_overturned,
        }
    }
}

pub fn submit_content<S: Store>(
    store: &mut S,
    submitter: &ParticipantId,
    content_hash: &[u8],
    now: TimeUnit,
) -> ModerationResult<ContentId> {
    insert_content(store, submitter, content_hash, None, now)
}

pub fn submit_content_with_category<S: Store>(
    store: &mut S,
    submitter: &ParticipantId,
    content_hash: &[u8],
    category_id: CategoryId,
    now: TimeUnit,
) -> ModerationResult<ContentId> {
    let category = store
        .category(category_id)
        .ok_or(ModerationError::UnknownCategory(category_id))?;

    require_reputation(store, submitter, category.required_reputation)?;

    insert_content(store, submitter, content_hash, Some(category_id), now)
}

fn insert_content<S: Store>(
    store: &mut S,
    submitter: &ParticipantId,
    content_hash: &[u8],
    category_id: Option<CategoryId>,
    now: TimeUnit,
) -> ModerationResult<ContentId> {
    let mut participant = load_or_new(store, submitter);

    let id = store.allocate_id(EntityKind::Content);
    store.put_content(Content::new(
        id,
        submitter.clone(),
        content_hash.to_vec(),
        category_id,
        now,
    ));

    participant.history.push(Action::Submit { content_id: id });
    store.put_participant(participant);

    info!(
        content_id = id,
        submitter = %submitter,
        category_id = ?category_id,
        submitted_at = now,
        "Content submitted"
    );

    Ok(id)
}

pub fn get_content<S: Store>(store: &S, id: ContentId) -> Option<Content> {
    store.content(id)
}

pub(crate) fn require_content<S: Store>(store: &S, id: ContentId) -> ModerationResult<Content> {
    store.content(id).ok_or(ModerationError::UnknownContent(id))
}

pub fn pending_content<S: Store>(store: &S) -> Vec<Content> {
    store
        .content_ids()
        .into_iter()
        .filter_map(|id| store.content(id))
        .filter(|content| content.status == ContentStatus::Pending)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::create_category;
    use crate::config::ModerationConfig;
    use crate::reputation::stake;
    use crate::store::MemoryStore;

    #[test]
    fn test_submit_content() {
        let mut store = MemoryStore::new();
        let alice = ParticipantId::from("alice");

        let id = submit_content(&mut store, &alice, b"test content hash", 7).unwrap();
        assert_eq!(id, 1);

        let content = get_content(&store, id).unwrap();
        assert_eq!(content.status, ContentStatus::Pending);
        assert_eq!(content.submitter, alice);
        assert_eq!(content.submitted_at, 7);
        assert_eq!(content.total_votes(), 0);
        assert!(content.voters.is_empty());
        assert!(content.appeal.is_none());
        assert_eq!(content.category_id, None);

        let participant = store.participant(&alice).unwrap();
        assert_eq!(participant.history, vec![Action::Submit { content_id: 1 }]);
        assert_eq!(participant.reputation, 0);
    }

    #[test]
    fn test_sequential_ids() {
        let mut store = MemoryStore::new();
        let alice = ParticipantId::from("alice");

        for expected in 1..=3 {
            let id = submit_content(&mut store, &alice, b"hash", 0).unwrap();
            assert_eq!(id, expected);
        }
    }

    #[test]
    fn test_submit_unknown_category() {
        let mut store = MemoryStore::new();
        let alice = ParticipantId::from("alice");

        let result = submit_content_with_category(&mut store, &alice, b"hash", 9, 0);

        assert_eq!(result, Err(ModerationError::UnknownCategory(9)));
        assert_eq!(store.content_count(), 0);
    }

    #[test]
    fn test_submit_with_category_requires_reputation() {
        let mut store = MemoryStore::new();
        let config = ModerationConfig::default();
        let curator = ParticipantId::from("curator");
        let alice = ParticipantId::from("alice");

        stake(&mut store, &config, &curator, 1000).unwrap();
        let category = create_category(&mut store, &config, &curator, "news", 105, 0).unwrap();

        let result = submit_content_with_category(&mut store, &alice, b"hash", category, 0);
        assert!(matches!(
            result,
            Err(ModerationError::InsufficientReputation { current: 0, required: 105 })
        ));
        assert!(store.participant(&alice).is_none());

        let id = submit_content_with_category(&mut store, &curator, b"hash", category, 3).unwrap();
        assert_eq!(get_content(&store, id).unwrap().category_id, Some(category));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ContentStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        assert_eq!(ContentStatus::Appealed.to_string(), "appealed");
    }

    #[test]
    fn test_pending_settlement_is_empty() {
        let content = Content::new(1, ParticipantId::from("alice"), vec![1, 2], None, 0);
        assert_eq!(content.settlement(), Settlement::default());
        assert_eq!(content.content_hash_hex(), "0102");
    }
}
