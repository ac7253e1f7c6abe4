use crate::config::ModerationConfig;
use crate::error::{ModerationError, ModerationResult};
use crate::store::Store;
use crate::types::{ContentId, ParticipantId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::score::{ReputationRules, ScoreComponents};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Stake {
        amount: u64,
    },
    Submit {
        content_id: ContentId,
    },
    Vote {
        content_id: ContentId,
        in_favor: bool,
        weight: u64,
    },
    Appeal {
        content_id: ContentId,
    },
    AppealVote {
        content_id: ContentId,
        in_favor: bool,
        weight: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub stake: u64,
    pub reputation: u64,
    pub history: Vec<Action>,
    /// History length at the last recomputation.
    pub scored_actions: usize,
}

impl Participant {
    pub fn new(id: ParticipantId) -> Self {
        Self {
            id,
            stake: 0,
            reputation: 0,
            history: Vec::new(),
            scored_actions: 0,
        }
    }

    pub fn unscored_actions(&self) -> usize {
        self.history.len().saturating_sub(self.scored_actions)
    }

    pub fn is_due_for_recompute(&self, rules: &ReputationRules) -> bool {
        self.unscored_actions() >= rules.history_batch_size
    }
}

/// Loads a participant, or a blank record for ids the ledger has not seen.
pub(crate) fn load_or_new<S: Store>(store: &S, id: &ParticipantId) -> Participant {
    store
        .participant(id)
        .unwrap_or_else(|| Participant::new(id.clone()))
}

pub fn stake<S: Store>(
    store: &mut S,
    config: &ModerationConfig,
    participant_id: &ParticipantId,
    amount: u64,
) -> ModerationResult<u64> {
    let minimum = config.staking.min_stake_amount;
    if amount < minimum {
        return Err(ModerationError::InvalidStake { amount, minimum });
    }

    let rules = &config.reputation;
    let mut participant = load_or_new(store, participant_id);

    let old_stake = participant.stake;
    let new_stake = old_stake
        .checked_add(amount)
        .ok_or(ModerationError::StakeOverflow {
            stake: old_stake,
            amount,
        })?;
    let gained = rules
        .stake_reputation(new_stake)
        .saturating_sub(rules.stake_reputation(old_stake));

    participant.stake = new_stake;
    participant.reputation = participant
        .reputation
        .saturating_add(gained)
        .min(rules.max_reputation);
    participant.history.push(Action::Stake { amount });

    let reputation = participant.reputation;
    store.put_participant(participant);

    info!(
        participant = %participant_id,
        amount,
        stake = new_stake,
        reputation,
        "Stake recorded"
    );

    Ok(reputation)
}

/// Read-only guard. Unknown participants have zero reputation.
pub fn require_reputation<S: Store>(
    store: &S,
    participant_id: &ParticipantId,
    minimum: u64,
) -> ModerationResult<u64> {
    let current = store
        .participant(participant_id)
        .map(|p| p.reputation)
        .unwrap_or(0);

    if current < minimum {
        return Err(ModerationError::InsufficientReputation {
            current,
            required: minimum,
        });
    }

    Ok(current)
}

pub fn score_participant<S: Store>(
    store: &S,
    rules: &ReputationRules,
    participant_id: &ParticipantId,
) -> ModerationResult<ScoreComponents> {
    let participant = store
        .participant(participant_id)
        .ok_or_else(|| ModerationError::UnknownParticipant(participant_id.to_string()))?;

    Ok(rules.score_history(participant.stake, &participant.history, |content_id| {
        store
            .content(content_id)
            .map(|content| content.settlement())
            .unwrap_or_default()
    }))
}

pub fn update_reputation_from_history<S: Store>(
    store: &mut S,
    config: &ModerationConfig,
    participant_id: &ParticipantId,
) -> ModerationResult<u64> {
    let rules = &config.reputation;
    let components = score_participant(store, rules, participant_id)?;

    let mut participant = store
        .participant(participant_id)
        .ok_or_else(|| ModerationError::UnknownParticipant(participant_id.to_string()))?;

    let previous = participant.reputation;
    participant.reputation = components.total(rules);
    participant.scored_actions = participant.history.len();

    let reputation = participant.reputation;
    store.put_participant(participant);

    debug!(
        participant = %participant_id,
        previous,
        reputation,
        settled_votes = components.settled_votes,
        correct_votes = components.correct_votes,
        "Reputation recomputed from history"
    );

    Ok(reputation)
}
