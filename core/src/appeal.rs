use crate::config::ModerationConfig;
use crate::content::{require_content, ContentStatus};
use crate::error::{ModerationError, ModerationResult};
use crate::reputation::{load_or_new, Action};
use crate::store::Store;
use crate::types::{window_closes_at, window_elapsed, ContentId, Decision, ParticipantId, TimeUnit};
use crate::voting::{add_weight, ballot_weight};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppealOutcome {
    Upheld,
    Overturned,
}

impl AppealOutcome {
    pub fn is_overturned(&self) -> bool {
        matches!(self, AppealOutcome::Overturned)
    }
}

/// Second adjudication round on finalized content. `appeal_votes_for`
/// counts weight in favour of overturning the first-round decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appeal {
    pub content_id: ContentId,
    pub appellant: ParticipantId,
    pub reason: String,
    pub evidence_hash: Vec<u8>,
    pub appeal_votes_for: u64,
    pub appeal_votes_against: u64,
    pub appeal_voters: BTreeSet<ParticipantId>,
    pub opened_at: TimeUnit,
    pub resolved: bool,
    pub resolved_at: Option<TimeUnit>,
    pub outcome: Option<AppealOutcome>,
}

impl Appeal {
    pub fn new(
        content_id: ContentId,
        appellant: ParticipantId,
        reason: String,
        evidence_hash: Vec<u8>,
        opened_at: TimeUnit,
    ) -> Self {
        Self {
            content_id,
            appellant,
            reason,
            evidence_hash,
            appeal_votes_for: 0,
            appeal_votes_against: 0,
            appeal_voters: BTreeSet::new(),
            opened_at,
            resolved: false,
            resolved_at: None,
            outcome: None,
        }
    }

    pub fn closes_at(&self, appeal_window: u64) -> TimeUnit {
        window_closes_at(self.opened_at, appeal_window)
    }

    /// Overturning needs a strict majority; a tie upholds the decision.
    pub fn tally(&self) -> AppealOutcome {
        if self.appeal_votes_for > self.appeal_votes_against {
            AppealOutcome::Overturned
        } else {
            AppealOutcome::Upheld
        }
    }
}

pub fn appeal_decision<S: Store>(
    store: &mut S,
    appellant: &ParticipantId,
    content_id: ContentId,
    reason: &str,
    evidence_hash: &[u8],
    now: TimeUnit,
) -> ModerationResult<bool> {
    let mut content = require_content(store, content_id)?;

    if content.has_open_appeal() {
        return Err(ModerationError::AppealAlreadyOpen(content_id));
    }

    if !content.status.is_appealable() {
        return Err(ModerationError::InvalidState(format!(
            "content {} is {}, appeals require approved or rejected",
            content_id, content.status
        )));
    }

    if &content.submitter != appellant {
        return Err(ModerationError::NotAuthorized(format!(
            "only the submitter of content {} may appeal",
            content_id
        )));
    }

    let mut participant = load_or_new(store, appellant);

    content.appeal = Some(Appeal::new(
        content_id,
        appellant.clone(),
        reason.to_string(),
        evidence_hash.to_vec(),
        now,
    ));
    content.status = ContentStatus::Appealed;
    participant.history.push(Action::Appeal { content_id });

    info!(
        content_id,
        appellant = %appellant,
        opened_at = now,
        "Appeal opened"
    );

    store.put_content(content);
    store.put_participant(participant);

    Ok(true)
}

pub fn vote_on_appeal<S: Store>(
    store: &mut S,
    config: &ModerationConfig,
    voter: &ParticipantId,
    content_id: ContentId,
    in_favor: bool,
    now: TimeUnit,
) -> ModerationResult<u64> {
    let mut content = require_content(store, content_id)?;

    if content.status != ContentStatus::Appealed {
        return Err(ModerationError::InvalidState(format!(
            "content {} is {}, appeal votes require appealed",
            content_id, content.status
        )));
    }

    let window = config.voting.appeal_window;
    let appeal = content
        .appeal
        .as_mut()
        .ok_or_else(|| ModerationError::InvalidState(format!("content {} has no appeal", content_id)))?;

    if window_elapsed(appeal.opened_at, window, now) {
        return Err(ModerationError::InvalidState(format!(
            "appeal on content {} closed at {}",
            content_id,
            appeal.closes_at(window)
        )));
    }

    let weight = ballot_weight(store, config, voter, &appeal.appeal_voters)?;
    let mut participant = load_or_new(store, voter);

    add_weight(
        &mut appeal.appeal_votes_for,
        &mut appeal.appeal_votes_against,
        weight,
        in_favor,
    );
    appeal.appeal_voters.insert(voter.clone());
    participant.history.push(Action::AppealVote {
        content_id,
        in_favor,
        weight,
    });

    debug!(
        content_id,
        voter = %voter,
        in_favor,
        weight,
        appeal_votes_for = appeal.appeal_votes_for,
        appeal_votes_against = appeal.appeal_votes_against,
        "Appeal vote cast"
    );

    store.put_content(content);
    store.put_participant(participant);

    Ok(weight)
}

/// Closes the appeal round. Returns the effective decision afterwards.
pub fn resolve_appeal<S: Store>(
    store: &mut S,
    config: &ModerationConfig,
    content_id: ContentId,
    now: TimeUnit,
) -> ModerationResult<Decision> {
    let mut content = require_content(store, content_id)?;

    if content.status != ContentStatus::Appealed {
        return Err(ModerationError::InvalidState(format!(
            "content {} is {}, resolution requires appealed",
            content_id, content.status
        )));
    }

    let first_round = content.outcome.ok_or_else(|| {
        ModerationError::InvalidState(format!("content {} has no first-round outcome", content_id))
    })?;

    let window = config.voting.appeal_window;
    let appeal = content
        .appeal
        .as_mut()
        .ok_or_else(|| ModerationError::InvalidState(format!("content {} has no appeal", content_id)))?;

    if !window_elapsed(appeal.opened_at, window, now) {
        return Err(ModerationError::VotingWindowOpen {
            closes_at: appeal.closes_at(window),
        });
    }

    let outcome = appeal.tally();
    let decision = match outcome {
        AppealOutcome::Overturned => first_round.reversed(),
        AppealOutcome::Upheld => first_round,
    };

    appeal.resolved = true;
    appeal.resolved_at = Some(now);
    appeal.outcome = Some(outcome);

    info!(
        content_id,
        ?outcome,
        %decision,
        appeal_votes_for = appeal.appeal_votes_for,
        appeal_votes_against = appeal.appeal_votes_against,
        "Appeal resolved"
    );

    content.outcome = Some(decision);
    content.status = ContentStatus::Resolved;
    store.put_content(content);

    Ok(decision)
}
