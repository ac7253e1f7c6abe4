use crate::config::ModerationConfig;
use crate::content::{require_content, ContentStatus};
use crate::error::{ModerationError, ModerationResult};
use crate::reputation::{load_or_new, require_reputation, Action};
use crate::store::Store;
use crate::types::{window_elapsed, ContentId, Decision, ParticipantId, TimeUnit};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Checks a ballot against the reputation gate and the round's voter set,
/// returning the voter's weight.
pub(crate) fn ballot_weight<S: Store>(
    store: &S,
    config: &ModerationConfig,
    voter: &ParticipantId,
    voters: &BTreeSet<ParticipantId>,
) -> ModerationResult<u64> {
    let weight = require_reputation(store, voter, config.voting.vote_reputation_min)?;

    if voters.contains(voter) {
        return Err(ModerationError::AlreadyVoted(voter.to_string()));
    }

    Ok(weight)
}

pub(crate) fn add_weight(votes_for: &mut u64, votes_against: &mut u64, weight: u64, in_favor: bool) {
    let tally = if in_favor { votes_for } else { votes_against };
    *tally = tally.saturating_add(weight);
}

/// Casts a reputation-weighted vote on pending content. Returns the weight
/// that was added.
pub fn vote<S: Store>(
    store: &mut S,
    config: &ModerationConfig,
    voter: &ParticipantId,
    content_id: ContentId,
    in_favor: bool,
    now: TimeUnit,
) -> ModerationResult<u64> {
    let mut content = require_content(store, content_id)?;

    if content.status != ContentStatus::Pending {
        return Err(ModerationError::InvalidState(format!(
            "content {} is {}, votes require pending",
            content_id, content.status
        )));
    }

    let window = config.voting.voting_window;
    if window_elapsed(content.submitted_at, window, now) {
        return Err(ModerationError::InvalidState(format!(
            "voting on content {} closed at {}",
            content_id,
            content.voting_closes_at(window)
        )));
    }

    let weight = ballot_weight(store, config, voter, &content.voters)?;
    let mut participant = load_or_new(store, voter);

    add_weight(
        &mut content.votes_for,
        &mut content.votes_against,
        weight,
        in_favor,
    );
    content.voters.insert(voter.clone());
    participant.history.push(Action::Vote {
        content_id,
        in_favor,
        weight,
    });

    debug!(
        content_id,
        voter = %voter,
        in_favor,
        weight,
        votes_for = content.votes_for,
        votes_against = content.votes_against,
        "Vote cast"
    );

    store.put_content(content);
    store.put_participant(participant);

    Ok(weight)
}

/// Closes the voting round once its window has elapsed. Ties resolve to
/// `Rejected`. A category's vote threshold is recorded but never blocks.
pub fn finalize_moderation<S: Store>(
    store: &mut S,
    config: &ModerationConfig,
    content_id: ContentId,
    now: TimeUnit,
) -> ModerationResult<Decision> {
    let mut content = require_content(store, content_id)?;

    if content.status != ContentStatus::Pending {
        return Err(ModerationError::InvalidState(format!(
            "content {} is {}, finalization requires pending",
            content_id, content.status
        )));
    }

    let window = config.voting.voting_window;
    if !window_elapsed(content.submitted_at, window, now) {
        return Err(ModerationError::VotingWindowOpen {
            closes_at: content.voting_closes_at(window),
        });
    }

    let decision = Decision::from_tally(content.votes_for, content.votes_against);

    let threshold_met = content
        .category_id
        .and_then(|id| store.category(id))
        .map(|category| category.threshold_met(content.votes_for, content.votes_against));

    if threshold_met == Some(false) {
        warn!(
            content_id,
            total_votes = content.total_votes(),
            "Category vote threshold not met, resolving by simple majority"
        );
    }

    content.status = decision.into();
    content.outcome = Some(decision);
    content.finalized_at = Some(now);
    content.threshold_met = threshold_met;

    info!(
        content_id,
        %decision,
        votes_for = content.votes_for,
        votes_against = content.votes_against,
        voters = content.voters.len(),
        "Moderation finalized"
    );

    store.put_content(content);

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appeal::appeal_decision;
    use crate::category::create_category;
    use crate::content::{get_content, submit_content, submit_content_with_category};
    use crate::reputation::stake;
    use crate::store::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        config: ModerationConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryStore::new(),
                config: ModerationConfig::default(),
            }
        }

        fn staked(&mut self, name: &str, amount: u64) -> ParticipantId {
            let id = ParticipantId::from(name);
            stake(&mut self.store, &self.config, &id, amount).unwrap();
            id
        }

        fn submit(&mut self, now: TimeUnit) -> ContentId {
            submit_content(&mut self.store, &ParticipantId::from("author"), b"hash", now).unwrap()
        }

        fn window(&self) -> u64 {
            self.config.voting.voting_window
        }
    }

    #[test]
    fn test_vote_weighted_by_reputation() {
        let mut fx = Fixture::new();
        let alice = fx.staked("alice", 1000);
        let bob = fx.staked("bob", 5000);
        let id = fx.submit(0);

        assert_eq!(vote(&mut fx.store, &fx.config, &alice, id, true, 1), Ok(110));
        assert_eq!(vote(&mut fx.store, &fx.config, &bob, id, false, 1), Ok(150));

        let content = get_content(&fx.store, id).unwrap();
        assert_eq!(content.votes_for, 110);
        assert_eq!(content.votes_against, 150);
        assert_eq!(content.voters.len(), 2);

        let history = fx.store.participant(&alice).unwrap().history;
        assert!(history.contains(&Action::Vote {
            content_id: id,
            in_favor: true,
            weight: 110
        }));
    }

    #[test]
    fn test_vote_zero_reputation() {
        let mut fx = Fixture::new();
        let id = fx.submit(0);

        let result = vote(&mut fx.store, &fx.config, &ParticipantId::from("carol"), id, true, 1);

        assert!(matches!(
            result,
            Err(ModerationError::InsufficientReputation { current: 0, .. })
        ));
        assert_eq!(get_content(&fx.store, id).unwrap().total_votes(), 0);
    }

    #[test]
    fn test_double_vote_rejected() {
        let mut fx = Fixture::new();
        let alice = fx.staked("alice", 1000);
        let id = fx.submit(0);

        vote(&mut fx.store, &fx.config, &alice, id, true, 1).unwrap();
        let result = vote(&mut fx.store, &fx.config, &alice, id, false, 2);

        assert_eq!(result, Err(ModerationError::AlreadyVoted("alice".to_string())));
        let content = get_content(&fx.store, id).unwrap();
        assert_eq!(content.votes_for, 110);
        assert_eq!(content.votes_against, 0);
    }

    #[test]
    fn test_vote_unknown_content() {
        let mut fx = Fixture::new();
        let alice = fx.staked("alice", 1000);

        let result = vote(&mut fx.store, &fx.config, &alice, 42, true, 0);

        assert_eq!(result, Err(ModerationError::UnknownContent(42)));
    }

    #[test]
    fn test_vote_after_window() {
        let mut fx = Fixture::new();
        let alice = fx.staked("alice", 1000);
        let id = fx.submit(10);
        let closes = 10 + fx.window();

        let result = vote(&mut fx.store, &fx.config, &alice, id, true, closes);

        assert!(matches!(result, Err(ModerationError::InvalidState(_))));
        assert!(vote(&mut fx.store, &fx.config, &alice, id, true, closes - 1).is_ok());
    }

    #[test]
    fn test_vote_requires_pending() {
        let mut fx = Fixture::new();
        let alice = fx.staked("alice", 1000);
        let author = ParticipantId::from("author");
        let id = fx.submit(0);
        let window = fx.window();

        finalize_moderation(&mut fx.store, &fx.config, id, window).unwrap();

        let result = vote(&mut fx.store, &fx.config, &alice, id, true, 1);
        assert!(matches!(result, Err(ModerationError::InvalidState(_))));

        appeal_decision(&mut fx.store, &author, id, "context", b"", window).unwrap();

        let result = vote(&mut fx.store, &fx.config, &alice, id, true, 1);
        assert!(matches!(result, Err(ModerationError::InvalidState(_))));

        let content = get_content(&fx.store, id).unwrap();
        assert_eq!(content.status, ContentStatus::Appealed);
        assert_eq!(content.total_votes(), 0);
        assert!(content.voters.is_empty());
    }

    #[test]
    fn test_finalize_before_window() {
        let mut fx = Fixture::new();
        let id = fx.submit(10);
        let closes = 10 + fx.window();

        let result = finalize_moderation(&mut fx.store, &fx.config, id, closes - 1);

        assert_eq!(result, Err(ModerationError::VotingWindowOpen { closes_at: closes }));
        assert_eq!(get_content(&fx.store, id).unwrap().status, ContentStatus::Pending);
    }

    #[test]
    fn test_finalize_empty_tally_rejects() {
        let mut fx = Fixture::new();
        let id = fx.submit(0);
        let now = fx.window();

        let decision = finalize_moderation(&mut fx.store, &fx.config, id, now).unwrap();

        assert_eq!(decision, Decision::Rejected);
        let content = get_content(&fx.store, id).unwrap();
        assert_eq!(content.status, ContentStatus::Rejected);
        assert_eq!(content.outcome, Some(Decision::Rejected));
        assert_eq!(content.finalized_at, Some(now));
        assert_eq!(content.threshold_met, None);
    }

    #[test]
    fn test_finalize_majority_approves() {
        let mut fx = Fixture::new();
        let alice = fx.staked("alice", 5000);
        let bob = fx.staked("bob", 1000);
        let id = fx.submit(0);

        vote(&mut fx.store, &fx.config, &alice, id, true, 1).unwrap();
        vote(&mut fx.store, &fx.config, &bob, id, false, 1).unwrap();

        let now = fx.window();
        let decision = finalize_moderation(&mut fx.store, &fx.config, id, now).unwrap();

        assert_eq!(decision, Decision::Approved);
    }

    #[test]
    fn test_finalize_tie_rejects() {
        let mut fx = Fixture::new();
        let alice = fx.staked("alice", 1000);
        let bob = fx.staked("bob", 1000);
        let id = fx.submit(0);

        vote(&mut fx.store, &fx.config, &alice, id, true, 1).unwrap();
        vote(&mut fx.store, &fx.config, &bob, id, false, 1).unwrap();

        let now = fx.window();
        assert_eq!(
            finalize_moderation(&mut fx.store, &fx.config, id, now),
            Ok(Decision::Rejected)
        );
    }

    #[test]
    fn test_finalize_twice() {
        let mut fx = Fixture::new();
        let id = fx.submit(0);
        let now = fx.window();

        finalize_moderation(&mut fx.store, &fx.config, id, now).unwrap();
        let result = finalize_moderation(&mut fx.store, &fx.config, id, now + 1);

        assert!(matches!(result, Err(ModerationError::InvalidState(_))));
    }

    #[test]
    fn test_threshold_is_advisory() {
        let mut fx = Fixture::new();
        let curator = fx.staked("curator", 1000);
        let category =
            create_category(&mut fx.store, &fx.config, &curator, "news", 0, 10_000).unwrap();
        let id = submit_content_with_category(&mut fx.store, &curator, b"hash", category, 0)
            .unwrap();

        vote(&mut fx.store, &fx.config, &curator, id, true, 1).unwrap();

        let now = fx.window();
        let decision = finalize_moderation(&mut fx.store, &fx.config, id, now).unwrap();

        assert_eq!(decision, Decision::Approved);
        assert_eq!(get_content(&fx.store, id).unwrap().threshold_met, Some(false));
    }
}
