use crate::types::{ContentId, Decision};
use serde::{Deserialize, Serialize};

use super::ledger::Action;

/// Scoring parameters for converting stake and history into reputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationRules {
    #[serde(default = "default_initial_reputation")]
    pub initial_reputation: u64,
    #[serde(default = "default_stake_per_reputation")]
    pub stake_per_reputation: u64,

    #[serde(default = "default_correct_vote_reward")]
    pub correct_vote_reward: u64,
    #[serde(default = "default_incorrect_vote_penalty")]
    pub incorrect_vote_penalty: u64,
    #[serde(default = "default_submission_reward")]
    pub approved_submission_reward: u64,
    #[serde(default = "default_submission_penalty")]
    pub rejected_submission_penalty: u64,

    #[serde(default = "default_max_reputation")]
    pub max_reputation: u64,
    #[serde(default = "default_history_batch_size")]
    pub history_batch_size: usize,
}

fn default_initial_reputation() -> u64 {
    100
}
fn default_stake_per_reputation() -> u64 {
    100
}
fn default_correct_vote_reward() -> u64 {
    5
}
fn default_incorrect_vote_penalty() -> u64 {
    3
}
fn default_submission_reward() -> u64 {
    2
}
fn default_submission_penalty() -> u64 {
    2
}
fn default_max_reputation() -> u64 {
    1_000_000
}
fn default_history_batch_size() -> usize {
    10
}

impl Default for ReputationRules {
    fn default() -> Self {
        Self {
            initial_reputation: default_initial_reputation(),
            stake_per_reputation: default_stake_per_reputation(),
            correct_vote_reward: default_correct_vote_reward(),
            incorrect_vote_penalty: default_incorrect_vote_penalty(),
            approved_submission_reward: default_submission_reward(),
            rejected_submission_penalty: default_submission_penalty(),
            max_reputation: default_max_reputation(),
            history_batch_size: default_history_batch_size(),
        }
    }
}

/// How a content item ended up, as far as scoring is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settlement {
    /// Effective decision once the first round (and any appeal) has settled.
    pub outcome: Option<Decision>,
    /// `Some(true)` if a resolved appeal overturned the first-round decision.
    pub appeal_overturned: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreComponents {
    pub base: u64,
    pub rewards: u64,
    pub penalties: u64,
    pub settled_votes: u64,
    pub correct_votes: u64,
}

impl ScoreComponents {
    pub fn total(&self, rules: &ReputationRules) -> u64 {
        self.base
            .saturating_add(self.rewards)
            .saturating_sub(self.penalties)
            .min(rules.max_reputation)
    }

    pub fn accuracy_bps(&self) -> u64 {
        if self.settled_votes == 0 {
            return 0;
        }
        self.correct_votes * 10_000 / self.settled_votes
    }
}

impl ReputationRules {
    /// Reputation backed by stake alone: a one-off baseline once anything is
    /// staked, plus one point per full `stake_per_reputation` units.
    pub fn stake_reputation(&self, stake: u64) -> u64 {
        if stake == 0 {
            return 0;
        }
        let per_unit = stake / self.stake_per_reputation.max(1);
        self.initial_reputation
            .saturating_add(per_unit)
            .min(self.max_reputation)
    }

    /// Scores a full action history. Actions whose content has not settled
    /// yet contribute nothing, so the result only moves as outcomes land.
    pub fn score_history<F>(&self, stake: u64, history: &[Action], mut settlement: F) -> ScoreComponents
    where
        F: FnMut(ContentId) -> Settlement,
    {
        let mut components = ScoreComponents {
            base: self.stake_reputation(stake),
            ..ScoreComponents::default()
        };

        for action in history {
            match action {
                Action::Stake { .. } | Action::Appeal { .. } => {}
                Action::Submit { content_id } => match settlement(*content_id).outcome {
                    Some(Decision::Approved) => {
                        components.rewards = components
                            .rewards
                            .saturating_add(self.approved_submission_reward);
                    }
                    Some(Decision::Rejected) => {
                        components.penalties = components
                            .penalties
                            .saturating_add(self.rejected_submission_penalty);
                    }
                    None => {}
                },
                Action::Vote {
                    content_id,
                    in_favor,
                    ..
                } => {
                    if let Some(outcome) = settlement(*content_id).outcome {
                        let matched = (outcome == Decision::Approved) == *in_favor;
                        self.score_vote(&mut components, matched);
                    }
                }
                Action::AppealVote {
                    content_id,
                    in_favor,
                    ..
                } => {
                    if let Some(overturned) = settlement(*content_id).appeal_overturned {
                        self.score_vote(&mut components, overturned == *in_favor);
                    }
                }
            }
        }

        components
    }

    fn score_vote(&self, components: &mut ScoreComponents, matched: bool) {
        components.settled_votes += 1;
        if matched {
            components.correct_votes += 1;
            components.rewards = components.rewards.saturating_add(self.correct_vote_reward);
        } else {
            components.penalties = components
                .penalties
                .saturating_add(self.incorrect_vote_penalty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled(outcome: Decision) -> Settlement {
        Settlement {
            outcome: Some(outcome),
            appeal_overturned: None,
        }
    }

    #[test]
    fn test_stake_reputation() {
        let rules = ReputationRules::default();

        assert_eq!(rules.stake_reputation(0), 0);
        assert_eq!(rules.stake_reputation(1000), 110);
        assert_eq!(rules.stake_reputation(1099), 110);
        assert_eq!(rules.stake_reputation(5000), 150);
    }

    #[test]
    fn test_stake_reputation_clamped() {
        let rules = ReputationRules {
            max_reputation: 120,
            ..ReputationRules::default()
        };

        assert_eq!(rules.stake_reputation(u64::MAX), 120);
    }

    #[test]
    fn test_votes_scored_against_outcome() {
        let rules = ReputationRules::default();
        let history = vec![
            Action::Stake { amount: 1000 },
            Action::Vote {
                content_id: 1,
                in_favor: true,
                weight: 110,
            },
            Action::Vote {
                content_id: 2,
                in_favor: true,
                weight: 110,
            },
            Action::Vote {
                content_id: 3,
                in_favor: false,
                weight: 110,
            },
        ];

        let components = rules.score_history(1000, &history, |id| match id {
            1 => settled(Decision::Approved),
            2 => settled(Decision::Rejected),
            _ => Settlement::default(),
        });

        assert_eq!(components.base, 110);
        assert_eq!(components.settled_votes, 2);
        assert_eq!(components.correct_votes, 1);
        assert_eq!(components.total(&rules), 110 + 5 - 3);
        assert_eq!(components.accuracy_bps(), 5000);
    }

    #[test]
    fn test_submissions_scored() {
        let rules = ReputationRules::default();
        let history = vec![
            Action::Submit { content_id: 1 },
            Action::Submit { content_id: 2 },
            Action::Submit { content_id: 3 },
        ];

        let components = rules.score_history(0, &history, |id| match id {
            1 | 2 => settled(Decision::Approved),
            _ => settled(Decision::Rejected),
        });

        assert_eq!(components.rewards, 4);
        assert_eq!(components.penalties, 2);
        assert_eq!(components.total(&rules), 2);
    }

    #[test]
    fn test_penalties_floor_at_zero() {
        let rules = ReputationRules::default();
        let history = vec![Action::Submit { content_id: 1 }];

        let components = rules.score_history(0, &history, |_| settled(Decision::Rejected));

        assert_eq!(components.total(&rules), 0);
    }

    #[test]
    fn test_appeal_votes_scored_on_reversal() {
        let rules = ReputationRules::default();
        let history = vec![
            Action::AppealVote {
                content_id: 1,
                in_favor: true,
                weight: 50,
            },
            Action::AppealVote {
                content_id: 2,
                in_favor: true,
                weight: 50,
            },
        ];

        let components = rules.score_history(0, &history, |id| Settlement {
            outcome: Some(Decision::Approved),
            appeal_overturned: Some(id == 1),
        });

        assert_eq!(components.correct_votes, 1);
        assert_eq!(components.settled_votes, 2);
    }
}
