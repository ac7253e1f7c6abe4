mod ledger;
mod score;

pub(crate) use ledger::load_or_new;
pub use ledger::{
    require_reputation, score_participant, stake, update_reputation_from_history, Action, Participant,
};
pub use score::{ReputationRules, ScoreComponents, Settlement};
