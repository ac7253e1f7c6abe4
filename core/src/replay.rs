use crate::engine::ModerationEngine;
use crate::error::{ModerationError, TribunalResult};
use crate::scheduler::TickReport;
use crate::store::Store;
use crate::types::{CategoryId, ContentId, Decision, ParticipantId, TimeUnit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// One externally triggered transition, as recorded in a replay script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Stake {
        participant: ParticipantId,
        amount: u64,
    },
    CreateCategory {
        creator: ParticipantId,
        name: String,
        required_reputation: u64,
        vote_threshold: u64,
    },
    SubmitContent {
        submitter: ParticipantId,
        #[serde(with = "hex_bytes")]
        content_hash: Vec<u8>,
        #[serde(default)]
        category_id: Option<CategoryId>,
        now: TimeUnit,
    },
    Vote {
        voter: ParticipantId,
        content_id: ContentId,
        in_favor: bool,
        now: TimeUnit,
    },
    FinalizeModeration {
        content_id: ContentId,
        now: TimeUnit,
    },
    AppealDecision {
        appellant: ParticipantId,
        content_id: ContentId,
        reason: String,
        #[serde(default, with = "hex_bytes")]
        evidence_hash: Vec<u8>,
        now: TimeUnit,
    },
    VoteOnAppeal {
        voter: ParticipantId,
        content_id: ContentId,
        in_favor: bool,
        now: TimeUnit,
    },
    ResolveAppeal {
        content_id: ContentId,
        now: TimeUnit,
    },
    UpdateReputation {
        participant: ParticipantId,
    },
    Tick {
        now: TimeUnit,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Stake { .. } => "stake",
            Operation::CreateCategory { .. } => "create_category",
            Operation::SubmitContent { .. } => "submit_content",
            Operation::Vote { .. } => "vote",
            Operation::FinalizeModeration { .. } => "finalize_moderation",
            Operation::AppealDecision { .. } => "appeal_decision",
            Operation::VoteOnAppeal { .. } => "vote_on_appeal",
            Operation::ResolveAppeal { .. } => "resolve_appeal",
            Operation::UpdateReputation { .. } => "update_reputation",
            Operation::Tick { .. } => "tick",
        }
    }
}

/// Hashes travel as hex strings in scripts.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(&encoded).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationValue {
    Id(u64),
    Reputation(u64),
    Weight(u64),
    Decision(Decision),
    Confirmed(bool),
    Tick(TickReport),
}

impl fmt::Display for OperationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationValue::Id(id) => write!(f, "id {}", id),
            OperationValue::Reputation(r) => write!(f, "reputation {}", r),
            OperationValue::Weight(w) => write!(f, "weight {}", w),
            OperationValue::Decision(d) => write!(f, "{}", d),
            OperationValue::Confirmed(c) => write!(f, "{}", c),
            OperationValue::Tick(report) => write!(
                f,
                "finalized {}, resolved {}, recomputed {}",
                report.finalized.len(),
                report.resolved.len(),
                report.recomputed.len()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub index: usize,
    pub op: &'static str,
    pub result: Result<OperationValue, ModerationError>,
}

impl fmt::Display for ReplayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(value) => write!(f, "#{} {}: ok ({})", self.index, self.op, value),
            Err(e) => write!(f, "#{} {}: err ({})", self.index, self.op, e),
        }
    }
}

pub fn apply<S: Store>(
    engine: &mut ModerationEngine<S>,
    op: &Operation,
) -> Result<OperationValue, ModerationError> {
    match op {
        Operation::Stake {
            participant,
            amount,
        } => engine
            .stake(participant, *amount)
            .map(OperationValue::Reputation),
        Operation::CreateCategory {
            creator,
            name,
            required_reputation,
            vote_threshold,
        } => engine
            .create_category(creator, name, *required_reputation, *vote_threshold)
            .map(OperationValue::Id),
        Operation::SubmitContent {
            submitter,
            content_hash,
            category_id,
            now,
        } => {
            let submitted = match category_id {
                Some(category_id) => engine.submit_content_with_category(
                    submitter,
                    content_hash,
                    *category_id,
                    *now,
                ),
                None => engine.submit_content(submitter, content_hash, *now),
            };
            submitted.map(OperationValue::Id)
        }
        Operation::Vote {
            voter,
            content_id,
            in_favor,
            now,
        } => engine
            .vote(voter, *content_id, *in_favor, *now)
            .map(OperationValue::Weight),
        Operation::FinalizeModeration { content_id, now } => engine
            .finalize_moderation(*content_id, *now)
            .map(OperationValue::Decision),
        Operation::AppealDecision {
            appellant,
            content_id,
            reason,
            evidence_hash,
            now,
        } => engine
            .appeal_decision(appellant, *content_id, reason, evidence_hash, *now)
            .map(OperationValue::Confirmed),
        Operation::VoteOnAppeal {
            voter,
            content_id,
            in_favor,
            now,
        } => engine
            .vote_on_appeal(voter, *content_id, *in_favor, *now)
            .map(OperationValue::Weight),
        Operation::ResolveAppeal { content_id, now } => engine
            .resolve_appeal(*content_id, *now)
            .map(OperationValue::Decision),
        Operation::UpdateReputation { participant } => engine
            .update_reputation_from_history(participant)
            .map(OperationValue::Reputation),
        Operation::Tick { now } => engine.tick(*now).map(OperationValue::Tick),
    }
}

/// Applies every operation in order. Failed operations are recorded and
/// leave the state untouched; replay carries on with the next one.
pub fn replay<S: Store>(engine: &mut ModerationEngine<S>, ops: &[Operation]) -> Vec<ReplayOutcome> {
    ops.iter()
        .enumerate()
        .map(|(index, op)| {
            let result = apply(engine, op);
            debug!(index, op = op.name(), ok = result.is_ok(), "Replayed operation");
            ReplayOutcome {
                index,
                op: op.name(),
                result,
            }
        })
        .collect()
}

pub fn parse_script(json: &str) -> TribunalResult<Vec<Operation>> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_script<P: AsRef<Path>>(path: P) -> TribunalResult<Vec<Operation>> {
    let json = std::fs::read_to_string(path.as_ref())?;
    parse_script(&json)
}
