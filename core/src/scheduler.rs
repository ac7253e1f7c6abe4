use crate::appeal::resolve_appeal;
use crate::config::ModerationConfig;
use crate::content::ContentStatus;
use crate::error::ModerationResult;
use crate::reputation::update_reputation_from_history;
use crate::store::Store;
use crate::types::{window_elapsed, ContentId, Decision, ParticipantId, TimeUnit};
use crate::voting::finalize_moderation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub now: TimeUnit,
    pub finalized: Vec<(ContentId, Decision)>,
    pub resolved: Vec<(ContentId, Decision)>,
    pub recomputed: Vec<(ParticipantId, u64)>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty() && self.resolved.is_empty() && self.recomputed.is_empty()
    }
}

/// Content ids whose voting or appeal window has elapsed at `now`.
pub fn due_content<S: Store>(
    store: &S,
    config: &ModerationConfig,
    now: TimeUnit,
) -> (Vec<ContentId>, Vec<ContentId>) {
    let mut to_finalize = Vec::new();
    let mut to_resolve = Vec::new();

    for id in store.content_ids() {
        let Some(content) = store.content(id) else {
            continue;
        };

        match content.status {
            ContentStatus::Pending
                if window_elapsed(content.submitted_at, config.voting.voting_window, now) =>
            {
                to_finalize.push(id);
            }
            ContentStatus::Appealed => {
                let elapsed = content.appeal.as_ref().is_some_and(|appeal| {
                    window_elapsed(appeal.opened_at, config.voting.appeal_window, now)
                });
                if elapsed {
                    to_resolve.push(id);
                }
            }
            _ => {}
        }
    }

    (to_finalize, to_resolve)
}

/// Drives every window that has elapsed at `now`, in content-id order, then
/// recomputes reputation in participant-id order for everyone with a full
/// batch of unscored actions and everyone whose content or ballots settled
/// during this tick.
pub fn tick<S: Store>(
    store: &mut S,
    config: &ModerationConfig,
    now: TimeUnit,
) -> ModerationResult<TickReport> {
    let mut report = TickReport {
        now,
        ..TickReport::default()
    };

    let (to_finalize, to_resolve) = due_content(store, config, now);
    let mut settled: BTreeSet<ParticipantId> = BTreeSet::new();

    for id in to_finalize {
        let decision = finalize_moderation(store, config, id, now)?;
        settled.extend(involved_participants(store, id));
        report.finalized.push((id, decision));
    }

    for id in to_resolve {
        let decision = resolve_appeal(store, config, id, now)?;
        settled.extend(involved_participants(store, id));
        report.resolved.push((id, decision));
    }

    let due: Vec<ParticipantId> = store
        .participant_ids()
        .into_iter()
        .filter(|id| {
            settled.contains(id)
                || store
                    .participant(id)
                    .is_some_and(|p| p.is_due_for_recompute(&config.reputation))
        })
        .collect();

    for id in due {
        let reputation = update_reputation_from_history(store, config, &id)?;
        report.recomputed.push((id, reputation));
    }

    if !report.is_empty() {
        info!(
            now,
            finalized = report.finalized.len(),
            resolved = report.resolved.len(),
            recomputed = report.recomputed.len(),
            "Tick processed"
        );
    }

    Ok(report)
}

/// Submitter and every first-round and appeal voter of a content item.
fn involved_participants<S: Store>(store: &S, content_id: ContentId) -> Vec<ParticipantId> {
    let Some(content) = store.content(content_id) else {
        return Vec::new();
    };

    let mut involved = vec![content.submitter.clone()];
    involved.extend(content.voters.iter().cloned());
    if let Some(appeal) = &content.appeal {
        involved.extend(appeal.appeal_voters.iter().cloned());
    }
    involved
}
