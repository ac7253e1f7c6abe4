use crate::config::ModerationConfig;
use crate::error::{ModerationError, ModerationResult};
use crate::reputation::require_reputation;
use crate::store::{EntityKind, Store};
use crate::types::{CategoryId, ParticipantId};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Named content bucket. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub creator: ParticipantId,
    /// Minimum reputation needed to submit into this category.
    pub required_reputation: u64,
    /// Advisory vote total; recorded at finalization but never blocks it.
    pub vote_threshold: u64,
}

impl Category {
    pub fn threshold_met(&self, votes_for: u64, votes_against: u64) -> bool {
        votes_for.saturating_add(votes_against) >= self.vote_threshold
    }
}

pub fn create_category<S: Store>(
    store: &mut S,
    config: &ModerationConfig,
    creator: &ParticipantId,
    name: &str,
    required_reputation: u64,
    vote_threshold: u64,
) -> ModerationResult<CategoryId> {
    require_reputation(
        store,
        creator,
        config.voting.category_creation_reputation_min,
    )?;

    if store.category_id_by_name(name).is_some() {
        return Err(ModerationError::DuplicateCategory(name.to_string()));
    }

    let id = store.allocate_id(EntityKind::Category);
    store.put_category(Category {
        id,
        name: name.to_string(),
        creator: creator.clone(),
        required_reputation,
        vote_threshold,
    });

    info!(
        category_id = id,
        name,
        creator = %creator,
        required_reputation,
        vote_threshold,
        "Category created"
    );

    Ok(id)
}

pub fn get_category<S: Store>(store: &S, id: CategoryId) -> Option<Category> {
    store.category(id)
}

pub fn category_by_name<S: Store>(store: &S, name: &str) -> Option<Category> {
    store
        .category_id_by_name(name)
        .and_then(|id| store.category(id))
}

pub fn list_categories<S: Store>(store: &S) -> Vec<Category> {
    store
        .category_ids()
        .into_iter()
        .filter_map(|id| store.category(id))
        .collect()
}
