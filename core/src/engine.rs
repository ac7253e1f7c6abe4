use crate::appeal;
use crate::category::{self, Category};
use crate::config::ModerationConfig;
use crate::content::{self, Content};
use crate::error::{ModerationResult, TribunalResult};
use crate::reputation::{self, Participant, ScoreComponents};
use crate::scheduler::{self, TickReport};
use crate::store::{MemoryStore, Store};
use crate::types::{CategoryId, ContentId, Decision, ParticipantId, TimeUnit};
use crate::voting;

/// Full call surface of the moderation core over an injected store.
///
/// Each method is one atomic transition: it either succeeds and writes, or
/// fails without touching the store.
pub struct ModerationEngine<S: Store = MemoryStore> {
    config: ModerationConfig,
    store: S,
}

impl ModerationEngine<MemoryStore> {
    pub fn in_memory(config: ModerationConfig) -> TribunalResult<Self> {
        Self::new(config, MemoryStore::new())
    }
}

impl<S: Store> ModerationEngine<S> {
    pub fn new(config: ModerationConfig, store: S) -> TribunalResult<Self> {
        config.validate()?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn stake(&mut self, participant: &ParticipantId, amount: u64) -> ModerationResult<u64> {
        reputation::stake(&mut self.store, &self.config, participant, amount)
    }

    pub fn require_reputation(
        &self,
        participant: &ParticipantId,
        minimum: u64,
    ) -> ModerationResult<u64> {
        reputation::require_reputation(&self.store, participant, minimum)
    }

    pub fn update_reputation_from_history(
        &mut self,
        participant: &ParticipantId,
    ) -> ModerationResult<u64> {
        reputation::update_reputation_from_history(&mut self.store, &self.config, participant)
    }

    pub fn score(&self, participant: &ParticipantId) -> ModerationResult<ScoreComponents> {
        reputation::score_participant(&self.store, &self.config.reputation, participant)
    }

    pub fn create_category(
        &mut self,
        creator: &ParticipantId,
        name: &str,
        required_reputation: u64,
        vote_threshold: u64,
    ) -> ModerationResult<CategoryId> {
        category::create_category(
            &mut self.store,
            &self.config,
            creator,
            name,
            required_reputation,
            vote_threshold,
        )
    }

    pub fn submit_content(
        &mut self,
        submitter: &ParticipantId,
        content_hash: &[u8],
        now: TimeUnit,
    ) -> ModerationResult<ContentId> {
        content::submit_content(&mut self.store, submitter, content_hash, now)
    }

    pub fn submit_content_with_category(
        &mut self,
        submitter: &ParticipantId,
        content_hash: &[u8],
        category_id: CategoryId,
        now: TimeUnit,
    ) -> ModerationResult<ContentId> {
        content::submit_content_with_category(
            &mut self.store,
            submitter,
            content_hash,
            category_id,
            now,
        )
    }

    pub fn vote(
        &mut self,
        voter: &ParticipantId,
        content_id: ContentId,
        in_favor: bool,
        now: TimeUnit,
    ) -> ModerationResult<u64> {
        voting::vote(&mut self.store, &self.config, voter, content_id, in_favor, now)
    }

    pub fn finalize_moderation(
        &mut self,
        content_id: ContentId,
        now: TimeUnit,
    ) -> ModerationResult<Decision> {
        voting::finalize_moderation(&mut self.store, &self.config, content_id, now)
    }

    pub fn appeal_decision(
        &mut self,
        appellant: &ParticipantId,
        content_id: ContentId,
        reason: &str,
        evidence_hash: &[u8],
        now: TimeUnit,
    ) -> ModerationResult<bool> {
        appeal::appeal_decision(
            &mut self.store,
            appellant,
            content_id,
            reason,
            evidence_hash,
            now,
        )
    }

    pub fn vote_on_appeal(
        &mut self,
        voter: &ParticipantId,
        content_id: ContentId,
        in_favor: bool,
        now: TimeUnit,
    ) -> ModerationResult<u64> {
        appeal::vote_on_appeal(&mut self.store, &self.config, voter, content_id, in_favor, now)
    }

    pub fn resolve_appeal(
        &mut self,
        content_id: ContentId,
        now: TimeUnit,
    ) -> ModerationResult<Decision> {
        appeal::resolve_appeal(&mut self.store, &self.config, content_id, now)
    }

    pub fn tick(&mut self, now: TimeUnit) -> ModerationResult<TickReport> {
        scheduler::tick(&mut self.store, &self.config, now)
    }

    pub fn get_content(&self, id: ContentId) -> Option<Content> {
        content::get_content(&self.store, id)
    }

    pub fn get_category(&self, id: CategoryId) -> Option<Category> {
        category::get_category(&self.store, id)
    }

    pub fn get_participant(&self, id: &ParticipantId) -> Option<Participant> {
        self.store.participant(id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<Category> {
        category::category_by_name(&self.store, name)
    }

    pub fn list_categories(&self) -> Vec<Category> {
        category::list_categories(&self.store)
    }

    pub fn pending_content(&self) -> Vec<Content> {
        content::pending_content(&self.store)
    }
}

impl ModerationEngine<MemoryStore> {
    pub fn state_digest(&self) -> TribunalResult<String> {
        self.store.state_digest()
    }
}
