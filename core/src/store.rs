use crate::category::Category;
use crate::content::Content;
use crate::error::{Error, TribunalResult};
use crate::reputation::Participant;
use crate::types::{CategoryId, ContentId, ParticipantId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Entity kinds that are keyed by a sequential id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Content,
    Category,
}

/// Key-value access the moderation core runs against.
///
/// Reads hand out owned copies; operations check everything first and only
/// then write records back, so a failed call never leaves a partial update.
pub trait Store {
    fn participant(&self, id: &ParticipantId) -> Option<Participant>;
    fn put_participant(&mut self, participant: Participant);
    fn participant_ids(&self) -> Vec<ParticipantId>;

    fn content(&self, id: ContentId) -> Option<Content>;
    fn put_content(&mut self, content: Content);
    fn content_ids(&self) -> Vec<ContentId>;

    fn category(&self, id: CategoryId) -> Option<Category>;
    fn category_id_by_name(&self, name: &str) -> Option<CategoryId>;
    fn put_category(&mut self, category: Category);
    fn category_ids(&self) -> Vec<CategoryId>;

    /// Returns the next id for `kind`, starting at 1. Callers allocate only
    /// once validation has passed and insert the record in the same call.
    fn allocate_id(&mut self, kind: EntityKind) -> u64;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    participants: BTreeMap<ParticipantId, Participant>,
    contents: BTreeMap<ContentId, Content>,
    categories: BTreeMap<CategoryId, Category>,
    category_names: BTreeMap<String, CategoryId>,
    last_content_id: u64,
    last_category_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_count(&self) -> usize {
        self.contents.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn encode(&self) -> TribunalResult<Vec<u8>> {
        postcard::to_allocvec(self)
            .map_err(|e| Error::Storage(format!("Failed to encode store: {}", e)))
    }

    pub fn decode(bytes: &[u8]) -> TribunalResult<Self> {
        postcard::from_bytes(bytes)
            .map_err(|e| Error::Storage(format!("Failed to decode store: {}", e)))
    }

    /// Hex SHA-256 of the encoded store. Parties that replayed the same
    /// operations in the same order end up with the same digest.
    pub fn state_digest(&self) -> TribunalResult<String> {
        let bytes = self.encode()?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}

impl Store for MemoryStore {
    fn participant(&self, id: &ParticipantId) -> Option<Participant> {
        self.participants.get(id).cloned()
    }

    fn put_participant(&mut self, participant: Participant) {
        self.participants.insert(participant.id.clone(), participant);
    }

    fn participant_ids(&self) -> Vec<ParticipantId> {
        self.participants.keys().cloned().collect()
    }

    fn content(&self, id: ContentId) -> Option<Content> {
        self.contents.get(&id).cloned()
    }

    fn put_content(&mut self, content: Content) {
        self.contents.insert(content.id, content);
    }

    fn content_ids(&self) -> Vec<ContentId> {
        self.contents.keys().copied().collect()
    }

    fn category(&self, id: CategoryId) -> Option<Category> {
        self.categories.get(&id).cloned()
    }

    fn category_id_by_name(&self, name: &str) -> Option<CategoryId> {
        self.category_names.get(name).copied()
    }

    fn put_category(&mut self, category: Category) {
        self.category_names.insert(category.name.clone(), category.id);
        self.categories.insert(category.id, category);
    }

    fn category_ids(&self) -> Vec<CategoryId> {
        self.categories.keys().copied().collect()
    }

    fn allocate_id(&mut self, kind: EntityKind) -> u64 {
        let counter = match kind {
            EntityKind::Content => &mut self.last_content_id,
            EntityKind::Category => &mut self.last_category_id,
        };
        *counter += 1;
        *counter
    }
}
