pub mod appeal;
pub mod category;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod replay;
pub mod reputation;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod types;
pub mod voting;

pub use appeal::{Appeal, AppealOutcome};
pub use category::Category;
pub use config::{LogFormat, ModerationConfig};
pub use content::{Content, ContentStatus};
pub use engine::ModerationEngine;
pub use error::{Error, ModerationError, ModerationResult, TribunalResult};
pub use replay::{Operation, OperationValue, ReplayOutcome};
pub use reputation::{Action, Participant, ReputationRules};
pub use scheduler::TickReport;
pub use storage::SnapshotStorage;
pub use store::{EntityKind, MemoryStore, Store};
pub use types::{CategoryId, ContentId, Decision, ParticipantId, TimeUnit};
