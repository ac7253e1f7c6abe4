use thiserror::Error;

/// Failures returned by the moderation state machine.
///
/// Every variant is an expected outcome the caller can recover from; no
/// operation mutates state before returning one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModerationError {
    #[error("Invalid stake: {amount} is below the minimum of {minimum}")]
    InvalidStake { amount: u64, minimum: u64 },

    #[error("Participant {0} has already voted")]
    AlreadyVoted(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Insufficient reputation: {current} < {required}")]
    InsufficientReputation { current: u64, required: u64 },

    #[error("Unknown category: {0}")]
    UnknownCategory(u64),

    #[error("Unknown content: {0}")]
    UnknownContent(u64),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Duplicate category: {0}")]
    DuplicateCategory(String),

    #[error("Appeal already open for content {0}")]
    AppealAlreadyOpen(u64),

    #[error("Voting window still open until {closes_at}")]
    VotingWindowOpen { closes_at: u64 },

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Stake overflow: adding {amount} to {stake}")]
    StakeOverflow { stake: u64, amount: u64 },
}

pub type ModerationResult<T> = std::result::Result<T, ModerationError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Moderation error: {0}")]
    Moderation(#[from] ModerationError),
}

pub type TribunalResult<T> = std::result::Result<T, Error>;
