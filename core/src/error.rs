use thiserror::Error;

#[derive(Error, Debug)]
pub enum BonusError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No price snapshot found, probed: {}", keys.join(", "))]
    SnapshotNotFound { keys: Vec<String> },

    #[error("Price snapshot '{key}' not accessible: {reason}")]
    SnapshotAccess { key: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BonusError {
    pub(crate) fn snapshot_access(key: &str, reason: impl ToString) -> Self {
        BonusError::SnapshotAccess {
            key:    key.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type BonusResult<T> = Result<T, BonusError>;
