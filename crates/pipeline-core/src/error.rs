use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required field is missing or malformed. Never reaches the remote API.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation is structurally impossible in the current board state.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure, timeout or server-side rejection.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Errors that can only be observed after a remote round-trip, and are
    /// therefore handled by rolling back the optimistic change.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Transport(_))
    }

    /// Errors detected before anything was applied to the store.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Precondition(_))
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
