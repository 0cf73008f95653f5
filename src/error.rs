//! Error taxonomy for the moderation loop.
//!
//! Library callers match on these to pick a recovery strategy. Startup code
//! and one-off tooling keep using `anyhow::Result` for context chains.

use thiserror::Error;

use crate::decision::Action;

#[derive(Debug, Error)]
pub enum ModerationError {
    /// Network/API failure talking to a collaborator.
    #[error("transient I/O: {0}")]
    TransientIo(String),

    /// Classifier answered, but not in the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Missing credentials or invalid settings; fatal before the loop starts.
    #[error("configuration: {0}")]
    Configuration(String),

    #[error("{action} against {target} failed: {message}")]
    ActionExecution {
        action: Action,
        target: String,
        message: String,
    },

    /// Ledger or dedup store could not be persisted.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
}

impl ModerationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo(_))
    }
}

impl From<reqwest::Error> for ModerationError {
    fn from(e: reqwest::Error) -> Self {
        Self::TransientIo(e.to_string())
    }
}

pub type Result<T, E = ModerationError> = std::result::Result<T, E>;
