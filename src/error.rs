//! Error taxonomy shared by every library operation.
//!
//! Every public operation either succeeds or fails with one of these kinds;
//! presentation is left to the caller.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::GameId;

/// Errors raised by the store, the sync merger, the query pipeline and the
/// editing operations
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A persisted document exists but cannot be parsed
    #[error("Corrupt store document {}: {message}", path.display())]
    CorruptStore { path: PathBuf, message: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("No game found matching '{0}'")]
    UnknownEntity(String),

    #[error("Multiple games match '{query}': {}", candidates.join(", "))]
    AmbiguousEntity {
        query: String,
        candidates: Vec<String>,
    },

    #[error("Game already exists: {id} ({name})")]
    DuplicateId { id: GameId, name: String },

    #[error("Remote catalog unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Profile is not public: {0}")]
    Privacy(String),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the remote catalog collaborator
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_) | Self::Privacy(_))
    }
}

pub type Result<T, E = LibraryError> = std::result::Result<T, E>;
