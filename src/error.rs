use thiserror::Error;

use crate::tree::path::FolderPath;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from terminal or file access.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A fixture or config file could not be understood.
    #[error("Config error: {0}")]
    Config(String),

    /// Folder service failure that reached the application layer.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Errors reported by a folder service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The requested path no longer exists server-side.
    #[error("not found: {0}")]
    NotFound(String),

    /// Retryable network or server error.
    #[error("transient failure: {0}")]
    Transient(String),
}

/// Why a raw path could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("relative segment `{0}`")]
    RelativeSegment(String),

    #[error("segment contains a NUL character")]
    NulCharacter,

    #[error("path names no folder")]
    Empty,

    #[error("not a direct child of {parent}")]
    NotAChild { parent: String },
}

/// Locally recoverable tree errors. None of these are fatal; the picker
/// queues them as notices and leaves the tree in its last good state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Could not load {path}: {source}")]
    FetchFailed {
        path: FolderPath,
        #[source]
        source: FetchError,
    },

    #[error("{path} has no subfolders")]
    EmptyResult { path: FolderPath },

    #[error("Discarded late response for {path}")]
    StaleResponse { path: FolderPath },

    #[error("Malformed path `{raw}`: {reason}")]
    MalformedPath {
        raw: String,
        #[source]
        reason: PathError,
    },
}

impl TreeError {
    /// Whether the user should see this error. Stale responses are logged only.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, TreeError::StaleResponse { .. })
    }
}
