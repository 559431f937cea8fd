//! Error types for the premise engine.

use std::path::PathBuf;

/// Main error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// OpenAI API error (completion or embedding call).
    #[error("API error: {0}")]
    Api(#[from] openai::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An input tree a stage depends on does not exist.
    #[error("Input tree not found: {0}")]
    MissingTree(PathBuf),

    /// A level name that is not one of the six tree levels.
    #[error("Unknown level name: {0}")]
    UnknownLevel(String),

    /// A key path with the wrong number of components for its use.
    #[error("Key path {path:?} has {found} levels, expected {expected}")]
    PathDepth {
        path: Vec<String>,
        expected: usize,
        found: usize,
    },

    /// Tried to treat a populated leaf as an internal branch.
    #[error("Node at {0:?} is a leaf, not a branch")]
    NotABranch(Vec<String>),

    /// The generator stopped producing novel children for a parent path.
    #[error(
        "Insufficient diversity under {path:?}: {have}/{want} children after {rounds} generation rounds"
    )]
    InsufficientDiversity {
        path: Vec<String>,
        have: usize,
        want: usize,
        rounds: usize,
    },

    /// The embedding interface returned the wrong number of vectors.
    #[error("Embedding count mismatch: sent {sent} texts, got {got} vectors")]
    EmbeddingCount { sent: usize, got: usize },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
