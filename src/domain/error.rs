//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of tree and store rules.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid identifier {0:?}: only [A-Za-z0-9_-] allowed")]
    InvalidIdentifier(String),

    #[error("identifier already used by a sibling: {0}")]
    ConflictingIdentifier(String),

    #[error("cycle detected: {child} cannot be placed under its own descendant {parent}")]
    CycleDetected { parent: String, child: String },

    #[error("the root node cannot be moved or discarded")]
    RootNotMovable,

    #[error("node not found in tree")]
    NodeNotFound,

    #[error("node is still attached: {0}")]
    NodeAttached(String),

    #[error("child index {index} out of bounds (child count {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("no page at path: {0}")]
    PathNotFound(String),

    #[error("store I/O failed: {context}")]
    StoreIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {format} store: {message}")]
    MalformedStore {
        format: &'static str,
        message: String,
    },
}

impl DomainError {
    /// Create a store I/O error with context.
    pub fn store_io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::StoreIo {
            context: context.into(),
            source,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
