use thiserror::Error;

use crate::core::Path;

/// A candidate document broke one of the structural rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("document must be an array of blocks")]
    NotAnArray,
    #[error("document must contain at least one block")]
    EmptyDocument,
    #[error("block {block} is not an object")]
    BlockNotAnObject { block: usize },
    #[error("block {block} has no string `type`")]
    MissingBlockType { block: usize },
    #[error("block {block} has no `children` array")]
    MissingChildren { block: usize },
    #[error("block {block} has no leaves")]
    EmptyBlock { block: usize },
    #[error("leaf {leaf} of block {block} is malformed: {reason}")]
    MalformedLeaf {
        block: usize,
        leaf: usize,
        reason: String,
    },
    #[error("leaf {leaf} of block {block} is empty but is not the only leaf")]
    StrayEmptyLeaf { block: usize, leaf: usize },
    #[error("block {block} has unknown type `{kind}`")]
    UnknownBlockType { block: usize, kind: String },
}

#[derive(Debug, Error)]
pub enum PersistenceDecodeError {
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored value is not a valid document: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access storage key `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("path {path:?} does not name a leaf")]
    InvalidPath { path: Path },
    #[error("offset {offset} is past the end of leaf {path:?} (length {len})")]
    OffsetOutOfBounds {
        path: Path,
        offset: usize,
        len: usize,
    },
    #[error("offset {offset} in leaf {path:?} is not on a character boundary")]
    NotCharBoundary { path: Path, offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
