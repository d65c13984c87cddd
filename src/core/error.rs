//! Error types for the document engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unrecognized file format: {0}")]
    UnrecognizedFormat(String),

    #[error("Unexpected end of data at byte {offset} (needed {needed} more)")]
    Truncated { offset: usize, needed: usize },

    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Object not found")]
    ObjectNotFound,

    #[error("Cyclic sub-model reference: {0}")]
    CyclicReference(String),

    #[error("Group cycle: {0}")]
    GroupCycle(String),

    #[error("Corrupt checkpoint: {0}")]
    CorruptCheckpoint(String),

    #[error("Config error: {0}")]
    Config(String),
}
