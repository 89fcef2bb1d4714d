use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocketError {
    #[error("not initialized: run 'docket init'")]
    NotInitialized,

    #[error("{}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    #[error("work item not found: {0}")]
    ItemNotFound(String),

    #[error("slice not found: {0}")]
    SliceNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("slice already exists: {0}")]
    DuplicateSlice(String),

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("unknown kind: {0}")]
    UnknownKind(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("id space exhausted: no free {width}-digit id")]
    IdSpaceExhausted { width: usize },

    #[error("git not found on PATH")]
    GitNotInstalled,

    #[error("git failed: {0}")]
    Git(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, DocketError>;
