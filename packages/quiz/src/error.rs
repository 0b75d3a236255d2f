//! Engine error types
//!
//! Only caller bugs surface as [`QuizError`]. Recoverable persistence
//! failures are logged where they happen and never reach this type.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("unknown data-set key: {0}")]
    UnknownDataset(String),

    #[error("invalid level config: {0}")]
    InvalidLevelConfig(String),

    #[error("invalid import: {0}")]
    InvalidImport(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type QuizResult<T> = Result<T, QuizError>;
