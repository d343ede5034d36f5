//! Runtime errors

use thiserror::Error;

use humeur_core::{CoreError, PersistenceError};
use humeur_scoring::ScoringError;

/// Errors from validation runs and validation history persistence
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Batch mismatch: {articles} articles but {results} results")]
    LengthMismatch { articles: usize, results: usize },

    #[error("Validation batch is empty")]
    EmptyBatch,

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from pipeline construction and explicit persistence calls
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}
