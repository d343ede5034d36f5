//! Errors raised while loading lexicons and building scorers

use thiserror::Error;

use humeur_core::CoreError;

/// Errors from lexicon loading and scorer construction
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Invalid lexicon: {0}")]
    Lexicon(#[from] toml::de::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Semantic analyzer error: {0}")]
    Semantic(#[from] CoreError),

    #[error("Lexicon has no sentiment terms")]
    EmptyLexicon,
}
