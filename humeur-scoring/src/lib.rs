//! Humeur Scoring
//!
//! Lexicon-driven sentiment scoring for French news:
//! - **Lexicon**: banded terms, expressions, modifiers and nuance cues
//! - **SentimentScorer**: per-section scoring with contextual modifiers
//! - **NuanceProfile**: irony, ambivalence, uncertainty and urgency
//! - **SemanticBoost**: entity/topic/relation fusion
//!
//! ## Lexicon data
//!
//! Lexicons are TOML documents in `lexicons/`. The French press lexicon is
//! embedded; see [`lexicon::Lexicon`] for loading custom ones.

pub mod boost;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod nuance;
pub mod scorer;

pub use boost::*;
pub use config::*;
pub use error::*;
pub use lexicon::*;
pub use nuance::*;
pub use scorer::*;
