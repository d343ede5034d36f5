//! Humeur Core - data model, semantic analysis and result cache
//!
//! This crate provides the foundational primitives:
//! - Article and sentiment result types shared by every stage
//! - Semantic analysis (entities, relations, topic sentiment, key phrases)
//! - Content-addressed result cache with TTL expiry
//! - Pluggable persistence backend for cache warm-start

pub mod article;
pub mod cache;
pub mod error;
pub mod semantic;
pub mod store;
pub mod text;

pub use article::*;
pub use cache::*;
pub use error::*;
pub use semantic::*;
pub use store::*;

/// Default cache entry lifetime in hours
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

/// Default maximum number of cached results
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Maximum entities returned by one analysis
pub const MAX_ENTITIES: usize = 25;

/// Maximum relations returned by one analysis
pub const MAX_RELATIONS: usize = 30;

/// Maximum key phrases returned by one analysis
pub const MAX_KEY_PHRASES: usize = 5;
