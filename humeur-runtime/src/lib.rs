//! Humeur Runtime
//!
//! Host-facing layer over the core and scoring crates:
//! - **Pipeline**: injected scorer, shared result cache, explicit lifecycle
//! - **Validator**: quality metrics, calibration and graded reports
//! - **FileStore**: directory-backed persistence for warm starts

pub mod error;
pub mod pipeline;
pub mod store;
pub mod validation;

pub use error::*;
pub use pipeline::*;
pub use store::*;
pub use validation::*;
