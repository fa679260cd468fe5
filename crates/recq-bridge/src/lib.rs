//! # recq-bridge: Legacy Predicate Normalization
//!
//! Callers that still speak the legacy field-path predicate language hand
//! their components to this crate. Each component is validated against the
//! record type it filters and then normalized, once, into the correlated
//! predicate form of `recq-core`. The conversion only goes one way: normalized
//! predicates are never turned back into legacy components.
//!
//! ## Module Overview
//!
//! - **`component`**: Legacy query components (emptiness tests, conjunctions)
//!   with their direct evaluation, validation and normalization.
//! - **`normalizer`**: The ingestion entry point (validate, then normalize).
//! - **`config`**: Normalizer configuration.
//! - **`error`**: Bridge errors.

pub mod component;
pub mod config;
pub mod error;
pub mod normalizer;

pub use component::{EmptyComparison, QueryComponent};
pub use config::NormalizerConfig;
pub use error::BridgeError;
pub use normalizer::Normalizer;
