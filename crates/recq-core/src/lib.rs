//! # recq-core: Correlation-Aware Planner IR
//!
//! This crate implements the intermediate representation used by the record
//! query planner: values, predicates and relational expressions that may read
//! rows bound elsewhere in the tree through correlation identifiers.
//!
//! ## Module Overview
//!
//! - **`correlation`**: Correlation identifiers and the `Correlated` trait
//!   (correlation sets, rebase, alias-aware equality and hashing).
//! - **`alias_map`**: Injective identifier-to-identifier maps used for renaming
//!   and for lining up two trees during equality checks.
//! - **`value`**: Whole-row, field projection and literal values.
//! - **`comparison`**: Opaque comparisons carried by value predicates.
//! - **`predicate`**: Value, placeholder, connective and constant predicates.
//! - **`truth`**: Three-valued (Kleene) truth.
//! - **`quantifier`**: Alias-binding edges from an expression to its children.
//! - **`expression`**: Relational expressions (scan, explode, select).
//! - **`explode`**: The unnesting node.
//! - **`select`**: Select expressions and the expression builder seam.
//! - **`pattern`**: Declarative patterns and the bindings they produce.
//! - **`record`**: Row access, record descriptors and evaluation contexts.
//! - **`scalar`**: Scalar constants.
//! - **`plan_hash`**: Stable, order-sensitive plan hashing.
//! - **`error`**: Error types.

pub mod alias_map;
pub mod comparison;
pub mod correlation;
pub mod error;
pub mod explode;
pub mod expression;
pub mod pattern;
pub mod plan_hash;
pub mod predicate;
pub mod quantifier;
pub mod record;
pub mod scalar;
pub mod select;
pub mod truth;
pub mod value;
