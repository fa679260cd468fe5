//! Error types for the planner IR.
//!
//! Nothing in this crate retries: every error is either a caller programming
//! error or a schema problem and is surfaced to the caller immediately.

use crate::correlation::CorrelationIdentifier;
use thiserror::Error;

/// Violation of the injectivity invariant of an [`AliasMap`](crate::alias_map::AliasMap).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AliasMapError {
    #[error("{alias} is already mapped to {existing}")]
    SourceAlreadyMapped {
        alias: CorrelationIdentifier,
        existing: CorrelationIdentifier,
    },
    #[error("target {target} is already the image of {existing}")]
    TargetAlreadyMapped {
        target: CorrelationIdentifier,
        existing: CorrelationIdentifier,
    },
}

/// Failure while evaluating a node directly against rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The node is a planning-only structure; evaluation belongs to the
    /// compiled-expression layer downstream.
    #[error("direct evaluation is not supported for {0}")]
    Unsupported(String),
    /// No row is bound to the identifier in the evaluation context.
    #[error("correlation {0} is not bound in the evaluation context")]
    UnboundCorrelation(CorrelationIdentifier),
    /// A path component that must name a nested record does not.
    #[error("field {0} is not a nested record")]
    NotARecord(String),
    /// The last path component does not name a repeated field.
    #[error("field {0} is not repeated")]
    NotRepeated(String),
}

/// Failure of the schema-bound validation step that runs before planning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field {field} in record type {record_type}")]
    UnknownField { record_type: String, field: String },
    #[error("field {field} in record type {record_type} must be repeated")]
    NotRepeated { record_type: String, field: String },
    #[error("field {field} in record type {record_type} is not a nested record")]
    NotAMessage { record_type: String, field: String },
}
