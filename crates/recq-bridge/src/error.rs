//! Errors raised while ingesting legacy components.

use recq_core::error::ValidationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("conjunction has no children")]
    EmptyConjunction,
}
