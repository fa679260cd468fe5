//! Unnesting.
//!
//! `ExplodeExpression` turns a repeated field of an *outer* row into a stream
//! with one row per occurrence. It owns no quantifiers; the row it unnests is
//! bound elsewhere and reached through its single correlation.

use crate::alias_map::AliasMap;
use crate::correlation::CorrelationIdentifier;
use crate::error::EvalError;
use crate::record::{Datum, EvaluationContext};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash of every explode node. Instances collide on purpose; an equality check
/// always follows a hash match.
pub(crate) const EXPLODE_HASH: u64 = 17;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExplodeExpression {
    pub correlation: CorrelationIdentifier,
    pub field_names: Vec<String>,
}

impl ExplodeExpression {
    /// Unnest `field_names` of the row bound to `correlation`.
    pub fn new(correlation: CorrelationIdentifier, field_names: Vec<String>) -> Self {
        Self {
            correlation,
            field_names,
        }
    }

    /// Paths must match exactly; only the identifier goes through the map.
    pub(crate) fn equals_without_children(&self, other: &ExplodeExpression, map: &AliasMap) -> bool {
        self.field_names == other.field_names && map.corresponds(&self.correlation, &other.correlation)
    }

    /// `None` when the map does not touch the correlation.
    pub(crate) fn rebase(&self, map: &AliasMap) -> Option<ExplodeExpression> {
        if !map.contains_source(&self.correlation) {
            return None;
        }
        Some(ExplodeExpression::new(
            map.translate(&self.correlation),
            self.field_names.clone(),
        ))
    }

    /// One element per occurrence of the repeated path on the bound row, in
    /// storage order.
    pub fn evaluate(&self, ctx: &EvaluationContext) -> Result<Vec<Datum>, EvalError> {
        ctx.binding(&self.correlation)?.repeated_at_path(&self.field_names)
    }
}

impl fmt::Display for ExplodeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "explode({}.{})", self.correlation, self.field_names.join("."))
    }
}
