//! # Relational Expressions
//!
//! A relational expression represents a stream of rows. It owns an ordered
//! list of [`Quantifier`]s, each of which owns one child expression and binds
//! its rows to an alias. The whole structure is a tree.
//!
//! ## Correlations
//!
//! An expression's correlation set is everything it (or anything below it)
//! reads, minus the aliases its own quantifiers bind.
//!
//! ## Equality and Hashing
//!
//! Comparison is split in two:
//!
//! - a generic recursive part, shared by all kinds, that walks the quantifiers
//!   of both sides in order, compares their children, and extends the alias
//!   map with each pair of aliases it lines up;
//! - a per-kind `equals_without_children` / `hash_without_children` that only
//!   looks at the node's own fields, under the extended alias map.
//!
//! ## Kinds
//!
//! - **Scan**: leaf that reads all records of some record types.
//! - **Explode**: leaf that unnests a repeated field of an outer row.
//! - **Select**: quantifiers plus conjunctive predicates.

use crate::alias_map::AliasMap;
use crate::correlation::{Correlated, CorrelationIdentifier, CorrelationSet};
use crate::explode::{ExplodeExpression, EXPLODE_HASH};
use crate::pattern::{Bindable, BindingsIter, Pattern};
use crate::plan_hash::{combine, hash_path, PlanHashable};
use crate::quantifier::Quantifier;
use crate::select::SelectExpression;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

const SCAN_SEED: u64 = 23;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationalExpression {
    Scan(ScanExpression),
    Explode(ExplodeExpression),
    Select(SelectExpression),
}

/// Kind discriminant used by patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    Scan,
    Explode,
    Select,
}

/// Reads every record of the listed record types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanExpression {
    pub record_types: Vec<String>,
}

impl RelationalExpression {
    /// Leaf reading every record of `record_types`.
    pub fn scan(record_types: Vec<String>) -> Arc<RelationalExpression> {
        Arc::new(RelationalExpression::Scan(ScanExpression { record_types }))
    }

    /// Leaf unnesting `field_names` of the outer row bound to `correlation`.
    pub fn explode(correlation: CorrelationIdentifier, field_names: Vec<String>) -> Arc<RelationalExpression> {
        Arc::new(RelationalExpression::Explode(ExplodeExpression::new(
            correlation,
            field_names,
        )))
    }

    /// Kind discriminant of this node.
    pub fn kind(&self) -> ExpressionKind {
        match self {
            RelationalExpression::Scan(_) => ExpressionKind::Scan,
            RelationalExpression::Explode(_) => ExpressionKind::Explode,
            RelationalExpression::Select(_) => ExpressionKind::Select,
        }
    }

    /// Owned quantifiers, in order.
    pub fn quantifiers(&self) -> &[Arc<Quantifier>] {
        match self {
            RelationalExpression::Select(s) => &s.quantifiers,
            RelationalExpression::Scan(_) | RelationalExpression::Explode(_) => &[],
        }
    }

    /// Aliases bound by this node's own quantifiers.
    pub fn bound_aliases(&self) -> CorrelationSet {
        self.quantifiers().iter().map(|q| q.alias.clone()).collect()
    }

    /// Correlations read by the node's own fields, ignoring children and
    /// before removing bound aliases.
    fn correlated_to_without_children(&self) -> CorrelationSet {
        match self {
            RelationalExpression::Scan(_) => CorrelationSet::new(),
            RelationalExpression::Explode(e) => CorrelationSet::from([e.correlation.clone()]),
            RelationalExpression::Select(s) => s.predicate_correlations(),
        }
    }

    /// Compare only the node's own fields. Assumes `map` already relates the
    /// aliases of the two nodes' quantifiers.
    pub fn equals_without_children(&self, other: &RelationalExpression, map: &AliasMap) -> bool {
        match (self, other) {
            (RelationalExpression::Scan(a), RelationalExpression::Scan(b)) => a.record_types == b.record_types,
            (RelationalExpression::Explode(a), RelationalExpression::Explode(b)) => {
                a.equals_without_children(b, map)
            }
            (RelationalExpression::Select(a), RelationalExpression::Select(b)) => {
                a.equals_without_children(b, map)
            }
            _ => false,
        }
    }

    /// Hash of the node's own fields, invariant under renaming.
    pub fn hash_without_children(&self) -> u64 {
        match self {
            RelationalExpression::Scan(s) => combine(&[SCAN_SEED, hash_path(&s.record_types)]),
            RelationalExpression::Explode(_) => EXPLODE_HASH,
            RelationalExpression::Select(s) => s.hash_without_children(),
        }
    }

    /// All ways this expression matches `pattern`.
    pub fn bind_to<'a>(self: &Arc<Self>, pattern: &'a Pattern) -> BindingsIter<'a> {
        pattern.match_with(&Bindable::Expression(Arc::clone(self)))
    }
}

impl Correlated for RelationalExpression {
    fn correlated_to(&self) -> CorrelationSet {
        let bound = self.bound_aliases();
        let mut result = self.correlated_to_without_children();
        for quantifier in self.quantifiers() {
            result.extend(quantifier.correlated_to());
        }
        result.retain(|id| !bound.contains(id));
        result
    }

    fn rebase(self: &Arc<Self>, map: &AliasMap) -> Arc<Self> {
        // Aliases bound here shadow any outer mapping of the same identifier.
        let bound = self.bound_aliases();
        let map = if bound.iter().any(|alias| map.contains_source(alias)) {
            Cow::Owned(map.without_sources(&bound))
        } else {
            Cow::Borrowed(map)
        };
        let rebased = match self.as_ref() {
            RelationalExpression::Scan(_) => None,
            RelationalExpression::Explode(e) => e.rebase(&map).map(RelationalExpression::Explode),
            RelationalExpression::Select(s) => s.rebase(&map).map(RelationalExpression::Select),
        };
        match rebased {
            Some(expression) => {
                trace!("rebased {:?} node through {} mapping(s)", self.kind(), map.len());
                Arc::new(expression)
            }
            None => Arc::clone(self),
        }
    }

    fn semantic_equals(&self, other: &Self, map: &AliasMap) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.kind() != other.kind() {
            return false;
        }
        let (left, right) = (self.quantifiers(), other.quantifiers());
        if left.len() != right.len() {
            return false;
        }
        let mut extended = map.clone();
        for (a, b) in left.iter().zip(right.iter()) {
            if !a.semantic_equals(b, &extended) {
                return false;
            }
            extended = match extended
                .without_sources([&a.alias])
                .with(a.alias.clone(), b.alias.clone())
            {
                Ok(next) => next,
                Err(_) => return false,
            };
        }
        self.equals_without_children(other, &extended)
    }

    fn semantic_hash(&self) -> u64 {
        let mut parts = vec![self.hash_without_children()];
        parts.extend(self.quantifiers().iter().map(|q| q.semantic_hash()));
        combine(&parts)
    }
}

impl PlanHashable for RelationalExpression {
    fn plan_hash(&self) -> u64 {
        self.semantic_hash()
    }
}

impl fmt::Display for RelationalExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationalExpression::Scan(s) => write!(f, "scan({})", s.record_types.join(", ")),
            RelationalExpression::Explode(e) => write!(f, "{e}"),
            RelationalExpression::Select(s) => write!(f, "{s}"),
        }
    }
}
