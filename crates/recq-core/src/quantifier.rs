//! Quantifiers.
//!
//! A quantifier owns exactly one child expression and binds the rows it
//! produces to an alias. The alias is bound by the *parent* expression: it is
//! not part of the quantifier's own correlation set, and the parent is the one
//! that lines up aliases when comparing two trees.

use crate::alias_map::AliasMap;
use crate::correlation::{Correlated, CorrelationIdentifier, CorrelationSet};
use crate::expression::RelationalExpression;
use crate::plan_hash::combine;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantifierKind {
    /// Every row of the child flows into the parent.
    ForEach,
    /// The parent only asks whether the child produces any row.
    Existential,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantifier {
    pub alias: CorrelationIdentifier,
    pub kind: QuantifierKind,
    pub ranges_over: Arc<RelationalExpression>,
}

impl Quantifier {
    /// For-each quantifier under a freshly minted alias.
    pub fn for_each(ranges_over: Arc<RelationalExpression>) -> Arc<Quantifier> {
        Self::with_alias(CorrelationIdentifier::unique(), QuantifierKind::ForEach, ranges_over)
    }

    /// Existential quantifier under a freshly minted alias.
    pub fn existential(ranges_over: Arc<RelationalExpression>) -> Arc<Quantifier> {
        Self::with_alias(CorrelationIdentifier::unique(), QuantifierKind::Existential, ranges_over)
    }

    /// Quantifier under an explicit alias.
    pub fn with_alias(
        alias: CorrelationIdentifier,
        kind: QuantifierKind,
        ranges_over: Arc<RelationalExpression>,
    ) -> Arc<Quantifier> {
        Arc::new(Quantifier {
            alias,
            kind,
            ranges_over,
        })
    }

    /// Whole-row value of the rows flowing through this quantifier.
    pub fn flowed_object_value(&self) -> Arc<Value> {
        Value::object(self.alias.clone())
    }
}

impl Correlated for Quantifier {
    fn correlated_to(&self) -> CorrelationSet {
        self.ranges_over.correlated_to()
    }

    fn rebase(self: &Arc<Self>, map: &AliasMap) -> Arc<Self> {
        let child = self.ranges_over.rebase(map);
        if Arc::ptr_eq(&child, &self.ranges_over) {
            return Arc::clone(self);
        }
        Quantifier::with_alias(self.alias.clone(), self.kind, child)
    }

    fn semantic_equals(&self, other: &Self, map: &AliasMap) -> bool {
        self.kind == other.kind && self.ranges_over.semantic_equals(&other.ranges_over, map)
    }

    fn semantic_hash(&self) -> u64 {
        let kind = match self.kind {
            QuantifierKind::ForEach => 1,
            QuantifierKind::Existential => 2,
        };
        combine(&[kind, self.ranges_over.semantic_hash()])
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            QuantifierKind::ForEach => "F",
            QuantifierKind::Existential => "E",
        };
        write!(f, "{}({}) <- {}", marker, self.alias, self.ranges_over)
    }
}
