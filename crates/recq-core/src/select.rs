//! # Select Expressions and Builders
//!
//! A select expression ranges over an ordered list of quantifiers and filters
//! their combined rows with a conjunction of predicates. Quantifier order is
//! significant: it fixes nesting order, and a later quantifier's child may read
//! the alias of an earlier one (e.g. unnesting a field of the row bound by the
//! first quantifier).
//!
//! ## Builders
//!
//! Predicate producers (such as the legacy normalization bridge) do not build
//! select expressions directly. They talk to an [`ExpressionBuilder`], which
//! exposes the identifier of the row under construction and accepts
//! conjuncts. [`SelectBuilder`] is the implementation used by the planner.

use crate::alias_map::AliasMap;
use crate::correlation::{rebase_all, semantic_equals_all, Correlated, CorrelationIdentifier, CorrelationSet};
use crate::expression::RelationalExpression;
use crate::plan_hash::combine;
use crate::predicate::QueryPredicate;
use crate::quantifier::Quantifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const SELECT_SEED: u64 = 19;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectExpression {
    pub quantifiers: Vec<Arc<Quantifier>>,
    pub predicates: Vec<Arc<QueryPredicate>>,
}

impl SelectExpression {
    /// Select over `quantifiers`, filtered by the conjunction of `predicates`.
    pub fn new(quantifiers: Vec<Arc<Quantifier>>, predicates: Vec<Arc<QueryPredicate>>) -> Self {
        Self {
            quantifiers,
            predicates,
        }
    }

    /// Correlations read by the predicates, before removing own aliases.
    pub(crate) fn predicate_correlations(&self) -> CorrelationSet {
        self.predicates.iter().flat_map(|p| p.correlated_to()).collect()
    }

    pub(crate) fn equals_without_children(&self, other: &SelectExpression, map: &AliasMap) -> bool {
        semantic_equals_all(&self.predicates, &other.predicates, map)
    }

    pub(crate) fn hash_without_children(&self) -> u64 {
        let mut parts = Vec::with_capacity(self.predicates.len() + 1);
        parts.push(SELECT_SEED);
        parts.extend(self.predicates.iter().map(|p| p.semantic_hash()));
        combine(&parts)
    }

    /// `None` when neither a quantifier's child nor a predicate changed.
    pub(crate) fn rebase(&self, map: &AliasMap) -> Option<SelectExpression> {
        let quantifiers = rebase_all(&self.quantifiers, map);
        let predicates = rebase_all(&self.predicates, map);
        if quantifiers.is_none() && predicates.is_none() {
            return None;
        }
        Some(SelectExpression {
            quantifiers: quantifiers.unwrap_or_else(|| self.quantifiers.clone()),
            predicates: predicates.unwrap_or_else(|| self.predicates.clone()),
        })
    }
}

impl fmt::Display for SelectExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "select(")?;
        for (i, q) in self.quantifiers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{q}")?;
        }
        write!(f, ")")?;
        if !self.predicates.is_empty() {
            write!(f, " where {}", QueryPredicate::And(self.predicates.clone()))?;
        }
        Ok(())
    }
}

/// Accumulates the conjuncts of the expression under construction.
pub trait ExpressionBuilder {
    /// Identifier naming the row currently under construction.
    fn correlation_base(&self) -> &CorrelationIdentifier;

    /// Register a conjunct.
    fn add_predicate(&mut self, predicate: Arc<QueryPredicate>);
}

/// Builder for [`SelectExpression`]s rooted at a base quantifier.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    base: CorrelationIdentifier,
    quantifiers: Vec<Arc<Quantifier>>,
    predicates: Vec<Arc<QueryPredicate>>,
}

impl SelectBuilder {
    /// Builder whose correlation base is the alias of `base`.
    pub fn new(base: Arc<Quantifier>) -> Self {
        Self {
            base: base.alias.clone(),
            quantifiers: vec![base],
            predicates: Vec::new(),
        }
    }

    /// Append a quantifier after those already added.
    pub fn add_quantifier(&mut self, quantifier: Arc<Quantifier>) -> &mut Self {
        self.quantifiers.push(quantifier);
        self
    }

    /// Quantifiers added so far, base first.
    pub fn quantifiers(&self) -> &[Arc<Quantifier>] {
        &self.quantifiers
    }

    /// Conjuncts registered so far.
    pub fn predicates(&self) -> &[Arc<QueryPredicate>] {
        &self.predicates
    }

    /// Number of registered conjuncts.
    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    /// Finish into a select expression.
    pub fn build(self) -> Arc<RelationalExpression> {
        Arc::new(RelationalExpression::Select(SelectExpression::new(
            self.quantifiers,
            self.predicates,
        )))
    }
}

impl ExpressionBuilder for SelectBuilder {
    fn correlation_base(&self) -> &CorrelationIdentifier {
        &self.base
    }

    fn add_predicate(&mut self, predicate: Arc<QueryPredicate>) {
        self.predicates.push(predicate);
    }
}
