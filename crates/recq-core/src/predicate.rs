//! # Query Predicates
//!
//! Boolean-valued nodes composed from values and opaque comparisons.
//!
//! ## Kinds
//!
//! - **Value predicate**: a [`Value`] tested by a [`Comparison`]. This is the
//!   canonical correlated form of a filter.
//! - **Placeholder predicate**: the same shape, but the value's type has not
//!   been resolved against a schema yet. The normalization bridge produces
//!   these when it ingests legacy field-path predicates.
//! - **And / Or / Not**: connectives over child predicates, kept in order.
//! - **Constant**: a fixed three-valued truth.
//!
//! ## Evaluation
//!
//! Value and placeholder predicates are planning structures only. Calling
//! [`QueryPredicate::eval`] on them is a programming error and fails with
//! [`EvalError::Unsupported`] instead of approximating a result; evaluation is
//! the job of the compiled-expression layer downstream. Connectives compose the
//! results of their children with three-valued logic.

use crate::alias_map::AliasMap;
use crate::comparison::Comparison;
use crate::correlation::{rebase_all, semantic_equals_all, Correlated, CorrelationSet};
use crate::error::EvalError;
use crate::pattern::{Bindable, BindingsIter, Pattern};
use crate::plan_hash::{combine, PlanHashable};
use crate::record::EvaluationContext;
use crate::truth::Truth;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const PLACEHOLDER_SEED: u64 = 101;
const AND_SEED: u64 = 103;
const OR_SEED: u64 = 107;
const NOT_SEED: u64 = 109;
const CONSTANT_SEED: u64 = 113;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryPredicate {
    Value(ValuePredicate),
    Placeholder(PlaceholderPredicate),
    And(Vec<Arc<QueryPredicate>>),
    Or(Vec<Arc<QueryPredicate>>),
    Not(Arc<QueryPredicate>),
    Constant(Truth),
}

/// Kind discriminant used by patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Value,
    Placeholder,
    And,
    Or,
    Not,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuePredicate {
    pub value: Arc<Value>,
    pub comparison: Comparison,
}

impl ValuePredicate {
    /// Predicate applying `comparison` to `value`.
    pub fn new(value: Arc<Value>, comparison: Comparison) -> Self {
        Self { value, comparison }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceholderPredicate {
    pub value: Arc<Value>,
    pub comparison: Comparison,
}

impl PlaceholderPredicate {
    /// Placeholder applying `comparison` to `value`, resolved later against a schema.
    pub fn new(value: Arc<Value>, comparison: Comparison) -> Self {
        Self { value, comparison }
    }
}

impl QueryPredicate {
    /// Conjunction of `children`, in order.
    pub fn and(children: Vec<Arc<QueryPredicate>>) -> Arc<QueryPredicate> {
        Arc::new(QueryPredicate::And(children))
    }

    /// Disjunction of `children`, in order.
    pub fn or(children: Vec<Arc<QueryPredicate>>) -> Arc<QueryPredicate> {
        Arc::new(QueryPredicate::Or(children))
    }

    /// Negation of `child`.
    pub fn not(child: Arc<QueryPredicate>) -> Arc<QueryPredicate> {
        Arc::new(QueryPredicate::Not(child))
    }

    /// Predicate with a fixed truth value.
    pub fn constant(truth: Truth) -> Arc<QueryPredicate> {
        Arc::new(QueryPredicate::Constant(truth))
    }

    /// Kind discriminant of this node.
    pub fn kind(&self) -> PredicateKind {
        match self {
            QueryPredicate::Value(_) => PredicateKind::Value,
            QueryPredicate::Placeholder(_) => PredicateKind::Placeholder,
            QueryPredicate::And(_) => PredicateKind::And,
            QueryPredicate::Or(_) => PredicateKind::Or,
            QueryPredicate::Not(_) => PredicateKind::Not,
            QueryPredicate::Constant(_) => PredicateKind::Constant,
        }
    }

    /// The value tested by a value or placeholder predicate.
    pub fn value(&self) -> Option<&Arc<Value>> {
        match self {
            QueryPredicate::Value(p) => Some(&p.value),
            QueryPredicate::Placeholder(p) => Some(&p.value),
            _ => None,
        }
    }

    /// The comparison of a value or placeholder predicate.
    pub fn comparison(&self) -> Option<&Comparison> {
        match self {
            QueryPredicate::Value(p) => Some(&p.comparison),
            QueryPredicate::Placeholder(p) => Some(&p.comparison),
            _ => None,
        }
    }

    /// Child predicates of connectives, in order.
    pub fn children(&self) -> &[Arc<QueryPredicate>] {
        match self {
            QueryPredicate::And(children) | QueryPredicate::Or(children) => children,
            QueryPredicate::Not(child) => std::slice::from_ref(child),
            _ => &[],
        }
    }

    /// Flatten nested conjunctions into a list of conjuncts.
    pub fn conjuncts(self: &Arc<Self>) -> Vec<Arc<QueryPredicate>> {
        match self.as_ref() {
            QueryPredicate::And(children) => children.iter().flat_map(|c| c.conjuncts()).collect(),
            _ => vec![Arc::clone(self)],
        }
    }

    /// Evaluate against bound rows with three-valued logic.
    pub fn eval(&self, ctx: &EvaluationContext) -> Result<Truth, EvalError> {
        match self {
            QueryPredicate::Value(_) | QueryPredicate::Placeholder(_) => {
                Err(EvalError::Unsupported(self.to_string()))
            }
            QueryPredicate::And(children) => Ok(Truth::all(eval_all(children, ctx)?)),
            QueryPredicate::Or(children) => Ok(Truth::any(eval_all(children, ctx)?)),
            QueryPredicate::Not(child) => Ok(child.eval(ctx)?.not()),
            QueryPredicate::Constant(truth) => Ok(*truth),
        }
    }

    /// All ways this predicate matches `pattern`. The sequence is built fresh
    /// on every call.
    pub fn bind_to<'a>(self: &Arc<Self>, pattern: &'a Pattern) -> BindingsIter<'a> {
        pattern.match_with(&Bindable::Predicate(Arc::clone(self)))
    }
}

fn eval_all(children: &[Arc<QueryPredicate>], ctx: &EvaluationContext) -> Result<Vec<Truth>, EvalError> {
    children.iter().map(|c| c.eval(ctx)).collect()
}

impl Correlated for QueryPredicate {
    fn correlated_to(&self) -> CorrelationSet {
        match self {
            QueryPredicate::Value(p) => p.value.correlated_to(),
            QueryPredicate::Placeholder(p) => p.value.correlated_to(),
            QueryPredicate::And(children) | QueryPredicate::Or(children) => {
                children.iter().flat_map(|c| c.correlated_to()).collect()
            }
            QueryPredicate::Not(child) => child.correlated_to(),
            QueryPredicate::Constant(_) => CorrelationSet::new(),
        }
    }

    fn rebase(self: &Arc<Self>, map: &AliasMap) -> Arc<Self> {
        match self.as_ref() {
            QueryPredicate::Value(p) => {
                let value = p.value.rebase(map);
                if Arc::ptr_eq(&value, &p.value) {
                    return Arc::clone(self);
                }
                Arc::new(QueryPredicate::Value(ValuePredicate::new(value, p.comparison.clone())))
            }
            QueryPredicate::Placeholder(p) => {
                let value = p.value.rebase(map);
                if Arc::ptr_eq(&value, &p.value) {
                    return Arc::clone(self);
                }
                Arc::new(QueryPredicate::Placeholder(PlaceholderPredicate::new(
                    value,
                    p.comparison.clone(),
                )))
            }
            QueryPredicate::And(children) => match rebase_all(children, map) {
                Some(rebased) => Arc::new(QueryPredicate::And(rebased)),
                None => Arc::clone(self),
            },
            QueryPredicate::Or(children) => match rebase_all(children, map) {
                Some(rebased) => Arc::new(QueryPredicate::Or(rebased)),
                None => Arc::clone(self),
            },
            QueryPredicate::Not(child) => {
                let rebased = child.rebase(map);
                if Arc::ptr_eq(&rebased, child) {
                    return Arc::clone(self);
                }
                Arc::new(QueryPredicate::Not(rebased))
            }
            QueryPredicate::Constant(_) => Arc::clone(self),
        }
    }

    fn semantic_equals(&self, other: &Self, map: &AliasMap) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match (self, other) {
            (QueryPredicate::Value(a), QueryPredicate::Value(b)) => {
                a.value.semantic_equals(&b.value, map) && a.comparison == b.comparison
            }
            (QueryPredicate::Placeholder(a), QueryPredicate::Placeholder(b)) => {
                a.value.semantic_equals(&b.value, map) && a.comparison == b.comparison
            }
            (QueryPredicate::And(a), QueryPredicate::And(b))
            | (QueryPredicate::Or(a), QueryPredicate::Or(b)) => semantic_equals_all(a, b, map),
            (QueryPredicate::Not(a), QueryPredicate::Not(b)) => a.semantic_equals(b, map),
            (QueryPredicate::Constant(a), QueryPredicate::Constant(b)) => a == b,
            _ => false,
        }
    }

    fn semantic_hash(&self) -> u64 {
        match self {
            QueryPredicate::Value(p) => combine(&[p.value.semantic_hash(), p.comparison.plan_hash()]),
            QueryPredicate::Placeholder(p) => combine(&[
                PLACEHOLDER_SEED,
                p.value.semantic_hash(),
                p.comparison.plan_hash(),
            ]),
            QueryPredicate::And(children) => combine_children(AND_SEED, children, |c| c.semantic_hash()),
            QueryPredicate::Or(children) => combine_children(OR_SEED, children, |c| c.semantic_hash()),
            QueryPredicate::Not(child) => combine(&[NOT_SEED, child.semantic_hash()]),
            QueryPredicate::Constant(truth) => combine(&[CONSTANT_SEED, truth_code(*truth)]),
        }
    }
}

impl PlanHashable for QueryPredicate {
    fn plan_hash(&self) -> u64 {
        match self {
            QueryPredicate::Value(p) => combine(&[p.value.plan_hash(), p.comparison.plan_hash()]),
            QueryPredicate::Placeholder(p) => combine(&[
                PLACEHOLDER_SEED,
                p.value.plan_hash(),
                p.comparison.plan_hash(),
            ]),
            QueryPredicate::And(children) => combine_children(AND_SEED, children, |c| c.plan_hash()),
            QueryPredicate::Or(children) => combine_children(OR_SEED, children, |c| c.plan_hash()),
            QueryPredicate::Not(child) => combine(&[NOT_SEED, child.plan_hash()]),
            QueryPredicate::Constant(truth) => combine(&[CONSTANT_SEED, truth_code(*truth)]),
        }
    }
}

fn combine_children(
    seed: u64,
    children: &[Arc<QueryPredicate>],
    hash: impl Fn(&QueryPredicate) -> u64,
) -> u64 {
    let mut parts = Vec::with_capacity(children.len() + 1);
    parts.push(seed);
    parts.extend(children.iter().map(|c| hash(c.as_ref())));
    combine(&parts)
}

fn truth_code(truth: Truth) -> u64 {
    match truth {
        Truth::False => 0,
        Truth::True => 1,
        Truth::Unknown => 2,
    }
}

impl fmt::Display for QueryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPredicate::Value(p) => write!(f, "{} {}", p.value, p.comparison),
            QueryPredicate::Placeholder(p) => write!(f, "{} {} (?)", p.value, p.comparison),
            QueryPredicate::And(children) => write_joined(f, children, " AND "),
            QueryPredicate::Or(children) => write_joined(f, children, " OR "),
            QueryPredicate::Not(child) => write!(f, "NOT {child}"),
            QueryPredicate::Constant(truth) => write!(f, "{truth}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Arc<QueryPredicate>], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}
