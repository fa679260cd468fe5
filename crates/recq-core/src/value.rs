//! # Values
//!
//! A value produces one scalar per input row. Values are leaves of predicates
//! and may read correlations, e.g. "the whole row bound to `q1`" or "field
//! `tags` of the row bound to `q1`".
//!
//! ## Hashing
//!
//! `semantic_hash` must be invariant under renaming, so identifier-carrying
//! values never fold the identifier into their hash: a whole-row value hashes
//! to a fixed constant and a field projection hashes its path only.

use crate::alias_map::AliasMap;
use crate::comparison::Comparison;
use crate::correlation::{Correlated, CorrelationIdentifier, CorrelationSet};
use crate::plan_hash::{combine, hash_path, PlanHashable};
use crate::predicate::{PlaceholderPredicate, QueryPredicate, ValuePredicate};
use crate::scalar::ScalarValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const OBJECT_VALUE_HASH: u64 = 39;
const FIELD_VALUE_SEED: u64 = 41;
const LITERAL_VALUE_SEED: u64 = 43;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// The entire row bound by an identifier.
    Object(ObjectValue),
    /// A field path projected out of the row bound by an identifier.
    Field(FieldValue),
    /// A constant.
    Literal(LiteralValue),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectValue {
    pub identifier: CorrelationIdentifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldValue {
    pub identifier: CorrelationIdentifier,
    pub field_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiteralValue {
    pub value: ScalarValue,
}

impl Value {
    /// The whole row bound to `identifier`.
    pub fn object(identifier: CorrelationIdentifier) -> Arc<Value> {
        Arc::new(Value::Object(ObjectValue { identifier }))
    }

    /// Field path `field_names` of the row bound to `identifier`.
    pub fn field(identifier: CorrelationIdentifier, field_names: Vec<String>) -> Arc<Value> {
        Arc::new(Value::Field(FieldValue {
            identifier,
            field_names,
        }))
    }

    /// A constant.
    pub fn literal(value: impl Into<ScalarValue>) -> Arc<Value> {
        Arc::new(Value::Literal(LiteralValue {
            value: value.into(),
        }))
    }

    /// Identifier read by this value, if any.
    pub fn identifier(&self) -> Option<&CorrelationIdentifier> {
        match self {
            Value::Object(v) => Some(&v.identifier),
            Value::Field(v) => Some(&v.identifier),
            Value::Literal(_) => None,
        }
    }

    /// Predicate applying `comparison` to this value.
    pub fn with_comparison(self: &Arc<Self>, comparison: Comparison) -> Arc<QueryPredicate> {
        Arc::new(QueryPredicate::Value(ValuePredicate::new(
            Arc::clone(self),
            comparison,
        )))
    }

    /// Placeholder predicate: `comparison` over this value with its type not
    /// yet resolved.
    pub fn unknown(self: &Arc<Self>, comparison: Comparison) -> Arc<QueryPredicate> {
        Arc::new(QueryPredicate::Placeholder(PlaceholderPredicate::new(
            Arc::clone(self),
            comparison,
        )))
    }

    fn with_identifier(&self, identifier: CorrelationIdentifier) -> Value {
        match self {
            Value::Object(_) => Value::Object(ObjectValue { identifier }),
            Value::Field(v) => Value::Field(FieldValue {
                identifier,
                field_names: v.field_names.clone(),
            }),
            Value::Literal(v) => Value::Literal(v.clone()),
        }
    }
}

impl Correlated for Value {
    fn correlated_to(&self) -> CorrelationSet {
        self.identifier().into_iter().cloned().collect()
    }

    fn rebase(self: &Arc<Self>, map: &AliasMap) -> Arc<Self> {
        match self.identifier() {
            Some(id) if map.contains_source(id) => Arc::new(self.with_identifier(map.translate(id))),
            _ => Arc::clone(self),
        }
    }

    fn semantic_equals(&self, other: &Self, map: &AliasMap) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => map.corresponds(&a.identifier, &b.identifier),
            (Value::Field(a), Value::Field(b)) => {
                a.field_names == b.field_names && map.corresponds(&a.identifier, &b.identifier)
            }
            (Value::Literal(a), Value::Literal(b)) => a == b,
            _ => false,
        }
    }

    fn semantic_hash(&self) -> u64 {
        match self {
            Value::Object(_) => OBJECT_VALUE_HASH,
            Value::Field(v) => combine(&[FIELD_VALUE_SEED, hash_path(&v.field_names)]),
            Value::Literal(v) => combine(&[LITERAL_VALUE_SEED, v.value.plan_hash()]),
        }
    }
}

impl PlanHashable for Value {
    fn plan_hash(&self) -> u64 {
        self.semantic_hash()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Object(v) => write!(f, "${}", v.identifier),
            Value::Field(v) => write!(f, "{}.{}", v.identifier, v.field_names.join(".")),
            Value::Literal(v) => write!(f, "{}", v.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> CorrelationIdentifier {
        CorrelationIdentifier::of(name)
    }

    #[test]
    fn test_object_value_rebase_short_circuits() {
        let v = Value::object(id("q1"));
        let rebased = v.rebase(&AliasMap::of(id("q9"), id("q10")));
        assert!(Arc::ptr_eq(&v, &rebased));

        let moved = v.rebase(&AliasMap::of(id("q1"), id("q2")));
        assert!(!Arc::ptr_eq(&v, &moved));
        assert_eq!(moved.correlated_to().into_iter().collect::<Vec<_>>(), vec![id("q2")]);
    }

    #[test]
    fn test_object_value_semantic_equality_goes_through_map() {
        let a = Value::object(id("q1"));
        let b = Value::object(id("q2"));
        assert!(!a.semantic_equals(&b, &AliasMap::empty()));
        assert!(a.semantic_equals(&b, &AliasMap::of(id("q1"), id("q2"))));
        assert_eq!(a.semantic_hash(), b.semantic_hash());
        assert_eq!(a.semantic_hash(), 39);
        // Raw equality still sees the identifier.
        assert_ne!(a, b);
    }

    #[test]
    fn test_field_value_compares_paths_exactly() {
        let a = Value::field(id("q1"), vec!["tags".into()]);
        let b = Value::field(id("q1"), vec!["items".into()]);
        assert!(!a.semantic_equals(&b, &AliasMap::empty()));
        assert_ne!(a.semantic_hash(), b.semantic_hash());
    }

    #[test]
    fn test_literal_value_is_uncorrelated() {
        let v = Value::literal(42i64);
        assert!(v.correlated_to().is_empty());
        let rebased = v.rebase(&AliasMap::of(id("q1"), id("q2")));
        assert!(Arc::ptr_eq(&v, &rebased));
        assert_eq!(v.to_string(), "42");
    }

    #[test]
    fn test_different_kinds_never_equal() {
        let object = Value::object(id("q1"));
        let field = Value::field(id("q1"), vec!["a".into()]);
        assert!(!object.semantic_equals(&field, &AliasMap::empty()));
    }
}
