//! # Legacy Query Components
//!
//! Legacy components name fields of the row being filtered directly, without
//! correlation identifiers. They support three operations:
//!
//! - **evaluate**: direct three-valued evaluation against a row. A missing row
//!   yields `Truth::Unknown`, never `False`.
//! - **validate**: schema check against the record type being filtered, after
//!   following the same field prefix that normalization will use. This is the
//!   only place where unknown or wrongly-labelled fields are reported.
//! - **normalize**: conversion into correlated predicates rooted at the
//!   builder's correlation base. Each produced predicate is registered with
//!   the builder and returned.
//!
//! Normalization erases the field's type: the produced predicate is a
//! placeholder over a field projection, to be resolved later against a schema.

use recq_core::comparison::Comparison;
use recq_core::error::ValidationError;
use recq_core::plan_hash::{combine, PlanHashable};
use recq_core::predicate::QueryPredicate;
use recq_core::record::{RecordDescriptor, RecordView};
use recq_core::select::ExpressionBuilder;
use recq_core::truth::Truth;
use recq_core::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const AND_SEED: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryComponent {
    /// Emptiness test on a repeated field.
    Empty(EmptyComparison),
    /// All children must hold.
    And(Vec<QueryComponent>),
}

/// Whether a repeated field has no occurrences (`is_empty`) or at least one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmptyComparison {
    pub field_name: String,
    pub is_empty: bool,
}

impl EmptyComparison {
    /// Emptiness test on `field_name`; `is_empty = false` tests for at least one occurrence.
    pub fn new(field_name: impl Into<String>, is_empty: bool) -> Self {
        Self {
            field_name: field_name.into(),
            is_empty,
        }
    }

    /// Occurrence-count test on `row`; `Unknown` when there is no row.
    pub fn evaluate(&self, row: Option<&dyn RecordView>) -> Truth {
        let Some(row) = row else {
            return Truth::Unknown;
        };
        let count = row.repeated_field_count(&self.field_name);
        Truth::from(if self.is_empty { count == 0 } else { count > 0 })
    }

    /// Check that `field_prefix` leads to a nested record type on which the
    /// field exists and is repeated.
    pub fn validate(&self, descriptor: &RecordDescriptor, field_prefix: &[String]) -> Result<(), ValidationError> {
        descriptor
            .resolve_path(field_prefix)?
            .find_repeated_field(&self.field_name)
            .map(|_| ())
    }

    /// Register a placeholder emptiness predicate over the prefixed field,
    /// rooted at the builder's correlation base.
    pub fn normalize(
        &self,
        builder: &mut dyn ExpressionBuilder,
        field_prefix: &[String],
    ) -> Vec<Arc<QueryPredicate>> {
        let mut field_names = field_prefix.to_vec();
        field_names.push(self.field_name.clone());
        let predicate = Value::field(builder.correlation_base().clone(), field_names)
            .unknown(Comparison::list_emptiness(self.is_empty));
        builder.add_predicate(Arc::clone(&predicate));
        vec![predicate]
    }
}

impl PlanHashable for EmptyComparison {
    fn plan_hash(&self) -> u64 {
        u64::from(self.is_empty)
    }
}

impl fmt::Display for EmptyComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let test = if self.is_empty { "IS_EMPTY" } else { "IS_NOT_EMPTY" };
        write!(f, "{} {}", self.field_name, test)
    }
}

impl QueryComponent {
    /// Field has no occurrences.
    pub fn empty(field_name: impl Into<String>) -> Self {
        QueryComponent::Empty(EmptyComparison::new(field_name, true))
    }

    /// Field has at least one occurrence.
    pub fn not_empty(field_name: impl Into<String>) -> Self {
        QueryComponent::Empty(EmptyComparison::new(field_name, false))
    }

    /// All of `children`.
    pub fn and(children: Vec<QueryComponent>) -> Self {
        QueryComponent::And(children)
    }

    /// Direct evaluation against the row, if there is one.
    pub fn evaluate(&self, row: Option<&dyn RecordView>) -> Truth {
        match self {
            QueryComponent::Empty(c) => c.evaluate(row),
            QueryComponent::And(children) => Truth::all(children.iter().map(|c| c.evaluate(row))),
        }
    }

    /// Validate every leaf against the record type reached through
    /// `field_prefix`.
    pub fn validate(&self, descriptor: &RecordDescriptor, field_prefix: &[String]) -> Result<(), ValidationError> {
        match self {
            QueryComponent::Empty(c) => c.validate(descriptor, field_prefix),
            QueryComponent::And(children) => children
                .iter()
                .try_for_each(|c| c.validate(descriptor, field_prefix)),
        }
    }

    /// Register the correlated form of this component with `builder`.
    /// Conjunctions contribute one predicate per leaf, in order.
    pub fn normalize(
        &self,
        builder: &mut dyn ExpressionBuilder,
        field_prefix: &[String],
    ) -> Vec<Arc<QueryPredicate>> {
        match self {
            QueryComponent::Empty(c) => c.normalize(builder, field_prefix),
            QueryComponent::And(children) => children
                .iter()
                .flat_map(|c| c.normalize(builder, field_prefix))
                .collect(),
        }
    }

    /// Whether some conjunction in this component has no children.
    pub(crate) fn has_empty_conjunction(&self) -> bool {
        match self {
            QueryComponent::Empty(_) => false,
            QueryComponent::And(children) => {
                children.is_empty() || children.iter().any(|c| c.has_empty_conjunction())
            }
        }
    }
}

impl PlanHashable for QueryComponent {
    fn plan_hash(&self) -> u64 {
        match self {
            QueryComponent::Empty(c) => c.plan_hash(),
            QueryComponent::And(children) => {
                let mut parts = Vec::with_capacity(children.len() + 1);
                parts.push(AND_SEED);
                parts.extend(children.iter().map(|c| c.plan_hash()));
                combine(&parts)
            }
        }
    }
}

impl fmt::Display for QueryComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryComponent::Empty(c) => write!(f, "{c}"),
            QueryComponent::And(children) => {
                write!(f, "And([")?;
                for (i, c) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, "])")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recq_core::correlation::CorrelationIdentifier;
    use recq_core::expression::RelationalExpression;
    use recq_core::quantifier::{Quantifier, QuantifierKind};
    use recq_core::record::{Datum, FieldLabel, Record};
    use recq_core::select::SelectBuilder;

    fn row(tags: usize) -> Record {
        Record::new("Doc").with_repeated("tags", (0..tags).map(|i| Datum::Scalar((i as i64).into())).collect())
    }

    fn builder() -> SelectBuilder {
        SelectBuilder::new(Quantifier::with_alias(
            CorrelationIdentifier::of("q1"),
            QuantifierKind::ForEach,
            RelationalExpression::scan(vec!["Doc".into()]),
        ))
    }

    #[test]
    fn test_missing_row_is_unknown() {
        assert_eq!(EmptyComparison::new("tags", true).evaluate(None), Truth::Unknown);
        assert_eq!(EmptyComparison::new("tags", false).evaluate(None), Truth::Unknown);
    }

    #[test]
    fn test_emptiness_by_occurrence_count() {
        let empty = EmptyComparison::new("tags", true);
        let not_empty = EmptyComparison::new("tags", false);
        let none = row(0);
        let two = row(2);
        assert_eq!(empty.evaluate(Some(&none)), Truth::True);
        assert_eq!(empty.evaluate(Some(&two)), Truth::False);
        assert_eq!(not_empty.evaluate(Some(&none)), Truth::False);
        assert_eq!(not_empty.evaluate(Some(&two)), Truth::True);
        // An unset field has no occurrences.
        assert_eq!(empty.evaluate(Some(&Record::new("Doc"))), Truth::True);
    }

    #[test]
    fn test_flag_distinguishes_components() {
        let empty = EmptyComparison::new("tags", true);
        let not_empty = EmptyComparison::new("tags", false);
        assert_ne!(empty, not_empty);
        assert_eq!(empty.plan_hash(), 1);
        assert_eq!(not_empty.plan_hash(), 0);
        assert_eq!(empty.to_string(), "tags IS_EMPTY");
        assert_eq!(not_empty.to_string(), "tags IS_NOT_EMPTY");
    }

    #[test]
    fn test_validate_requires_repeated_field() {
        let descriptor = RecordDescriptor::new("Doc")
            .with_field("tags", FieldLabel::Repeated)
            .with_field("title", FieldLabel::Optional);
        assert!(QueryComponent::empty("tags").validate(&descriptor, &[]).is_ok());
        assert_eq!(
            QueryComponent::empty("title").validate(&descriptor, &[]),
            Err(ValidationError::NotRepeated {
                record_type: "Doc".into(),
                field: "title".into()
            })
        );
        assert!(matches!(
            QueryComponent::and(vec![QueryComponent::empty("tags"), QueryComponent::empty("missing")])
                .validate(&descriptor, &[]),
            Err(ValidationError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_normalize_keeps_emptiness_flag() {
        let mut b = builder();
        let empty = QueryComponent::empty("tags").normalize(&mut b, &[]);
        let not_empty = QueryComponent::not_empty("tags").normalize(&mut b, &[]);
        assert_eq!(empty[0].comparison(), Some(&Comparison::ListEmpty));
        assert_eq!(not_empty[0].comparison(), Some(&Comparison::ListNotEmpty));
        assert_eq!(b.predicate_count(), 2);
    }

    #[test]
    fn test_and_normalizes_every_child_in_order() {
        let mut b = builder();
        let component = QueryComponent::and(vec![QueryComponent::empty("tags"), QueryComponent::not_empty("labels")]);
        let predicates = component.normalize(&mut b, &["meta".to_string()]);
        assert_eq!(predicates.len(), 2);
        assert_eq!(b.predicates(), predicates.as_slice());
        assert_eq!(predicates[1].to_string(), "q1.meta.labels IS_NOT_EMPTY (?)");
    }

    #[test]
    fn test_and_evaluation_is_three_valued() {
        let component = QueryComponent::and(vec![QueryComponent::empty("tags"), QueryComponent::not_empty("tags")]);
        assert_eq!(component.evaluate(Some(&row(1))), Truth::False);
        assert_eq!(component.evaluate(None), Truth::Unknown);
        assert!(!component.has_empty_conjunction());
        assert!(QueryComponent::and(vec![]).has_empty_conjunction());
        assert_eq!(component.to_string(), "And([tags IS_EMPTY, tags IS_NOT_EMPTY])");
    }
}
