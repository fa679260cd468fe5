//! Ingesting legacy components into a select builder and checking the
//! correlated predicates that come out.

use recq_bridge::{BridgeError, Normalizer, NormalizerConfig, QueryComponent};
use recq_core::alias_map::AliasMap;
use recq_core::comparison::Comparison;
use recq_core::correlation::{Correlated, CorrelationIdentifier, CorrelationSet};
use recq_core::error::ValidationError;
use recq_core::expression::RelationalExpression;
use recq_core::pattern::{Bindable, Pattern};
use recq_core::predicate::PredicateKind;
use recq_core::quantifier::{Quantifier, QuantifierKind};
use recq_core::record::{FieldLabel, RecordDescriptor};
use recq_core::select::SelectBuilder;
use recq_core::value::Value;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn id(name: &str) -> CorrelationIdentifier {
    CorrelationIdentifier::of(name)
}

fn doc_builder(alias: &str) -> SelectBuilder {
    SelectBuilder::new(Quantifier::with_alias(
        id(alias),
        QuantifierKind::ForEach,
        RelationalExpression::scan(vec!["Doc".into()]),
    ))
}

fn doc_descriptor() -> RecordDescriptor {
    let meta = RecordDescriptor::new("Meta").with_field("labels", FieldLabel::Repeated);
    RecordDescriptor::new("Doc")
        .with_field("tags", FieldLabel::Repeated)
        .with_field("title", FieldLabel::Optional)
        .with_message_field("meta", FieldLabel::Optional, meta)
}

#[test]
fn test_not_empty_tags_registers_one_field_predicate() {
    init_tracing();
    let mut builder = doc_builder("q1");
    let before = builder.predicate_count();

    let predicates = Normalizer::default()
        .ingest(&QueryComponent::not_empty("tags"), &doc_descriptor(), &mut builder)
        .unwrap();

    assert_eq!(builder.predicate_count(), before + 1);
    assert_eq!(predicates.len(), 1);
    let predicate = &predicates[0];
    assert_eq!(predicate.kind(), PredicateKind::Placeholder);
    assert_eq!(
        predicate.value().map(|v| v.as_ref()),
        Some(Value::field(id("q1"), vec!["tags".into()]).as_ref())
    );
    assert_eq!(predicate.comparison(), Some(&Comparison::ListNotEmpty));
    assert_eq!(predicate.correlated_to(), CorrelationSet::from([id("q1")]));
}

#[test]
fn test_normalized_predicates_follow_alias_renaming() {
    let normalizer = Normalizer::default();
    let component = QueryComponent::and(vec![QueryComponent::empty("tags"), QueryComponent::not_empty("tags")]);

    let mut left = doc_builder("a");
    let mut right = doc_builder("b");
    normalizer.ingest(&component, &doc_descriptor(), &mut left).unwrap();
    normalizer.ingest(&component, &doc_descriptor(), &mut right).unwrap();

    let left = left.build();
    let right = right.build();
    assert!(left.semantic_equals(&right, &AliasMap::empty()));
    assert_eq!(left.semantic_hash(), right.semantic_hash());
    assert!(left.correlated_to().is_empty());
}

#[test]
fn test_emptiness_flag_survives_normalization() {
    let normalizer = Normalizer::default();
    let mut builder = doc_builder("q1");
    let empty = normalizer
        .ingest(&QueryComponent::empty("tags"), &doc_descriptor(), &mut builder)
        .unwrap();
    let not_empty = normalizer
        .ingest(&QueryComponent::not_empty("tags"), &doc_descriptor(), &mut builder)
        .unwrap();
    assert!(!empty[0].semantic_equals(&not_empty[0], &AliasMap::empty()));
}

#[test]
fn test_prefix_reaches_nested_record() {
    let normalizer = Normalizer::new(NormalizerConfig {
        validate_components: false,
        field_prefix: vec!["meta".into()],
    });
    let mut builder = doc_builder("q1");
    let predicates = normalizer
        .ingest(&QueryComponent::empty("labels"), &doc_descriptor(), &mut builder)
        .unwrap();
    assert_eq!(predicates[0].to_string(), "q1.meta.labels IS_EMPTY (?)");
}

#[test]
fn test_validation_follows_prefix_into_nested_record() {
    let normalizer = Normalizer::new(NormalizerConfig {
        validate_components: true,
        field_prefix: vec!["meta".into()],
    });

    let mut builder = doc_builder("q1");
    let predicates = normalizer
        .ingest(&QueryComponent::empty("labels"), &doc_descriptor(), &mut builder)
        .unwrap();
    assert_eq!(predicates[0].to_string(), "q1.meta.labels IS_EMPTY (?)");

    // `tags` is repeated on Doc but does not exist on Meta.
    let mut builder = doc_builder("q1");
    let err = normalizer
        .ingest(&QueryComponent::empty("tags"), &doc_descriptor(), &mut builder)
        .unwrap_err();
    assert_eq!(
        err,
        BridgeError::Validation(ValidationError::UnknownField {
            record_type: "Meta".into(),
            field: "tags".into()
        })
    );
    assert_eq!(builder.predicate_count(), 0);
}

#[test]
fn test_prefix_through_scalar_field_is_rejected() {
    let normalizer = Normalizer::new(NormalizerConfig {
        validate_components: true,
        field_prefix: vec!["title".into()],
    });
    let mut builder = doc_builder("q1");
    let err = normalizer
        .ingest(&QueryComponent::empty("labels"), &doc_descriptor(), &mut builder)
        .unwrap_err();
    assert_eq!(
        err,
        BridgeError::Validation(ValidationError::NotAMessage {
            record_type: "Doc".into(),
            field: "title".into()
        })
    );
}

#[test]
fn test_unknown_field_fails_before_planning() {
    let mut builder = doc_builder("q1");
    let err = Normalizer::default()
        .ingest(&QueryComponent::empty("authors"), &doc_descriptor(), &mut builder)
        .unwrap_err();
    assert_eq!(
        err,
        BridgeError::Validation(ValidationError::UnknownField {
            record_type: "Doc".into(),
            field: "authors".into()
        })
    );
    assert_eq!(builder.predicate_count(), 0);
}

#[test]
fn test_rules_see_normalized_conjuncts() {
    let mut builder = doc_builder("q1");
    let component = QueryComponent::and(vec![QueryComponent::empty("tags"), QueryComponent::not_empty("tags")]);
    Normalizer::default()
        .ingest(&component, &doc_descriptor(), &mut builder)
        .unwrap();
    let select = builder.build();

    let pattern = Pattern::select(vec![Pattern::scan()]);
    assert_eq!(select.bind_to(&pattern).count(), 1);

    let conjunction = recq_core::predicate::QueryPredicate::and(select_predicates(&select));
    let placeholders = Pattern::and_with(Pattern::bind("p", Pattern::placeholder()));
    let bound: Vec<_> = conjunction
        .bind_to(&placeholders)
        .filter_map(|b| b.get("p").and_then(Bindable::as_predicate).cloned())
        .collect();
    assert_eq!(bound.len(), 2);
}

fn select_predicates(
    expression: &RelationalExpression,
) -> Vec<std::sync::Arc<recq_core::predicate::QueryPredicate>> {
    match expression {
        RelationalExpression::Select(s) => s.predicates.clone(),
        _ => Vec::new(),
    }
}
