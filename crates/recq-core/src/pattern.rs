//! # Pattern Matching and Bindings
//!
//! Rewrite rules describe the shape of the trees they apply to with a
//! `Pattern`. Matching a node against a pattern yields a sequence of
//! [`PlannerBindings`], one per way the node matches. Most patterns match in
//! at most one way; `Pattern::AnyChild` can match once per child.
//!
//! ## Pattern Language
//!
//! - `Pattern::Node(matcher, children)`: the node's kind satisfies `matcher` and
//!   its children match `children` position by position.
//! - `Pattern::Any`: matches anything.
//! - `Pattern::Leaf`: matches nodes without children.
//! - `Pattern::AnyChild(p)`: some child matches `p`; one result per match.
//! - `Pattern::Bind(key, p)`: matches like `p` and records the node under `key`.
//!
//! ## Children
//!
//! - Value and placeholder predicates have their value as only child.
//! - Connectives have their child predicates.
//! - Relational expressions have the children of their quantifiers.
//!
//! ## Laziness
//!
//! `match_with` returns a lazy iterator built fresh on each call. Nodes keep no
//! iteration state, so the same node can be matched repeatedly or from several
//! threads at once.

use crate::expression::{ExpressionKind, RelationalExpression};
use crate::predicate::{PredicateKind, QueryPredicate};
use crate::value::Value;
use std::collections::BTreeMap;
use std::iter;
use std::sync::Arc;

/// A node that patterns can match and bindings can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bindable {
    Value(Arc<Value>),
    Predicate(Arc<QueryPredicate>),
    Expression(Arc<RelationalExpression>),
}

impl Bindable {
    /// Child nodes, in pattern order.
    pub fn children(&self) -> Vec<Bindable> {
        match self {
            Bindable::Value(_) => Vec::new(),
            Bindable::Predicate(p) => match p.value() {
                Some(value) => vec![Bindable::Value(Arc::clone(value))],
                None => p.children().iter().cloned().map(Bindable::Predicate).collect(),
            },
            Bindable::Expression(e) => e
                .quantifiers()
                .iter()
                .map(|q| Bindable::Expression(Arc::clone(&q.ranges_over)))
                .collect(),
        }
    }

    /// The value, if this is a value node.
    pub fn as_value(&self) -> Option<&Arc<Value>> {
        match self {
            Bindable::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The predicate, if this is a predicate node.
    pub fn as_predicate(&self) -> Option<&Arc<QueryPredicate>> {
        match self {
            Bindable::Predicate(p) => Some(p),
            _ => None,
        }
    }

    /// The expression, if this is a relational expression node.
    pub fn as_expression(&self) -> Option<&Arc<RelationalExpression>> {
        match self {
            Bindable::Expression(e) => Some(e),
            _ => None,
        }
    }
}

/// Kind test for a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeMatcher {
    Predicate(PredicateKind),
    Expression(ExpressionKind),
    AnyPredicate,
    AnyExpression,
    AnyValue,
}

impl NodeMatcher {
    /// Whether the kind of `node` satisfies this matcher.
    pub fn matches(&self, node: &Bindable) -> bool {
        match (self, node) {
            (NodeMatcher::Predicate(kind), Bindable::Predicate(p)) => p.kind() == *kind,
            (NodeMatcher::Expression(kind), Bindable::Expression(e)) => e.kind() == *kind,
            (NodeMatcher::AnyPredicate, Bindable::Predicate(_)) => true,
            (NodeMatcher::AnyExpression, Bindable::Expression(_)) => true,
            (NodeMatcher::AnyValue, Bindable::Value(_)) => true,
            _ => false,
        }
    }
}

/// Pattern for matching IR trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Node(NodeMatcher, Vec<Pattern>),
    Any,
    Leaf,
    AnyChild(Box<Pattern>),
    Bind(String, Box<Pattern>),
}

/// Result of one successful match: nodes recorded by `Pattern::Bind`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannerBindings {
    bindings: BTreeMap<String, Vec<Bindable>>,
}

impl PlannerBindings {
    /// Bindings with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bindings holding `node` under `key`.
    pub fn of(key: impl Into<String>, node: Bindable) -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert(key.into(), vec![node]);
        Self { bindings }
    }

    /// First node bound under `key`.
    pub fn get(&self, key: &str) -> Option<&Bindable> {
        self.bindings.get(key).and_then(|nodes| nodes.first())
    }

    /// All nodes bound under `key`, in match order.
    pub fn get_all(&self, key: &str) -> &[Bindable] {
        self.bindings.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether anything is bound under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    /// True if no node is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Union of two bindings; nodes under the same key are concatenated.
    pub fn merged(&self, other: &PlannerBindings) -> PlannerBindings {
        let mut bindings = self.bindings.clone();
        for (key, nodes) in &other.bindings {
            bindings.entry(key.clone()).or_default().extend(nodes.iter().cloned());
        }
        PlannerBindings { bindings }
    }
}

/// Lazy sequence of match results.
pub type BindingsIter<'a> = Box<dyn Iterator<Item = PlannerBindings> + Send + 'a>;

impl Pattern {
    /// Match `pattern` and record the matched node under `key`.
    pub fn bind(key: impl Into<String>, pattern: Pattern) -> Self {
        Pattern::Bind(key.into(), Box::new(pattern))
    }

    /// Match if some child matches `pattern`, once per matching child.
    pub fn any_child(pattern: Pattern) -> Self {
        Pattern::AnyChild(Box::new(pattern))
    }

    /// A value predicate over any value.
    pub fn value_predicate() -> Self {
        Pattern::Node(NodeMatcher::Predicate(PredicateKind::Value), vec![Pattern::Any])
    }

    /// A placeholder predicate over any value.
    pub fn placeholder() -> Self {
        Pattern::Node(NodeMatcher::Predicate(PredicateKind::Placeholder), vec![Pattern::Any])
    }

    /// A conjunction with some conjunct matching `conjunct`.
    pub fn and_with(conjunct: Pattern) -> Self {
        Pattern::Node(
            NodeMatcher::Predicate(PredicateKind::And),
            vec![Pattern::any_child(conjunct)],
        )
    }

    /// A leaf unnesting expression.
    pub fn explode() -> Self {
        Pattern::Node(NodeMatcher::Expression(ExpressionKind::Explode), vec![])
    }

    /// A leaf scan.
    pub fn scan() -> Self {
        Pattern::Node(NodeMatcher::Expression(ExpressionKind::Scan), vec![])
    }

    /// A select whose quantifier children match `children` in order.
    pub fn select(children: Vec<Pattern>) -> Self {
        Pattern::Node(NodeMatcher::Expression(ExpressionKind::Select), children)
    }

    /// All ways `node` matches this pattern.
    pub fn match_with<'a>(&'a self, node: &Bindable) -> BindingsIter<'a> {
        match self {
            Pattern::Any => Box::new(iter::once(PlannerBindings::empty())),
            Pattern::Leaf => {
                if node.children().is_empty() {
                    Box::new(iter::once(PlannerBindings::empty()))
                } else {
                    Box::new(iter::empty())
                }
            }
            Pattern::Bind(key, inner) => {
                let bound = node.clone();
                Box::new(
                    inner
                        .match_with(node)
                        .map(move |b| b.merged(&PlannerBindings::of(key.as_str(), bound.clone()))),
                )
            }
            Pattern::AnyChild(inner) => Box::new(
                node.children()
                    .into_iter()
                    .flat_map(move |child| inner.match_with(&child)),
            ),
            Pattern::Node(matcher, child_patterns) => {
                if !matcher.matches(node) {
                    return Box::new(iter::empty());
                }
                match child_patterns.as_slice() {
                    // A single any-child test ranges over all children.
                    [Pattern::AnyChild(_)] => child_patterns[0].match_with(node),
                    _ => match_children(node.children(), child_patterns),
                }
            }
        }
    }

    /// Whether `node` matches in at least one way.
    pub fn matches(&self, node: &Bindable) -> bool {
        self.match_with(node).next().is_some()
    }
}

/// Cross product of the per-position child matches.
fn match_children<'a>(children: Vec<Bindable>, patterns: &'a [Pattern]) -> BindingsIter<'a> {
    if children.len() != patterns.len() {
        return Box::new(iter::empty());
    }
    let mut acc: BindingsIter<'a> = Box::new(iter::once(PlannerBindings::empty()));
    for (child, pattern) in children.into_iter().zip(patterns.iter()) {
        acc = Box::new(acc.flat_map(move |partial| {
            pattern
                .match_with(&child)
                .map(move |b| partial.merged(&b))
        }));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::Comparison;
    use crate::correlation::CorrelationIdentifier;
    use crate::quantifier::Quantifier;
    use crate::select::{ExpressionBuilder, SelectBuilder};

    fn id(name: &str) -> CorrelationIdentifier {
        CorrelationIdentifier::of(name)
    }

    fn conjunction() -> Arc<QueryPredicate> {
        QueryPredicate::and(vec![
            Value::field(id("q1"), vec!["a".into()]).with_comparison(Comparison::Null(true)),
            Value::field(id("q1"), vec!["b".into()]).unknown(Comparison::ListEmpty),
            Value::field(id("q1"), vec!["c".into()]).with_comparison(Comparison::Null(false)),
        ])
    }

    #[test]
    fn test_value_predicate_binds_value() {
        let p = Value::object(id("q1")).with_comparison(Comparison::ListEmpty);
        let pattern = Pattern::Node(
            NodeMatcher::Predicate(PredicateKind::Value),
            vec![Pattern::bind("v", Pattern::Node(NodeMatcher::AnyValue, vec![]))],
        );
        let results: Vec<_> = p.bind_to(&pattern).collect();
        assert_eq!(results.len(), 1);
        let bound = results[0].get("v").and_then(Bindable::as_value).unwrap();
        assert_eq!(bound.as_ref(), p.value().unwrap().as_ref());
    }

    #[test]
    fn test_any_child_matches_in_several_ways() {
        let p = conjunction();
        let pattern = Pattern::and_with(Pattern::bind("conjunct", Pattern::value_predicate()));
        let results: Vec<_> = p.bind_to(&pattern).collect();
        assert_eq!(results.len(), 2);
        let placeholder = Pattern::and_with(Pattern::bind("conjunct", Pattern::placeholder()));
        assert_eq!(p.bind_to(&placeholder).count(), 1);
    }

    #[test]
    fn test_bindings_are_reenumerable() {
        let p = conjunction();
        let pattern = Pattern::and_with(Pattern::value_predicate());
        let first: Vec<_> = p.bind_to(&pattern).collect();
        let second: Vec<_> = p.bind_to(&pattern).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_kind_mismatch_yields_nothing() {
        let p = Value::object(id("q1")).with_comparison(Comparison::ListEmpty);
        assert!(!Pattern::placeholder().matches(&Bindable::Predicate(p)));
    }

    #[test]
    fn test_select_children_match_positionally() {
        let base = Quantifier::for_each(RelationalExpression::scan(vec!["Order".into()]));
        let items = Quantifier::for_each(RelationalExpression::explode(base.alias.clone(), vec!["items".into()]));
        let mut builder = SelectBuilder::new(base);
        builder.add_quantifier(items);
        builder.add_predicate(QueryPredicate::constant(crate::truth::Truth::True));
        let select = builder.build();

        let pattern = Pattern::select(vec![Pattern::scan(), Pattern::bind("unnest", Pattern::explode())]);
        let results: Vec<_> = select.bind_to(&pattern).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].get("unnest").and_then(Bindable::as_expression).is_some());

        let swapped = Pattern::select(vec![Pattern::explode(), Pattern::scan()]);
        assert_eq!(select.bind_to(&swapped).count(), 0);
        assert_eq!(select.bind_to(&Pattern::select(vec![Pattern::Leaf, Pattern::Leaf])).count(), 1);
    }

    #[test]
    fn test_concurrent_probing() {
        let p = conjunction();
        let pattern = Pattern::and_with(Pattern::value_predicate());
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(|| p.bind_to(&pattern).count())).collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), 2);
            }
        });
    }
}
