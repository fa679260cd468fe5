//! # Correlation Identifiers
//!
//! A correlation identifier names a binding (usually the row produced by a
//! quantifier) so that other parts of a tree can refer to it before it is
//! materialized. Identifiers are opaque: equality means "same binding" and
//! nothing else.
//!
//! ## Minting
//!
//! `CorrelationIdentifier::unique()` draws from a process-wide atomic counter.
//! Identifiers survive rewrites that move subtrees around, so uniqueness must
//! hold across the whole process and not just within one subtree.
//!
//! ## The `Correlated` Capability
//!
//! Every node family (values, predicates, relational expressions, quantifiers)
//! implements [`Correlated`]: it can report the identifiers it reads, rebase
//! itself through an [`AliasMap`], and compare/hash itself modulo a consistent
//! renaming of those identifiers.

use crate::alias_map::AliasMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque name of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationIdentifier(Binding);

/// Caller-chosen names and minted identifiers live in separate namespaces, so
/// no name passed to `of` can equal a minted identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
enum Binding {
    Named(Arc<str>),
    Minted(u64),
}

impl CorrelationIdentifier {
    /// Wrap an externally chosen name. The caller is responsible for not
    /// reusing a name that denotes a different binding.
    pub fn of(name: impl AsRef<str>) -> Self {
        Self(Binding::Named(Arc::from(name.as_ref())))
    }

    /// Mint an identifier that differs from every other identifier in this
    /// process, minted or named.
    pub fn unique() -> Self {
        Self(Binding::Minted(NEXT_ID.fetch_add(1, Ordering::Relaxed)))
    }

    /// Whether this identifier came from [`CorrelationIdentifier::unique`].
    pub fn is_minted(&self) -> bool {
        matches!(self.0, Binding::Minted(_))
    }
}

impl fmt::Display for CorrelationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Binding::Named(name) => write!(f, "{name}"),
            Binding::Minted(n) => write!(f, "_q{n}"),
        }
    }
}

/// Set of correlation identifiers. Ordered so that debug output and iteration
/// are deterministic.
pub type CorrelationSet = BTreeSet<CorrelationIdentifier>;

/// Capability shared by all IR node families.
///
/// Nodes are immutable and live behind `Arc` handles. `rebase` takes the
/// handle so that it can hand the very same allocation back when the map does
/// not touch any free identifier of the node.
pub trait Correlated {
    /// Free identifiers this node reads. Identifiers bound by the node itself
    /// are not included.
    fn correlated_to(&self) -> CorrelationSet;

    /// Substitute free identifiers according to `map`. Must return a handle
    /// pointing to the same allocation if no free identifier is a source of
    /// `map`.
    fn rebase(self: &Arc<Self>, map: &AliasMap) -> Arc<Self>;

    /// Structural equality where embedded identifiers are compared through
    /// `map` instead of by raw value.
    fn semantic_equals(&self, other: &Self, map: &AliasMap) -> bool;

    /// Hash that is stable under any consistent renaming of identifiers.
    fn semantic_hash(&self) -> u64;

    /// Whether `map` would change anything if this node were rebased through it.
    fn is_affected_by(&self, map: &AliasMap) -> bool {
        self.correlated_to().iter().any(|id| map.contains_source(id))
    }
}

/// Rebase every element of an ordered list of nodes. Returns `None` when no
/// element changed, so callers can hand back the original container.
pub fn rebase_all<T: Correlated>(items: &[Arc<T>], map: &AliasMap) -> Option<Vec<Arc<T>>> {
    let rebased: Vec<Arc<T>> = items.iter().map(|item| item.rebase(map)).collect();
    let changed = items
        .iter()
        .zip(rebased.iter())
        .any(|(before, after)| !Arc::ptr_eq(before, after));
    changed.then_some(rebased)
}

/// Pairwise semantic equality of two ordered lists.
pub fn semantic_equals_all<T: Correlated>(left: &[Arc<T>], right: &[Arc<T>], map: &AliasMap) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|(a, b)| a.semantic_equals(b, map))
}
