//! # Alias Maps
//!
//! An `AliasMap` is a partial, injective mapping between correlation
//! identifiers. It plays two roles:
//!
//! - **Substitution**: `rebase` translates every free identifier that is a
//!   source of the map to its target.
//! - **Equivalence**: `semantic_equals` uses the map to decide whether an
//!   identifier on one side corresponds to an identifier on the other side.
//!
//! Both directions are indexed so that `contains_target` and `get_source` are
//! as cheap as their forward counterparts.

use crate::correlation::CorrelationIdentifier;
use crate::error::AliasMapError;
use std::collections::HashMap;

/// Partial injective mapping `source -> target`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    forward: HashMap<CorrelationIdentifier, CorrelationIdentifier>,
    backward: HashMap<CorrelationIdentifier, CorrelationIdentifier>,
}

impl AliasMap {
    /// Map with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single-entry map.
    pub fn of(source: CorrelationIdentifier, target: CorrelationIdentifier) -> Self {
        let mut map = Self::default();
        map.forward.insert(source.clone(), target.clone());
        map.backward.insert(target, source);
        map
    }

    /// Map every identifier to itself.
    pub fn identity_of<'a>(ids: impl IntoIterator<Item = &'a CorrelationIdentifier>) -> Self {
        let mut map = Self::default();
        for id in ids {
            map.forward.insert(id.clone(), id.clone());
            map.backward.insert(id.clone(), id.clone());
        }
        map
    }

    /// Builder that checks injectivity on every `put`.
    pub fn builder() -> AliasMapBuilder {
        AliasMapBuilder { map: Self::default() }
    }

    /// Number of `source -> target` entries.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// True if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// True if `id` is in the domain.
    pub fn contains_source(&self, id: &CorrelationIdentifier) -> bool {
        self.forward.contains_key(id)
    }

    /// True if `id` is in the range.
    pub fn contains_target(&self, id: &CorrelationIdentifier) -> bool {
        self.backward.contains_key(id)
    }

    /// Image of `source`, if mapped.
    pub fn get_target(&self, source: &CorrelationIdentifier) -> Option<&CorrelationIdentifier> {
        self.forward.get(source)
    }

    /// Preimage of `target`, if any.
    pub fn get_source(&self, target: &CorrelationIdentifier) -> Option<&CorrelationIdentifier> {
        self.backward.get(target)
    }

    /// Translate `id`, falling back to `id` itself outside the domain.
    pub fn translate(&self, id: &CorrelationIdentifier) -> CorrelationIdentifier {
        self.forward.get(id).unwrap_or(id).clone()
    }

    /// True iff the map explicitly relates `a` to `b`.
    pub fn identifies_correlations(&self, a: &CorrelationIdentifier, b: &CorrelationIdentifier) -> bool {
        self.forward.get(a) == Some(b)
    }

    /// Correspondence used by every semantic equality in this crate: either
    /// the map relates `a` to `b`, or `a == b` and neither side is remapped.
    pub fn corresponds(&self, a: &CorrelationIdentifier, b: &CorrelationIdentifier) -> bool {
        match self.forward.get(a) {
            Some(target) => target == b,
            None => a == b && !self.backward.contains_key(b),
        }
    }

    /// Domain of the map, in no particular order.
    pub fn sources(&self) -> impl Iterator<Item = &CorrelationIdentifier> {
        self.forward.keys()
    }

    /// Range of the map, in no particular order.
    pub fn targets(&self) -> impl Iterator<Item = &CorrelationIdentifier> {
        self.backward.keys()
    }

    /// All `(source, target)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&CorrelationIdentifier, &CorrelationIdentifier)> {
        self.forward.iter()
    }

    /// Functional extension by one entry. Re-adding an existing entry is a
    /// no-op; conflicting entries are rejected.
    pub fn with(
        &self,
        source: CorrelationIdentifier,
        target: CorrelationIdentifier,
    ) -> Result<Self, AliasMapError> {
        let mut builder = AliasMapBuilder { map: self.clone() };
        builder.put(source, target)?;
        Ok(builder.build())
    }

    /// Union of two maps; fails if the union is not injective.
    pub fn combine(&self, other: &AliasMap) -> Result<Self, AliasMapError> {
        let mut builder = AliasMapBuilder { map: self.clone() };
        for (s, t) in other.iter() {
            builder.put(s.clone(), t.clone())?;
        }
        Ok(builder.build())
    }

    /// The map read backwards: every `target -> source`.
    pub fn inverse(&self) -> Self {
        Self {
            forward: self.backward.clone(),
            backward: self.forward.clone(),
        }
    }

    /// Copy of this map with the given sources removed. Used when descending
    /// below a node that re-binds those identifiers.
    pub fn without_sources<'a>(&self, ids: impl IntoIterator<Item = &'a CorrelationIdentifier>) -> Self {
        let mut map = self.clone();
        for id in ids {
            if let Some(target) = map.forward.remove(id) {
                map.backward.remove(&target);
            }
        }
        map
    }
}

/// Incremental, injectivity-checked construction of an [`AliasMap`].
#[derive(Debug, Default)]
pub struct AliasMapBuilder {
    map: AliasMap,
}

impl AliasMapBuilder {
    /// Add `source -> target`. Re-adding an identical entry is a no-op; an
    /// entry that would break injectivity is rejected.
    pub fn put(
        &mut self,
        source: CorrelationIdentifier,
        target: CorrelationIdentifier,
    ) -> Result<&mut Self, AliasMapError> {
        if let Some(existing) = self.map.forward.get(&source) {
            if *existing == target {
                return Ok(self);
            }
            return Err(AliasMapError::SourceAlreadyMapped {
                alias: source,
                existing: existing.clone(),
            });
        }
        if let Some(existing) = self.map.backward.get(&target) {
            return Err(AliasMapError::TargetAlreadyMapped {
                target,
                existing: existing.clone(),
            });
        }
        self.map.forward.insert(source.clone(), target.clone());
        self.map.backward.insert(target, source);
        Ok(self)
    }

    /// Finish building.
    pub fn build(self) -> AliasMap {
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> CorrelationIdentifier {
        CorrelationIdentifier::of(name)
    }

    #[test]
    fn test_translate_falls_back_to_identity() {
        let map = AliasMap::of(id("a"), id("b"));
        assert_eq!(map.translate(&id("a")), id("b"));
        assert_eq!(map.translate(&id("z")), id("z"));
        assert!(map.contains_source(&id("a")));
        assert!(map.contains_target(&id("b")));
        assert!(!map.contains_source(&id("b")));
    }

    #[test]
    fn test_identifies_correlations_is_directional() {
        let map = AliasMap::of(id("a"), id("b"));
        assert!(map.identifies_correlations(&id("a"), &id("b")));
        assert!(!map.identifies_correlations(&id("b"), &id("a")));
        assert!(!map.identifies_correlations(&id("c"), &id("c")));
    }

    #[test]
    fn test_corresponds_accepts_untouched_equal_identifiers() {
        let map = AliasMap::of(id("a"), id("b"));
        assert!(map.corresponds(&id("c"), &id("c")));
        assert!(map.corresponds(&id("a"), &id("b")));
        // `a` is remapped, so it no longer corresponds to itself.
        assert!(!map.corresponds(&id("a"), &id("a")));
        // `b` is already the image of `a`.
        assert!(!map.corresponds(&id("b"), &id("b")));
    }

    #[test]
    fn test_builder_rejects_non_injective_entries() {
        let mut builder = AliasMap::builder();
        builder.put(id("a"), id("x")).unwrap();
        builder.put(id("a"), id("x")).unwrap();
        assert!(matches!(
            builder.put(id("a"), id("y")),
            Err(AliasMapError::SourceAlreadyMapped { .. })
        ));
        assert!(matches!(
            builder.put(id("b"), id("x")),
            Err(AliasMapError::TargetAlreadyMapped { .. })
        ));
        assert_eq!(builder.build().len(), 1);
    }

    #[test]
    fn test_inverse_and_without_sources() {
        let map = AliasMap::of(id("a"), id("b")).with(id("c"), id("d")).unwrap();
        let inv = map.inverse();
        assert_eq!(inv.translate(&id("b")), id("a"));
        let trimmed = map.without_sources([&id("a")]);
        assert!(!trimmed.contains_source(&id("a")));
        assert!(!trimmed.contains_target(&id("b")));
        assert!(trimmed.contains_source(&id("c")));
    }

    #[test]
    fn test_combine_conflict() {
        let left = AliasMap::of(id("a"), id("b"));
        let right = AliasMap::of(id("c"), id("b"));
        assert!(left.combine(&right).is_err());
        let ok = left.combine(&AliasMap::of(id("c"), id("d"))).unwrap();
        assert_eq!(ok.len(), 2);
    }
}
