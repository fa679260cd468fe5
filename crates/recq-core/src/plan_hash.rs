//! # Plan Hashing
//!
//! Plan hashes are structural fingerprints used as memoization keys. Two rules
//! apply to every implementation:
//!
//! - Combination is order-sensitive (`combine(&[a, b]) != combine(&[b, a])` in
//!   general), so operands of non-commutative operators stay distinguishable.
//! - Hashes never depend on process-local state such as allocation addresses,
//!   nor on the toolchain: strings and byte strings go through XXH3 over their
//!   raw bytes instead of `std::hash::Hash`, whose output is unspecified.
//!
//! A plan hash match is only ever a hint; a full equality check follows it, so
//! collisions are acceptable.

use xxhash_rust::xxh3::xxh3_64;

/// Something that has a structural plan hash.
pub trait PlanHashable {
    fn plan_hash(&self) -> u64;
}

/// Order-sensitive combination of component hashes (`31 * h + x`).
pub fn combine(parts: &[u64]) -> u64 {
    parts
        .iter()
        .fold(1u64, |acc, part| acc.wrapping_mul(31).wrapping_add(*part))
}

/// XXH3 of raw bytes.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// XXH3 of the UTF-8 bytes of `s`.
pub fn hash_str(s: &str) -> u64 {
    hash_bytes(s.as_bytes())
}

/// Hash of a field path. Component boundaries count: `["a", "b"]` and
/// `["ab"]` hash differently.
pub fn hash_path(names: &[String]) -> u64 {
    let mut parts = Vec::with_capacity(names.len() + 1);
    parts.push(names.len() as u64);
    parts.extend(names.iter().map(|n| hash_str(n)));
    combine(&parts)
}
