//! Keyed child mappings and the merge that preserves leaving children's
//! slots.
//!
//! A group reconciles its children by key. Between two render passes, keys
//! present only in the previous pass are *leaving*: they must keep their
//! visual position while their leave transition plays out, so the merge
//! splices them back into the next pass's order right before the first
//! following key both passes share.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{Result, UsageError};

/// Ordered key → value mapping for one render pass of a keyed collection.
pub type ChildMapping<V> = IndexMap<String, V>;

/// Build a validated mapping from `(key, value)` pairs.
///
/// Fails when a key is empty or occurs more than once; reconciliation is
/// meaningless without stable unique keys.
pub fn child_mapping_from_pairs<V>(
    pairs: impl IntoIterator<Item = (String, V)>,
) -> Result<ChildMapping<V>> {
    let mut mapping = IndexMap::new();
    for (index, (key, value)) in pairs.into_iter().enumerate() {
        if key.is_empty() {
            return Err(UsageError::EmptyKey { index });
        }
        if mapping.insert(key.clone(), value).is_some() {
            return Err(UsageError::DuplicateKey { key });
        }
    }
    Ok(mapping)
}

/// Merge the previous and next mappings of a keyed collection.
///
/// Keys present in both take `next`'s value and `next`'s relative order.
/// Keys only in `prev` are spliced immediately before the first later
/// `prev` key that still exists in `next`; runs with no such anchor are
/// appended at the end. The result is the definitive render order for the
/// pass, leaving children included.
pub fn merge_mappings<V: Clone>(
    prev: &ChildMapping<V>,
    next: &ChildMapping<V>,
) -> ChildMapping<V> {
    // Walk prev once, batching runs of leaving keys onto the shared key
    // that follows them.
    let mut pending: Vec<&str> = Vec::new();
    let mut pending_before: HashMap<&str, Vec<&str>> = HashMap::new();
    for prev_key in prev.keys() {
        if next.contains_key(prev_key) {
            if !pending.is_empty() {
                pending_before.insert(prev_key.as_str(), std::mem::take(&mut pending));
            }
        } else {
            pending.push(prev_key.as_str());
        }
    }

    let mut merged = ChildMapping::with_capacity(prev.len() + next.len());
    let emit = |merged: &mut ChildMapping<V>, key: &str| {
        if let Some(value) = next.get(key).or_else(|| prev.get(key)) {
            merged.insert(key.to_string(), value.clone());
        }
    };
    for next_key in next.keys() {
        if let Some(leaving) = pending_before.get(next_key.as_str()) {
            for key in leaving {
                emit(&mut merged, key);
            }
        }
        emit(&mut merged, next_key);
    }
    for key in &pending {
        emit(&mut merged, key);
    }
    merged
}
