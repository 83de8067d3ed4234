// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Deep merge of settings trees.
//!
//! Chart values are assembled from several partial trees, e.g., bundled
//! defaults, generated snippets, and whatever the user already wrote into
//! `values.yaml`. Merging always distinguishes between a __source__ that only
//! supplies fallback values, and a __target__ whose own values are preferred.
//!
//! # Merge Rules
//!
//! - Mapping into mapping: keys missing from the target are copied over from
//!   the source. Keys present in both are merged recursively.
//! - Sequence into sequence: source elements come first, then target
//!   elements, and structurally equal elements are dropped after their first
//!   occurrence.
//! - Anything else: a defined target value wins. A null target takes the
//!   source value. A null source never replaces anything.

use serde_yaml::{Mapping, Value};

/// Merge source tree into target tree.
///
/// Mutates target in place, and hands it back for chaining.
///
/// # Invariant
///
/// - Defined scalar values in target are never overwritten, even when they
///   are falsy, e.g., `false`, `0`, or an empty string.
/// - Sequence ordering is source first, then target, deduplicated by first
///   occurrence.
pub fn merge<'a>(source: &Value, target: &'a mut Value) -> &'a mut Value {
    if target.is_null() {
        *target = source.clone();
        return target;
    }

    match (source, &mut *target) {
        (Value::Mapping(source), Value::Mapping(target)) => {
            merge_mapping(source, target);
        }
        (Value::Sequence(source), Value::Sequence(target)) => {
            let mut merged: Vec<Value> = Vec::with_capacity(source.len() + target.len());
            for item in source.iter().chain(target.iter()) {
                if !merged.contains(item) {
                    merged.push(item.clone());
                }
            }
            *target = merged;
        }
        _ => {}
    }

    target
}

/// Merge source mapping into target mapping.
///
/// Same rules as [`merge`], minus the need to wrap both sides in a
/// [`Value`] first.
pub fn merge_mapping<'a>(source: &Mapping, target: &'a mut Mapping) -> &'a mut Mapping {
    for (key, value) in source {
        match target.get_mut(key) {
            Some(existing) => {
                merge(value, existing);
            }
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }

    target
}
