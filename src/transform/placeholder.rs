// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Placeholder substitution over settings trees.
//!
//! Bundled skeletons mark the spots that depend on user answers with
//! `${name}` tokens. Substitution walks a parsed tree and rewrites every
//! string leaf. Mapping keys are left alone.

use serde_yaml::Value;
use std::collections::BTreeMap;

/// Flat table of placeholder names to their replacement text.
pub type Replacements = BTreeMap<String, String>;

/// Replace every `${name}` token in string leaves of a tree.
///
/// Each occurrence is replaced, not just the first one. Placeholder names
/// are matched literally. Non-string leaves pass through unchanged.
pub fn substitute<'a>(node: &'a mut Value, replacements: &Replacements) -> &'a mut Value {
    match node {
        Value::Sequence(items) => {
            for item in items.iter_mut() {
                substitute(item, replacements);
            }
        }
        Value::Mapping(mapping) => {
            for (_, value) in mapping.iter_mut() {
                substitute(value, replacements);
            }
        }
        Value::String(text) => {
            for (placeholder, value) in replacements {
                let token = format!("${{{placeholder}}}");
                if text.contains(&token) {
                    *text = text.replace(&token, value);
                }
            }
        }
        Value::Tagged(tagged) => {
            substitute(&mut tagged.value, replacements);
        }
        _ => {}
    }

    node
}
