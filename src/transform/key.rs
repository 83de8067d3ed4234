// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workload key normalization.
//!
//! Helm templates cannot address values through hyphenated keys without
//! falling back to the `index` function, so every workload key that ends up
//! in a configurable template chart is turned into a camelCase identifier
//! first.

/// Convert hyphenated identifier into camelCase identifier.
///
/// The first segment is kept exactly as given, including its case. Every
/// following segment gets its first character uppercased, and all segments
/// are joined without a separator. Names without a hyphen come back
/// unchanged.
///
/// ```text
/// "content-deploy"    -> "contentDeploy"
/// "tenant-job-runner" -> "tenantJobRunner"
/// "server"            -> "server"
/// ```
pub fn normalize(name: impl AsRef<str>) -> String {
    let name = name.as_ref();
    if !name.contains('-') {
        return name.to_string();
    }

    let mut segments = name.split('-');
    let mut normalized = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            normalized.extend(first.to_uppercase());
            normalized.push_str(chars.as_str());
        }
    }

    normalized
}
