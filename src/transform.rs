// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Structural chart transformation engine.
//!
//! A CAP Operator chart comes in two shapes. A __simple chart__ keeps every
//! workload definition inline in its settings tree (`values.yaml`), and ships
//! a static manifest. A __configurable template chart__ keeps only one image
//! reference per workload in its settings tree, while the full workload
//! definitions live in the manifest's `workloads:` array, wired back to the
//! settings through Helm template tokens.
//!
//! [`transform`] performs the one-way migration from the first shape to the
//! second on the settings tree. The pieces it is built from are usable on
//! their own:
//!
//! - [`key`] turns hyphenated workload keys into template-safe identifiers.
//! - [`merge`] deep merges partial settings trees.
//! - [`placeholder`] fills `${name}` tokens of bundled skeletons.
//! - [`env`] edits workload environment lists.
//! - [`workload`] validates and classifies workloads.
//! - [`splice`] edits manifest text without parsing it.
//!
//! # Non-Transactional
//!
//! The engine only ever works on in-memory values. Callers that write its
//! results to several files do so one file at a time. An interrupted run can
//! leave some files migrated and others not.

pub mod env;
pub mod key;
pub mod merge;
pub mod placeholder;
pub mod splice;
pub mod workload;

use crate::transform::workload::{Workload, WorkloadError};

use serde_yaml::{Mapping, Value};
use tracing::{debug, instrument};

/// Settings sections that belong to the manifest's spec block once a chart
/// is configurable.
pub const SPEC_SECTIONS: [&str; 3] = ["tenantOperations", "contentJobs", "serviceExposures"];

/// Result of structural chart transformation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Transformed {
    /// Updated settings tree. Its `workloads` hold only image references.
    pub settings: Mapping,

    /// Full workload definitions, in settings order, ready for splicing.
    pub workloads: Vec<Value>,

    /// Spec sections moved out of settings, in [`SPEC_SECTIONS`] order.
    pub spec_sections: Vec<(String, Value)>,
}

impl Transformed {
    /// Image map keyed by normalized workload key.
    pub fn images(&self) -> Option<&Mapping> {
        self.settings.get("workloads").and_then(Value::as_mapping)
    }
}

/// Move simple chart settings into configurable template chart shape.
///
/// Workloads are visited in settings order. Each one gets its environment
/// rule applied, its image recorded under its normalized key, and its image
/// replaced by `{{.Values.workloads.<key>.image}}`. Workloads without a
/// `name` are named after their original key. Everything else about a
/// workload is kept as is.
///
/// All workloads are validated before any of them is touched.
///
/// # Errors
///
/// - Return [`TransformError::WorkloadsNotAMapping`] if `workloads` is not a
///   mapping.
/// - Return [`TransformError::WorkloadKey`] if a workload key is not a
///   string.
/// - Return [`TransformError::Workload`] if a workload is malformed.
#[instrument(skip(settings), level = "debug")]
pub fn transform(mut settings: Mapping) -> Result<Transformed> {
    // INVARIANT: Leave null behind so `workloads` keeps its position.
    let entries = match settings.get_mut("workloads").map(std::mem::take) {
        Some(Value::Mapping(entries)) => entries,
        Some(Value::Null) | None => Mapping::new(),
        Some(_) => return Err(TransformError::WorkloadsNotAMapping),
    };

    let mut workloads = Vec::with_capacity(entries.len());
    for (key, node) in entries {
        let Value::String(key) = key else {
            return Err(TransformError::WorkloadKey(format!("{key:?}")));
        };
        workloads.push(Workload::try_new(key, node)?);
    }

    let mut images = Mapping::with_capacity(workloads.len());
    let mut definitions = Vec::with_capacity(workloads.len());
    for mut workload in workloads {
        workload.apply_env_rule(&mut settings)?;
        workload.ensure_name();

        let normalized = key::normalize(workload.key());
        let mut image = Mapping::new();
        image.insert(
            "image".into(),
            workload.image().cloned().unwrap_or(Value::Null),
        );
        images.insert(normalized.clone().into(), Value::Mapping(image));
        workload.set_image(format!("{{{{.Values.workloads.{normalized}.image}}}}"));

        debug!("moved {} {:?} to {normalized:?}", workload.kind(), workload.key());
        definitions.push(workload.into_value());
    }
    settings.insert("workloads".into(), Value::Mapping(images));

    let mut spec_sections = Vec::new();
    for section in SPEC_SECTIONS {
        if let Some(value) = settings.shift_remove(section) {
            spec_sections.push((section.to_string(), value));
        }
    }

    Ok(Transformed {
        settings,
        workloads: definitions,
        spec_sections,
    })
}

/// Structural transformation error types.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Settings `workloads` is not a mapping.
    #[error("settings workloads is not a mapping of workload keys to workloads")]
    WorkloadsNotAMapping,

    /// Workload key is not a string.
    #[error("workload key {0} is not a string")]
    WorkloadKey(String),

    /// Workload entry is malformed.
    #[error(transparent)]
    Workload(#[from] WorkloadError),
}

/// Friendly result alias :3
pub type Result<T, E = TransformError> = std::result::Result<T, E>;
