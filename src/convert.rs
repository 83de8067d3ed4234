// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Conversion of simple charts into configurable template charts.
//!
//! Conversion runs the structural transformation over the chart's settings,
//! splices the resulting workload array and spec sections into the bundled
//! configurable manifest, and fills the settings up with the bundled
//! configurable defaults.
//!
//! # Write Order
//!
//! Files are written one at a time: manifest first, then settings, then the
//! chart marker. A run that dies halfway leaves an unmarked chart behind, so
//! it can be converted again after the settings are restored.

use crate::{
    chart::{Chart, ChartError, ChartKind},
    path::ProjectLayout,
    transform::{
        merge::merge_mapping,
        splice::{append_to_spec_section, replace_workloads_section, SpliceError},
        transform, TransformError, Transformed,
    },
};

use serde_yaml::Mapping;
use tracing::{info, instrument};

const CONFIGURABLE_MANIFEST: &str = include_str!("assets/configurable/cap-operator-cros.yaml");
const CONFIGURABLE_VALUES: &str = include_str!("assets/configurable/values.yaml");

/// Indentation of sections spliced into the manifest's spec block.
const SPEC_INDENT: usize = 2;

/// Converted chart content, not yet written anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub manifest: String,
    pub values: Mapping,
}

/// Build configurable template chart content out of simple chart settings.
///
/// # Errors
///
/// - Return [`ConvertError::Transform`] if settings are malformed.
/// - Return [`ConvertError::Splice`] if manifest cannot be spliced.
/// - Return [`ConvertError::Defaults`] if bundled defaults are malformed.
pub fn convert(values: Mapping) -> Result<Conversion> {
    let Transformed {
        mut settings,
        workloads,
        spec_sections,
    } = transform(values)?;

    let mut manifest = replace_workloads_section(CONFIGURABLE_MANIFEST, &workloads)?;
    for (key, value) in &spec_sections {
        manifest = append_to_spec_section(&manifest, key, value, SPEC_INDENT)?;
    }

    let defaults: Mapping = serde_yaml::from_str(CONFIGURABLE_VALUES).map_err(ConvertError::Defaults)?;
    merge_mapping(&defaults, &mut settings);

    Ok(Conversion {
        manifest,
        values: settings,
    })
}

/// Convert project's simple chart into a configurable template chart.
///
/// # Errors
///
/// - Return [`ConvertError::Chart`] if project has no CAP Operator chart, or
///   chart files cannot be read or written.
/// - Return [`ConvertError::AlreadyConfigurable`] if chart was converted
///   before.
/// - Return any error of [`convert`].
#[instrument(skip(layout), level = "debug")]
pub fn convert_to_configurable_template_chart(layout: &ProjectLayout) -> Result<()> {
    let mut chart = Chart::open(layout.clone())?;
    if chart.kind() == ChartKind::ConfigurableTemplates {
        return Err(ConvertError::AlreadyConfigurable);
    }

    let Conversion { manifest, values } = convert(chart.read_values()?)?;

    chart.write_manifest(&manifest)?;
    chart.write_values(&values)?;
    chart.mark_configurable()?;
    info!("Converted 'chart' folder into a configurable template chart.");

    Ok(())
}

/// Chart conversion error types.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Chart cannot be opened, read, or written.
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// Chart already is a configurable template chart.
    #[error("chart is already a configurable template chart")]
    AlreadyConfigurable,

    /// Settings cannot be transformed.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Manifest cannot be spliced.
    #[error(transparent)]
    Splice(#[from] SpliceError),

    /// Bundled defaults cannot be parsed.
    #[error("failed to parse bundled configurable chart defaults")]
    Defaults(#[source] serde_yaml::Error),
}

/// Friendly result alias :3
pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
