// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Chart directory handle.
//!
//! A project's `chart/` directory only counts as a CAP Operator chart when
//! its `Chart.yaml` says so through an annotation:
//!
//! ```yaml
//! annotations:
//!   app.kubernetes.io/managed-by: cap-operator-plugin
//!   cap-operator-plugin/chart-kind: configurable-templates
//! ```
//!
//! The second annotation is only present once a chart has been converted
//! into a configurable template chart. Conversion is one way, so this marker
//! is what keeps it from running twice.

use crate::path::ProjectLayout;

use serde_yaml::{Mapping, Value};
use std::{
    fs::{read_to_string, write},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Annotation naming the tool that manages a chart.
pub const MANAGED_BY_KEY: &str = "app.kubernetes.io/managed-by";

/// Value of [`MANAGED_BY_KEY`] for CAP Operator charts.
pub const MANAGED_BY: &str = "cap-operator-plugin";

/// Annotation naming the shape of a CAP Operator chart.
pub const CHART_KIND_KEY: &str = "cap-operator-plugin/chart-kind";

/// Value of [`CHART_KIND_KEY`] for configurable template charts.
pub const CONFIGURABLE_TEMPLATES: &str = "configurable-templates";

/// Shape of a CAP Operator chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Workload definitions live inline in settings.
    Simple,

    /// Workload definitions live in the manifest.
    ConfigurableTemplates,
}

/// Opened CAP Operator chart.
#[derive(Debug, Clone)]
pub struct Chart {
    layout: ProjectLayout,
    metadata: Mapping,
}

impl Chart {
    /// Open CAP Operator chart of project.
    ///
    /// # Errors
    ///
    /// - Return [`ChartError::NotCapOperatorChart`] if project has no chart,
    ///   or chart is not managed by this plugin.
    /// - Return [`ChartError::ReadFile`] if `Chart.yaml` cannot be read.
    /// - Return [`ChartError::Parse`] if `Chart.yaml` is not a YAML mapping.
    #[instrument(skip(layout), level = "debug")]
    pub fn open(layout: ProjectLayout) -> Result<Self> {
        let path = layout.chart_yaml();
        let data = match read_to_string(&path) {
            Ok(data) => data,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("no chart metadata at {}", path.display());
                return Err(ChartError::NotCapOperatorChart);
            }
            Err(source) => return Err(ChartError::ReadFile { source, path }),
        };

        let metadata = parse_mapping(&data, &path)?;
        let chart = Self { layout, metadata };
        if chart.annotation(MANAGED_BY_KEY) != Some(MANAGED_BY) {
            debug!("chart at {} is not managed by {MANAGED_BY}", path.display());
            return Err(ChartError::NotCapOperatorChart);
        }

        Ok(chart)
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn kind(&self) -> ChartKind {
        match self.annotation(CHART_KIND_KEY) {
            Some(CONFIGURABLE_TEMPLATES) => ChartKind::ConfigurableTemplates,
            _ => ChartKind::Simple,
        }
    }

    /// Read settings tree of chart.
    ///
    /// An empty `values.yaml` reads as an empty mapping.
    ///
    /// # Errors
    ///
    /// - Return [`ChartError::ReadFile`] if `values.yaml` cannot be read.
    /// - Return [`ChartError::Parse`] if `values.yaml` is not a YAML mapping.
    pub fn read_values(&self) -> Result<Mapping> {
        let path = self.layout.values_yaml();
        let data = read_to_string(&path).map_err(|source| ChartError::ReadFile {
            source,
            path: path.clone(),
        })?;
        parse_mapping(&data, &path)
    }

    /// Overwrite settings tree of chart.
    ///
    /// # Errors
    ///
    /// - Return [`ChartError::Serialize`] if settings cannot be serialized.
    /// - Return [`ChartError::WriteFile`] if `values.yaml` cannot be written.
    pub fn write_values(&self, values: &Mapping) -> Result<()> {
        write_yaml(&self.layout.values_yaml(), values)
    }

    /// Overwrite runtime settings of chart.
    ///
    /// # Errors
    ///
    /// - Return [`ChartError::Serialize`] if settings cannot be serialized.
    /// - Return [`ChartError::WriteFile`] if `runtime-values.yaml` cannot be
    ///   written.
    pub fn write_runtime_values(&self, values: &Mapping) -> Result<()> {
        write_yaml(&self.layout.runtime_values_yaml(), values)
    }

    /// Overwrite manifest of chart with raw text.
    ///
    /// Creates the templates directory if needed.
    ///
    /// # Errors
    ///
    /// - Return [`ChartError::CreateDir`] if templates directory cannot be
    ///   created.
    /// - Return [`ChartError::WriteFile`] if manifest cannot be written.
    pub fn write_manifest(&self, manifest: &str) -> Result<()> {
        let dir = self.layout.templates_dir();
        mkdirp::mkdirp(&dir).map_err(|source| ChartError::CreateDir {
            source,
            path: dir.clone(),
        })?;

        let path = self.layout.manifest();
        write(&path, manifest).map_err(|source| ChartError::WriteFile { source, path })
    }

    /// Mark chart as configurable template chart in `Chart.yaml`.
    ///
    /// # Errors
    ///
    /// - Return [`ChartError::Serialize`] if metadata cannot be serialized.
    /// - Return [`ChartError::WriteFile`] if `Chart.yaml` cannot be written.
    pub fn mark_configurable(&mut self) -> Result<()> {
        let annotations = self
            .metadata
            .entry("annotations".into())
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !annotations.is_mapping() {
            *annotations = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(annotations) = annotations {
            annotations.insert(CHART_KIND_KEY.into(), CONFIGURABLE_TEMPLATES.into());
        }

        write_yaml(&self.layout.chart_yaml(), &self.metadata)
    }

    fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata
            .get("annotations")
            .and_then(|annotations| annotations.get(key))
            .and_then(Value::as_str)
    }
}

fn parse_mapping(data: &str, path: &Path) -> Result<Mapping> {
    if data.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value = serde_yaml::from_str(data).map_err(|source| ChartError::Parse {
        source,
        path: path.into(),
    })?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ChartError::NotAMapping { path: path.into() }),
    }
}

fn write_yaml(path: &Path, value: &Mapping) -> Result<()> {
    let data = serde_yaml::to_string(value).map_err(|source| ChartError::Serialize {
        source,
        path: path.into(),
    })?;
    debug!("writing {}", path.display());
    write(path, data).map_err(|source| ChartError::WriteFile {
        source,
        path: path.into(),
    })
}

/// Chart interaction error types.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// Project has no chart managed by this plugin.
    #[error(
        "No CAP Operator chart found in the project. Please run 'cds add cap-operator --force' to add the CAP Operator chart folder."
    )]
    NotCapOperatorChart,

    /// Chart file cannot be read.
    #[error("failed to read chart file at {:?}", path.display())]
    ReadFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Chart file cannot be written.
    #[error("failed to write chart file at {:?}", path.display())]
    WriteFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Chart directory cannot be created.
    #[error("failed to create chart directory at {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Chart file holds invalid YAML.
    #[error("failed to parse chart file at {:?}", path.display())]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },

    /// Chart file holds YAML that is not a mapping.
    #[error("chart file at {:?} is not a YAML mapping", path.display())]
    NotAMapping { path: PathBuf },

    /// Chart data cannot be serialized.
    #[error("failed to serialize chart file at {:?}", path.display())]
    Serialize {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ChartError> = std::result::Result<T, E>;
