// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where a CAP project keeps the files that need to be read, or
//! managed in some way. Every path is derived from the project root, i.e.,
//! the directory holding the project's `package.json`.
//!
//! # Chart Layout
//!
//! ```text
//! <root>/
//! ├── package.json
//! └── chart/
//!     ├── Chart.yaml
//!     ├── values.yaml
//!     ├── runtime-values.yaml
//!     └── templates/
//!         └── cap-operator-cros.yaml
//! ```

use std::path::{Path, PathBuf};

/// Name of chart directory relative to project root.
pub const CHART_DIR: &str = "chart";

/// File layout of a CAP project and its chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Construct new layout rooted at given project directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Construct new layout rooted at current working directory.
    ///
    /// # Errors
    ///
    /// - Return [`NoWorkingDir`] if current working directory cannot be
    ///   determined.
    pub fn current() -> Result<Self> {
        std::env::current_dir().map(Self::new).map_err(NoWorkingDir)
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Resolve path relative to project root.
    ///
    /// Absolute paths are returned as they are.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    pub fn package_json(&self) -> PathBuf {
        self.root.join("package.json")
    }

    pub fn chart_dir(&self) -> PathBuf {
        self.root.join(CHART_DIR)
    }

    pub fn chart_yaml(&self) -> PathBuf {
        self.chart_dir().join("Chart.yaml")
    }

    pub fn values_yaml(&self) -> PathBuf {
        self.chart_dir().join("values.yaml")
    }

    pub fn runtime_values_yaml(&self) -> PathBuf {
        self.chart_dir().join("runtime-values.yaml")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.chart_dir().join("templates")
    }

    /// Path to manifest of CAP Operator custom resources.
    pub fn manifest(&self) -> PathBuf {
        self.templates_dir().join("cap-operator-cros.yaml")
    }
}

/// No way to determine current working directory.
#[derive(Debug, thiserror::Error)]
#[error("cannot determine current working directory")]
pub struct NoWorkingDir(#[source] std::io::Error);

/// Friendly result alias :3
pub type Result<T, E = NoWorkingDir> = std::result::Result<T, E>;
