// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Helm chart tooling for applications deployed through the CAP Operator.
//!
//! A CAP project gets its CAP Operator chart in a `chart/` directory. This
//! crate knows two things to do with that chart:
//!
//! - [`convert`] migrates a simple chart, whose settings tree holds every
//!   workload definition inline, into a configurable template chart, whose
//!   manifest holds the definitions and whose settings only hold images.
//! - [`runtime`] renders `chart/runtime-values.yaml` with the cluster and
//!   account details a deployment needs.
//!
//! Both are built on the structural engine in [`transform`], which works on
//! in-memory settings trees and manifest text only. File handling lives in
//! [`chart`] and [`path`].

pub mod chart;
pub mod config;
pub mod convert;
pub mod path;
pub mod prompt;
pub mod runtime;
pub mod transform;
