// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workload model and classification.
//!
//! A __workload__ is one deployable unit of an application. It is either a
//! long running deployment, or a run-to-completion job. In the settings tree
//! the difference only shows by which definition key is present:
//!
//! ```yaml
//! server:
//!   name: server
//!   deploymentDefinition:
//!     type: CAP
//!     image: registry/bookshop-srv:1.0
//!     env: [...]
//! tenant-job:
//!   jobDefinition:
//!     type: TenantOperation
//!     image: registry/bookshop-mtx:1.0
//! ```
//!
//! [`Workload::try_new`] turns that shape into a closed set of variants, and
//! rejects anything that carries zero or both definitions. Every other field
//! of the workload is kept verbatim and in order.

use crate::transform::env::{tenant_host_pattern_var, EnvError, EnvVars, Extraction};

use serde_yaml::{Mapping, Value};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use tracing::debug;

/// Key of long running workload definitions.
pub const DEPLOYMENT_DEFINITION: &str = "deploymentDefinition";

/// Key of run-to-completion workload definitions.
pub const JOB_DEFINITION: &str = "jobDefinition";

/// Types of deployment workloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentType {
    Cap,
    Router,
    Service,
    Additional,
}

impl FromStr for DeploymentType {
    type Err = ();

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            "CAP" => Ok(Self::Cap),
            "Router" => Ok(Self::Router),
            "Service" => Ok(Self::Service),
            "Additional" => Ok(Self::Additional),
            _ => Err(()),
        }
    }
}

impl Display for DeploymentType {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(match self {
            Self::Cap => "CAP",
            Self::Router => "Router",
            Self::Service => "Service",
            Self::Additional => "Additional",
        })
    }
}

/// Types of job workloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    TenantOperation,
    Content,
}

impl FromStr for JobType {
    type Err = ();

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            "TenantOperation" => Ok(Self::TenantOperation),
            "Content" => Ok(Self::Content),
            _ => Err(()),
        }
    }
}

impl Display for JobType {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(match self {
            Self::TenantOperation => "TenantOperation",
            Self::Content => "Content",
        })
    }
}

/// Definition kind and type tag of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    Deployment(DeploymentType),
    Job(JobType),
}

impl WorkloadKind {
    /// Settings key that holds the definition of this kind.
    pub fn definition_key(&self) -> &'static str {
        match self {
            Self::Deployment(_) => DEPLOYMENT_DEFINITION,
            Self::Job(_) => JOB_DEFINITION,
        }
    }
}

impl Display for WorkloadKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Deployment(kind) => write!(fmt, "{kind} deployment"),
            Self::Job(kind) => write!(fmt, "{kind} job"),
        }
    }
}

/// Environment rule that applies to a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvRule {
    /// Make sure the router knows the tenant host pattern.
    TenantHostPattern,

    /// Promote the database id out of `CDS_CONFIG`.
    DatabaseId,

    /// Leave environment alone.
    Untouched,
}

/// Result of classifying a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: WorkloadKind,
    pub rule: EnvRule,
}

impl Classification {
    pub fn has_router_env_rule(&self) -> bool {
        self.rule == EnvRule::TenantHostPattern
    }

    pub fn has_database_id_rule(&self) -> bool {
        self.rule == EnvRule::DatabaseId
    }
}

/// Decide which environment rule applies to a workload kind.
///
/// | definition | type | rule |
/// |---|---|---|
/// | deployment | `Router` | tenant host pattern |
/// | deployment | `CAP`, `Service` | database id |
/// | job | `TenantOperation` | database id |
/// | deployment | `Additional` | none |
/// | job | `Content` | none |
pub fn classify(kind: WorkloadKind) -> Classification {
    let rule = match kind {
        WorkloadKind::Deployment(DeploymentType::Router) => EnvRule::TenantHostPattern,
        WorkloadKind::Deployment(DeploymentType::Cap | DeploymentType::Service) => {
            EnvRule::DatabaseId
        }
        WorkloadKind::Job(JobType::TenantOperation) => EnvRule::DatabaseId,
        WorkloadKind::Deployment(DeploymentType::Additional) | WorkloadKind::Job(JobType::Content) => {
            EnvRule::Untouched
        }
    };

    Classification { kind, rule }
}

/// Validated workload entry of the settings tree.
///
/// # Invariant
///
/// - Exactly one definition, which is a mapping with a known type tag.
/// - Fields outside the definition keep their content and order.
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    key: String,
    kind: WorkloadKind,
    body: Mapping,
    definition: Mapping,
}

impl Workload {
    /// Validate settings tree node as workload.
    ///
    /// # Errors
    ///
    /// - Return [`WorkloadError::NotAMapping`] if node is not a mapping.
    /// - Return [`WorkloadError::MissingDefinition`] if neither definition
    ///   key is present.
    /// - Return [`WorkloadError::AmbiguousDefinition`] if both definition
    ///   keys are present.
    /// - Return [`WorkloadError::DefinitionNotAMapping`] if definition is
    ///   not a mapping.
    /// - Return [`WorkloadError::UnknownType`] if type tag is missing or not
    ///   valid for the definition kind.
    pub fn try_new(key: impl Into<String>, node: Value) -> Result<Self> {
        let key = key.into();
        let Value::Mapping(mut body) = node else {
            return Err(WorkloadError::NotAMapping { key });
        };

        let definition_key = match (
            body.contains_key(DEPLOYMENT_DEFINITION),
            body.contains_key(JOB_DEFINITION),
        ) {
            (true, false) => DEPLOYMENT_DEFINITION,
            (false, true) => JOB_DEFINITION,
            (false, false) => return Err(WorkloadError::MissingDefinition { key }),
            (true, true) => return Err(WorkloadError::AmbiguousDefinition { key }),
        };

        // INVARIANT: Leave null behind so the definition keeps its position.
        let definition = match body.get_mut(definition_key).map(std::mem::take) {
            Some(Value::Mapping(definition)) => definition,
            _ => {
                return Err(WorkloadError::DefinitionNotAMapping {
                    key,
                    definition: definition_key,
                })
            }
        };

        let type_name = definition
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let kind = if definition_key == DEPLOYMENT_DEFINITION {
            type_name.parse().map(WorkloadKind::Deployment)
        } else {
            type_name.parse().map(WorkloadKind::Job)
        }
        .map_err(|()| WorkloadError::UnknownType {
            key: key.clone(),
            definition: definition_key,
            type_name: type_name.to_string(),
        })?;

        Ok(Self {
            key,
            kind,
            body,
            definition,
        })
    }

    /// Key of workload in settings tree.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }

    pub fn classification(&self) -> Classification {
        classify(self.kind)
    }

    /// Give workload a leading `name` field equal to its key, unless it
    /// already has one.
    pub fn ensure_name(&mut self) {
        if self.body.contains_key("name") {
            return;
        }

        let mut body = Mapping::with_capacity(self.body.len() + 1);
        body.insert("name".into(), Value::String(self.key.clone()));
        body.extend(std::mem::take(&mut self.body));
        self.body = body;
    }

    /// Current image reference of workload.
    pub fn image(&self) -> Option<&Value> {
        self.definition.get("image")
    }

    /// Replace image reference of workload.
    pub fn set_image(&mut self, image: impl Into<Value>) {
        self.definition.insert("image".into(), image.into());
    }

    /// Check if definition lists any environment at all.
    pub fn has_env(&self) -> bool {
        self.definition.contains_key("env")
    }

    /// Decode environment of workload.
    ///
    /// # Errors
    ///
    /// - Return [`WorkloadError::Env`] if env is not a list of name/value
    ///   pairs.
    pub fn env(&self) -> Result<EnvVars> {
        let node = self.definition.get("env").unwrap_or(&Value::Null);
        EnvVars::from_value(node).map_err(|source| self.env_error(source))
    }

    /// Replace environment of workload.
    ///
    /// # Errors
    ///
    /// - Return [`WorkloadError::Env`] if env cannot be encoded.
    pub fn set_env(&mut self, env: &EnvVars) -> Result<()> {
        let node = env.to_value().map_err(|source| self.env_error(source))?;
        self.definition.insert("env".into(), node);
        Ok(())
    }

    /// Apply environment rule of workload's classification.
    ///
    /// Database id promotion only runs when the definition lists an env.
    /// Tenant host pattern is upserted, so applying it again changes nothing.
    ///
    /// # Errors
    ///
    /// - Return [`WorkloadError::Env`] if env cannot be decoded or encoded.
    pub fn apply_env_rule(&mut self, settings: &mut Mapping) -> Result<()> {
        let classification = self.classification();
        if classification.has_router_env_rule() {
            let mut env = self.env()?;
            env.upsert(tenant_host_pattern_var());
            self.set_env(&env)?;
        } else if classification.has_database_id_rule() && self.has_env() {
            let mut env = self.env()?;
            let extraction = env
                .extract_database_id(settings)
                .map_err(|source| self.env_error(source))?;
            if let Extraction::Promoted(_) = extraction {
                self.set_env(&env)?;
            }
            debug!("{} {}: {extraction:?}", self.kind, self.key);
        }

        Ok(())
    }

    /// Fold workload back into a settings tree node.
    pub fn into_value(self) -> Value {
        let mut body = self.body;
        body.insert(
            self.kind.definition_key().into(),
            Value::Mapping(self.definition),
        );
        Value::Mapping(body)
    }

    fn env_error(&self, source: EnvError) -> WorkloadError {
        WorkloadError::Env {
            key: self.key.clone(),
            source,
        }
    }
}

/// Workload validation error types.
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    /// Workload entry is not a mapping.
    #[error("workload {key:?} is not a mapping")]
    NotAMapping { key: String },

    /// Workload has neither definition.
    #[error("workload {key:?} has neither deploymentDefinition nor jobDefinition")]
    MissingDefinition { key: String },

    /// Workload has both definitions.
    #[error("workload {key:?} has both deploymentDefinition and jobDefinition")]
    AmbiguousDefinition { key: String },

    /// Definition is not a mapping.
    #[error("{definition} of workload {key:?} is not a mapping")]
    DefinitionNotAMapping {
        key: String,
        definition: &'static str,
    },

    /// Type tag is missing, or unknown for the definition kind.
    #[error("{definition} of workload {key:?} has unsupported type {type_name:?}")]
    UnknownType {
        key: String,
        definition: &'static str,
        type_name: String,
    },

    /// Environment of workload cannot be edited.
    #[error("cannot edit env of workload {key:?}")]
    Env {
        key: String,
        #[source]
        source: EnvError,
    },
}

/// Friendly result alias :3
pub type Result<T, E = WorkloadError> = std::result::Result<T, E>;
