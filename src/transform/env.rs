// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Environment variable list editing.
//!
//! Workload definitions carry their environment as an ordered list of
//! `{name, value}` pairs. Most values are opaque scalars, with two
//! exceptions that the chart engine understands:
//!
//! - `CDS_CONFIG` may hold a JSON document. The HDI deployment service reads
//!   the database instance id from
//!   `requires → cds.xt.DeploymentService → hdi → create → database_id`.
//! - `TENANT_HOST_PATTERN` holds the regex the router uses to map incoming
//!   hosts onto tenants.
//!
//! # Uniqueness
//!
//! Variable names are unique inside one list. The schema does not enforce
//! this, so [`EnvVars::upsert`] is the only sanctioned way to add entries.

use crate::transform::merge::merge;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

/// Name of the variable holding embedded JSON configuration.
pub const CDS_CONFIG: &str = "CDS_CONFIG";

/// Name of the variable holding the router's tenant host regex.
pub const TENANT_HOST_PATTERN: &str = "TENANT_HOST_PATTERN";

/// Settings key that receives an extracted database instance id.
pub const HANA_INSTANCE_ID: &str = "hanaInstanceId";

/// Template token left behind in `CDS_CONFIG` after extraction.
pub const HANA_INSTANCE_ID_TOKEN: &str = "{{.Values.hanaInstanceId}}";

/// Template token resolved by Helm into the tenant host regex.
pub const TENANT_HOST_PATTERN_TOKEN: &str = "^(.*).{{ .Values.app.domains.primary }}";

const DATABASE_ID_POINTER: &str = "/requires/cds.xt.DeploymentService/hdi/create/database_id";

/// Single environment variable entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EnvVar {
    /// Variable name.
    pub name: String,

    /// Literal value, any scalar. Absent when the entry is sourced some
    /// other way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Remaining fields, e.g., `valueFrom`, kept as they are.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl EnvVar {
    /// Construct new name/value pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(Value::String(value.into())),
            extra: Mapping::new(),
        }
    }

    /// Literal value, if it is a string.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }
}

/// Tenant host pattern entry pointing at the chart's primary domain.
///
/// Always the same pair. Helm resolves the token when the chart is rendered.
pub fn tenant_host_pattern_var() -> EnvVar {
    EnvVar::new(TENANT_HOST_PATTERN, TENANT_HOST_PATTERN_TOKEN)
}

/// Outcome of database id extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// List has no `CDS_CONFIG` entry.
    NoConfig,

    /// `CDS_CONFIG` is valid JSON, but holds no usable database id.
    NoDatabaseId,

    /// `CDS_CONFIG` is not valid JSON. Entry left untouched.
    Malformed,

    /// Database id promoted into settings.
    Promoted(String),
}

/// Ordered environment variable list editor.
///
/// # Invariant
///
/// - No two entries share a name once edited through [`EnvVars::upsert`].
/// - Untouched entries keep their relative order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnvVars {
    vars: Vec<EnvVar>,
}

impl EnvVars {
    /// Construct new empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode list from settings tree node.
    ///
    /// A missing (null) node decodes into an empty list.
    ///
    /// # Errors
    ///
    /// - Return [`EnvError::Malformed`] if node is not a list of
    ///   name/value pairs.
    pub fn from_value(node: &Value) -> Result<Self> {
        if node.is_null() {
            return Ok(Self::new());
        }

        let vars = serde_yaml::from_value(node.clone()).map_err(EnvError::Malformed)?;
        Ok(Self { vars })
    }

    /// Encode list back into settings tree node.
    ///
    /// # Errors
    ///
    /// - Return [`EnvError::Encode`] if serialization fails.
    pub fn to_value(&self) -> Result<Value> {
        serde_yaml::to_value(&self.vars).map_err(EnvError::Encode)
    }

    /// Insert entry, or replace existing entry with the same name.
    ///
    /// Replacement swaps the whole entry at its current position. New names
    /// are appended.
    pub fn upsert(&mut self, entry: EnvVar) {
        match self.vars.iter().position(|var| var.name == entry.name) {
            Some(index) => self.vars[index] = entry,
            None => self.vars.push(entry),
        }
    }

    /// Lookup entry by name.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&EnvVar> {
        self.vars.iter().find(|var| var.name == name.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvVar> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Pull database id out of `CDS_CONFIG`, and promote it into settings.
    ///
    /// When `CDS_CONFIG` holds a usable database id, it is copied into
    /// `settings.hanaInstanceId`, and replaced in the embedded JSON by
    /// [`HANA_INSTANCE_ID_TOKEN`]. The original id does not appear in the
    /// entry afterwards.
    ///
    /// Malformed JSON is logged as a warning and leaves the entry alone.
    ///
    /// # Errors
    ///
    /// - Return [`EnvError::Json`] if updated JSON cannot be re-encoded.
    pub fn extract_database_id(&mut self, settings: &mut Mapping) -> Result<Extraction> {
        let Some(index) = self.vars.iter().position(|var| var.name == CDS_CONFIG) else {
            return Ok(Extraction::NoConfig);
        };
        let Some(raw) = self.vars[index].value_str() else {
            return Ok(Extraction::NoDatabaseId);
        };

        let mut config: serde_json::Value = match serde_json::from_str(raw) {
            Ok(config) => config,
            Err(error) => {
                warn!("skipping {CDS_CONFIG}, value is not valid JSON: {error}");
                return Ok(Extraction::Malformed);
            }
        };

        let Some(database_id) = config.pointer_mut(DATABASE_ID_POINTER) else {
            return Ok(Extraction::NoDatabaseId);
        };

        let id = match database_id {
            serde_json::Value::String(id) if !id.is_empty() => id.clone(),
            serde_json::Value::Number(id) if id.as_f64() != Some(0.0) => id.to_string(),
            _ => {
                debug!("{CDS_CONFIG} database id is empty, nothing to promote");
                return Ok(Extraction::NoDatabaseId);
            }
        };

        *database_id = serde_json::Value::String(HANA_INSTANCE_ID_TOKEN.into());
        self.vars[index].value = Some(Value::String(serde_json::to_string(&config)?));
        let previous = settings.insert(HANA_INSTANCE_ID.into(), Value::String(id.clone()));
        if let Some(previous) = previous.as_ref().and_then(Value::as_str) {
            if previous != id {
                warn!(
                    "{HANA_INSTANCE_ID} {previous:?} replaced by {id:?}, every workload now points at {id:?}"
                );
            }
        }
        debug!("promoted database id {id:?} into {HANA_INSTANCE_ID}");

        Ok(Extraction::Promoted(id))
    }

    /// Point `CDS_CONFIG` at a database instance.
    ///
    /// Existing configuration is deep merged underneath the new database id,
    /// so unrelated settings survive. A missing `CDS_CONFIG` entry is created.
    /// Malformed JSON is logged as a warning and leaves the entry alone.
    ///
    /// Returns whether the list changed.
    ///
    /// # Errors
    ///
    /// - Return [`EnvError::Json`] if configuration cannot be encoded.
    /// - Return [`EnvError::Encode`] if configuration cannot be merged.
    pub fn upsert_database_id(&mut self, database_id: impl AsRef<str>) -> Result<bool> {
        let hana = serde_json::json!({
            "requires": {
                "cds.xt.DeploymentService": {
                    "hdi": { "create": { "database_id": database_id.as_ref() } }
                }
            }
        });

        let config = match self.get(CDS_CONFIG).and_then(EnvVar::value_str) {
            Some(existing) => {
                let existing: Value = match serde_json::from_str(existing) {
                    Ok(existing) => existing,
                    Err(error) => {
                        warn!("leaving {CDS_CONFIG} untouched, value is not valid JSON: {error}");
                        return Ok(false);
                    }
                };
                let mut preferred = serde_yaml::to_value(&hana).map_err(EnvError::Encode)?;
                merge(&existing, &mut preferred);
                serde_json::to_string(&preferred)?
            }
            None => serde_json::to_string(&hana)?,
        };

        self.upsert(EnvVar::new(CDS_CONFIG, config));
        Ok(true)
    }
}

impl From<Vec<EnvVar>> for EnvVars {
    fn from(vars: Vec<EnvVar>) -> Self {
        let mut env = Self::new();
        for var in vars {
            env.upsert(var);
        }
        env
    }
}

/// Environment list editing error types.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// Node is not a list of name/value pairs.
    #[error("env is not a list of name/value pairs")]
    Malformed(#[source] serde_yaml::Error),

    /// List cannot be encoded back into settings tree.
    #[error("failed to encode env list")]
    Encode(#[source] serde_yaml::Error),

    /// Embedded JSON configuration cannot be encoded.
    #[error("failed to encode CDS_CONFIG")]
    Json(#[from] serde_json::Error),
}

/// Friendly result alias :3
pub type Result<T, E = EnvError> = std::result::Result<T, E>;
