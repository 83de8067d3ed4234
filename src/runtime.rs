// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Runtime values generation.
//!
//! A chart's `values.yaml` describes the application, but not where it gets
//! deployed to. That part goes into `chart/runtime-values.yaml`, rendered
//! from a bundled skeleton and the answers the user gives about their
//! cluster and global account.
//!
//! For simple charts, runtime values also carry an env overlay per workload,
//! so the router knows its tenant host pattern, and the CAP server and
//! tenant jobs know which database instance to use. Configurable template
//! charts wire env in their manifest, so they only receive the database
//! instance id at top level.

use crate::{
    chart::{Chart, ChartError, ChartKind},
    config::{expand_path, AppDetails, ConfigError, RuntimeAnswers},
    path::ProjectLayout,
    prompt::{PromptError, Prompter, Question},
    transform::{
        env::{EnvError, EnvVar, TENANT_HOST_PATTERN},
        placeholder::substitute,
        workload::{DeploymentType, JobType, Workload, WorkloadError, WorkloadKind},
    },
};

use serde_yaml::{Mapping, Value};
use std::{fs::read_to_string, path::PathBuf};
use tracing::{debug, info, instrument};

const RUNTIME_VALUES_SKELETON: &str = include_str!("assets/runtime-values.yaml");

/// Where answers come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSource {
    /// Ask the user.
    Prompts,

    /// Read input YAML file. Relative paths resolve against project root.
    InputYaml(String),
}

/// Generate `chart/runtime-values.yaml` for a project.
///
/// Returns the runtime values that were written.
///
/// # Errors
///
/// - Return [`RuntimeError::Chart`] if project has no CAP Operator chart, or
///   chart files cannot be read or written.
/// - Return [`RuntimeError::ReadFile`] if `package.json` or input YAML
///   cannot be read.
/// - Return [`RuntimeError::Config`] if answers are incomplete.
/// - Return [`RuntimeError::Prompt`] if prompting fails.
/// - Return [`RuntimeError::Workload`] if a workload of a simple chart is
///   malformed.
#[instrument(skip(layout, prompter), level = "debug")]
pub fn generate_runtime_values(
    layout: &ProjectLayout,
    source: AnswerSource,
    prompter: &mut impl Prompter,
) -> Result<Mapping> {
    let chart = Chart::open(layout.clone())?;
    debug!("found CAP Operator chart in {}", chart.layout().root().display());
    let app: AppDetails = read_file(chart.layout().package_json())?.parse()?;

    let mut answers = match source {
        AnswerSource::InputYaml(path) => {
            let path = chart.layout().resolve(expand_path(path)?);
            read_file(path)?.parse::<RuntimeAnswers>()?
        }
        AnswerSource::Prompts => prompt_answers(prompter, &app)?,
    };
    if app.description.is_some() {
        answers.app_description = app.description;
    }

    let mut runtime = render_skeleton(&answers)?;
    match chart.kind() {
        ChartKind::Simple => {
            let values = chart.read_values()?;
            runtime.insert("workloads".into(), Value::Mapping(env_overlay(&values, &answers)?));
        }
        ChartKind::ConfigurableTemplates => {
            if let Some(id) = &answers.hana_instance_id {
                runtime.insert("hanaInstanceId".into(), id.as_str().into());
            }
        }
    }

    chart.write_runtime_values(&runtime)?;
    info!("Generated 'runtime-values.yaml' file in the 'chart' folder.");

    Ok(runtime)
}

/// Collect runtime answers through a prompter.
///
/// # Errors
///
/// - Return [`RuntimeError::Prompt`] if prompting fails.
/// - Return [`RuntimeError::Config`] if a mandatory answer stays blank.
pub fn prompt_answers(prompter: &mut impl Prompter, app: &AppDetails) -> Result<RuntimeAnswers> {
    let mut ask = |question: Question| prompter.answer(&question);

    let answers = RuntimeAnswers {
        app_name: ask(Question::new("Enter app name for deployment:", true).with_default(&app.name))?,
        cap_operator_subdomain: ask(
            Question::new(
                "Enter CAP Operator subdomain (In kyma cluster it is \"cap-op\" by default):",
                true,
            )
            .with_default("cap-op"),
        )?,
        cluster_domain: ask(Question::new("Enter your cluster shoot domain:", true))?,
        global_account_id: ask(Question::new("Enter your global account ID:", true))?,
        provider_subdomain: ask(Question::new("Enter your provider subdomain:", true))?,
        tenant_id: ask(Question::new("Enter your provider tenant ID:", true))?,
        hana_instance_id: Some(ask(Question::new("Enter your HANA database instance ID:", false))?),
        image_pull_secret: Some(ask(Question::new("Enter your image pull secrets:", false))?),
        app_description: None,
    };

    Ok(answers.validate()?)
}

/// Render bundled runtime values skeleton with answers.
///
/// `imagePullSecrets` is dropped when no secret was given.
///
/// # Errors
///
/// - Return [`RuntimeError::Skeleton`] if bundled skeleton is not a YAML
///   mapping.
pub fn render_skeleton(answers: &RuntimeAnswers) -> Result<Mapping> {
    let mut skeleton: Value =
        serde_yaml::from_str(RUNTIME_VALUES_SKELETON).map_err(RuntimeError::Skeleton)?;
    substitute(&mut skeleton, &answers.replacements());

    let Value::Mapping(mut skeleton) = skeleton else {
        return Err(RuntimeError::SkeletonNotAMapping);
    };
    if answers.image_pull_secret.is_none() {
        skeleton.shift_remove("imagePullSecrets");
    }

    Ok(skeleton)
}

/// Build per-workload env overlay of a simple chart.
///
/// Every workload contributes its current env. `CAP` deployments and
/// `TenantOperation` jobs get `CDS_CONFIG` pointed at the database instance
/// when one was given. `Router` deployments get the tenant host pattern.
/// Workloads whose env ends up empty are left out.
///
/// # Errors
///
/// - Return [`RuntimeError::WorkloadsNotAMapping`] if `workloads` is not a
///   mapping.
/// - Return [`RuntimeError::Workload`] if a workload is malformed.
/// - Return [`RuntimeError::Env`] if `CDS_CONFIG` cannot be encoded.
pub fn env_overlay(values: &Mapping, answers: &RuntimeAnswers) -> Result<Mapping> {
    let workloads = match values.get("workloads") {
        Some(Value::Mapping(workloads)) => workloads.clone(),
        Some(Value::Null) | None => Mapping::new(),
        Some(_) => return Err(RuntimeError::WorkloadsNotAMapping),
    };

    let mut overlay = Mapping::new();
    for (key, node) in workloads {
        let Value::String(key) = key else {
            return Err(RuntimeError::WorkloadsNotAMapping);
        };
        let workload = Workload::try_new(key.as_str(), node)?;
        let mut env = workload.env()?;

        match (workload.kind(), answers.hana_instance_id.as_deref()) {
            (WorkloadKind::Deployment(DeploymentType::Cap), Some(id))
            | (WorkloadKind::Job(JobType::TenantOperation), Some(id)) => {
                env.upsert_database_id(id)?;
            }
            (WorkloadKind::Deployment(DeploymentType::Router), _) => {
                env.upsert(EnvVar::new(TENANT_HOST_PATTERN, answers.tenant_host_pattern()));
            }
            _ => {}
        }

        if env.is_empty() {
            debug!("leaving {key:?} out of runtime values, it has no env");
            continue;
        }

        let mut definition = Mapping::new();
        definition.insert("env".into(), env.to_value()?);
        let mut entry = Mapping::new();
        entry.insert(
            workload.kind().definition_key().into(),
            Value::Mapping(definition),
        );
        overlay.insert(key.into(), Value::Mapping(entry));
    }

    Ok(overlay)
}

fn read_file(path: PathBuf) -> Result<String> {
    read_to_string(&path).map_err(|source| RuntimeError::ReadFile { source, path })
}

/// Runtime values generation error types.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Chart cannot be opened, read, or written.
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// Answers or package details are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Prompting the user failed.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// Project file cannot be read.
    #[error("failed to read {:?}", path.display())]
    ReadFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Bundled skeleton cannot be parsed.
    #[error("failed to parse bundled runtime values skeleton")]
    Skeleton(#[source] serde_yaml::Error),

    /// Bundled skeleton is not a mapping.
    #[error("bundled runtime values skeleton is not a mapping")]
    SkeletonNotAMapping,

    /// Settings `workloads` is not a mapping.
    #[error("settings workloads is not a mapping of workload keys to workloads")]
    WorkloadsNotAMapping,

    /// Workload entry is malformed.
    #[error(transparent)]
    Workload(#[from] WorkloadError),

    /// Workload env cannot be edited.
    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Friendly result alias :3
pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
