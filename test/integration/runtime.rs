// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{ProjectFixture, ScriptedPrompter, SIMPLE_VALUES_YAML};

use cap_op_plugin::{
    chart::ChartError,
    config::ConfigError,
    convert::convert_to_configurable_template_chart,
    path::ProjectLayout,
    runtime::{generate_runtime_values, AnswerSource, RuntimeError},
    transform::env::EnvVars,
};

use anyhow::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use serde_yaml::Value;

const INPUT_YAML: &str = indoc! {r#"
    appName: bookshop
    capOperatorSubdomain: cap-op
    clusterDomain: c-1.kyma.ondemand.com
    globalAccountId: ga-1
    providerSubdomain: provider
    tenantId: tenant-1
    hanaInstanceId: db-2
"#};

fn runtime_values(project: &ProjectFixture) -> Result<Value> {
    Ok(serde_yaml::from_str(&project.read("chart/runtime-values.yaml")?)?)
}

#[sealed_test(env = [("INPUT_DIR", "inputs")])]
fn generate_from_input_yaml_for_simple_chart() -> Result<()> {
    let project = ProjectFixture::simple()?;
    project.write("inputs/values.yaml", INPUT_YAML)?;

    generate_runtime_values(
        project.layout(),
        AnswerSource::InputYaml("$INPUT_DIR/values.yaml".into()),
        &mut ScriptedPrompter::default(),
    )?;

    let result = runtime_values(&project)?;
    assert_eq!(
        result["app"]["domains"]["primary"],
        Value::String("bookshop.c-1.kyma.ondemand.com".into())
    );
    assert_eq!(
        result["serviceInstances"]["saasRegistry"]["parameters"]["description"],
        Value::String("A simple bookshop application".into())
    );
    assert!(result.get("imagePullSecrets").is_none());

    let workloads = result["workloads"].as_mapping().unwrap();
    let keys: Vec<_> = workloads.keys().map(|key| key.as_str().unwrap()).collect();
    assert_eq!(keys, vec!["server", "app-router", "tenant-job"]);

    let server = EnvVars::from_value(&result["workloads"]["server"]["deploymentDefinition"]["env"])?;
    let config: serde_json::Value =
        serde_json::from_str(server.get("CDS_CONFIG").unwrap().value_str().unwrap())?;
    assert_eq!(
        config.pointer("/requires/cds.xt.DeploymentService/hdi/create/database_id"),
        Some(&serde_json::Value::String("db-2".into()))
    );

    let router = EnvVars::from_value(&result["workloads"]["app-router"]["deploymentDefinition"]["env"])?;
    let names: Vec<_> = router.iter().map(|var| var.name.as_str()).collect();
    assert_eq!(names, vec!["PORT", "TENANT_HOST_PATTERN"]);
    assert_eq!(
        router.get("TENANT_HOST_PATTERN").unwrap().value_str(),
        Some("^(.*).bookshop.c-1.kyma.ondemand.com")
    );

    Ok(())
}

#[sealed_test]
fn generate_rejects_incomplete_input_yaml() -> Result<()> {
    let project = ProjectFixture::simple()?;
    project.write("input.yaml", "appName: bookshop\n")?;

    let result = generate_runtime_values(
        project.layout(),
        AnswerSource::InputYaml("input.yaml".into()),
        &mut ScriptedPrompter::default(),
    );
    assert!(matches!(
        result,
        Err(RuntimeError::Config(ConfigError::MissingMandatory))
    ));
    assert!(!project.layout().runtime_values_yaml().exists());

    Ok(())
}

#[sealed_test]
fn generate_via_prompts_uses_defaults() -> Result<()> {
    let project = ProjectFixture::simple()?;
    let mut prompter = ScriptedPrompter::new([
        "",
        "",
        "c-1.kyma.ondemand.com",
        "ga-1",
        "provider",
        "tenant-1",
        "",
        "regcred",
    ]);

    let result = generate_runtime_values(project.layout(), AnswerSource::Prompts, &mut prompter)?;

    assert_eq!(prompter.asked.len(), 8);
    assert_eq!(prompter.asked[0].default.as_deref(), Some("bookshop"));
    assert_eq!(prompter.asked[1].default.as_deref(), Some("cap-op"));
    assert!(prompter.asked[..6].iter().all(|question| question.required));
    assert!(prompter.asked[6..].iter().all(|question| !question.required));

    assert_eq!(
        result["serviceInstances"]["saasRegistry"]["parameters"]["appUrls"]["onSubscription"],
        Value::String("https://cap-op.c-1.kyma.ondemand.com/provision/tenants/{tenantId}".into())
    );
    assert_eq!(
        result["imagePullSecrets"],
        serde_yaml::from_str::<Value>("[regcred]")?
    );

    // Without a database id, the CAP server has nothing new, but keeps its env.
    let server = EnvVars::from_value(&result["workloads"]["server"]["deploymentDefinition"]["env"])?;
    assert_eq!(server.len(), 1);
    assert!(server.get("CDS_CONFIG").unwrap().value_str().unwrap().contains("db-1"));
    assert!(result["workloads"].get("tenant-job").is_none());

    assert_eq!(runtime_values(&project)?, Value::Mapping(result));

    Ok(())
}

#[sealed_test]
fn generate_for_configurable_chart() -> Result<()> {
    let project = ProjectFixture::simple()?;
    convert_to_configurable_template_chart(project.layout())?;
    project.write("input.yaml", INPUT_YAML)?;

    generate_runtime_values(
        project.layout(),
        AnswerSource::InputYaml("input.yaml".into()),
        &mut ScriptedPrompter::default(),
    )?;

    let result = runtime_values(&project)?;
    assert_eq!(result["hanaInstanceId"], Value::String("db-2".into()));
    assert!(result.get("workloads").is_none());

    Ok(())
}

#[sealed_test]
fn generate_requires_cap_operator_chart() -> Result<()> {
    let layout = ProjectLayout::current()?;

    let result = generate_runtime_values(
        &layout,
        AnswerSource::Prompts,
        &mut ScriptedPrompter::default(),
    );
    assert!(matches!(
        result,
        Err(RuntimeError::Chart(ChartError::NotCapOperatorChart))
    ));
    assert_eq!(
        result.unwrap_err().to_string(),
        "No CAP Operator chart found in the project. Please run 'cds add cap-operator --force' to add the CAP Operator chart folder."
    );

    Ok(())
}

#[sealed_test]
fn generate_keeps_simple_values_untouched() -> Result<()> {
    let project = ProjectFixture::simple()?;
    project.write("input.yaml", INPUT_YAML)?;

    generate_runtime_values(
        project.layout(),
        AnswerSource::InputYaml("input.yaml".into()),
        &mut ScriptedPrompter::default(),
    )?;

    assert_eq!(project.read("chart/values.yaml")?, SIMPLE_VALUES_YAML);

    Ok(())
}
