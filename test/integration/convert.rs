// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{ProjectFixture, SIMPLE_CHART_YAML, SIMPLE_VALUES_YAML};

use cap_op_plugin::{
    chart::{Chart, ChartError, ChartKind},
    convert::{convert_to_configurable_template_chart, ConvertError},
    path::ProjectLayout,
};

use anyhow::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use serde_yaml::Value;

#[sealed_test]
fn convert_simple_chart() -> Result<()> {
    let project = ProjectFixture::simple()?;

    convert_to_configurable_template_chart(project.layout())?;

    let chart = Chart::open(project.layout().clone())?;
    assert_eq!(chart.kind(), ChartKind::ConfigurableTemplates);

    let values: Value = serde_yaml::from_str(&project.read("chart/values.yaml")?)?;
    let expect: Value = serde_yaml::from_str(indoc! {r#"
        server: { image: "registry/bookshop-srv:1" }
        appRouter: { image: "registry/bookshop-router:1" }
        tenantJob: { image: "registry/bookshop-mtx:1" }
    "#})?;
    assert_eq!(values["workloads"], expect);
    assert_eq!(values["hanaInstanceId"], Value::String("db-1".into()));
    assert_eq!(values["btp"]["globalAccountId"], Value::String("ga-1".into()));
    assert!(values.get("tenantOperations").is_none());

    let manifest = project.read("chart/templates/cap-operator-cros.yaml")?;
    assert!(manifest.contains("kind: CAPApplicationVersion\n"));
    assert!(manifest.contains("  workloads:\n  - name: server\n"));
    assert!(manifest.contains("{{.Values.workloads.appRouter.image}}"));
    assert!(manifest.contains("TENANT_HOST_PATTERN"));
    assert!(manifest.contains("^(.*).{{ .Values.app.domains.primary }}"));
    assert!(manifest.ends_with(
        "  tenantOperations:\n    provisioning:\n    - workloadName: tenant-job\n"
    ));

    Ok(())
}

#[sealed_test]
fn convert_refuses_configurable_chart() -> Result<()> {
    let project = ProjectFixture::simple()?;
    convert_to_configurable_template_chart(project.layout())?;
    let values = project.read("chart/values.yaml")?;
    let manifest = project.read("chart/templates/cap-operator-cros.yaml")?;

    let result = convert_to_configurable_template_chart(project.layout());
    assert!(matches!(result, Err(ConvertError::AlreadyConfigurable)));
    assert_eq!(project.read("chart/values.yaml")?, values);
    assert_eq!(project.read("chart/templates/cap-operator-cros.yaml")?, manifest);

    Ok(())
}

#[sealed_test]
fn convert_refuses_missing_chart() -> Result<()> {
    let layout = ProjectLayout::current()?;

    let result = convert_to_configurable_template_chart(&layout);
    assert!(matches!(
        result,
        Err(ConvertError::Chart(ChartError::NotCapOperatorChart))
    ));

    Ok(())
}

#[sealed_test]
fn convert_aborts_on_malformed_workload_before_writing() -> Result<()> {
    let values = indoc! {r#"
        workloads:
          server:
            deploymentDefinition: { type: CAP, image: srv }
          broken:
            name: broken
    "#};
    let project = ProjectFixture::new(SIMPLE_CHART_YAML, values)?;

    let result = convert_to_configurable_template_chart(project.layout());
    assert!(matches!(result, Err(ConvertError::Transform(_))));
    assert_eq!(project.read("chart/values.yaml")?, values);
    assert_eq!(project.read("chart/Chart.yaml")?, SIMPLE_CHART_YAML);
    assert!(!project.layout().manifest().exists());

    Ok(())
}

#[sealed_test]
fn convert_keeps_simple_values_untouched_on_foreign_chart() -> Result<()> {
    let chart_yaml = "apiVersion: v2\nname: bookshop\n";
    let project = ProjectFixture::new(chart_yaml, SIMPLE_VALUES_YAML)?;

    let result = convert_to_configurable_template_chart(project.layout());
    assert!(matches!(
        result,
        Err(ConvertError::Chart(ChartError::NotCapOperatorChart))
    ));
    assert_eq!(project.read("chart/values.yaml")?, SIMPLE_VALUES_YAML);

    Ok(())
}
