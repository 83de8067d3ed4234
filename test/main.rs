// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use cap_op_plugin::{
    path::ProjectLayout,
    prompt::{PromptError, Prompter, Question},
};

use anyhow::Result;
use indoc::indoc;
use std::{
    collections::VecDeque,
    fs::{create_dir_all, read_to_string, write},
    path::Path,
};

pub(crate) const PACKAGE_JSON: &str = r#"{
  "name": "@capire/bookshop",
  "version": "1.0.0",
  "description": "A simple bookshop application"
}
"#;

pub(crate) const SIMPLE_CHART_YAML: &str = indoc! {r#"
    apiVersion: v2
    name: bookshop
    version: 0.0.1
    annotations:
      app.kubernetes.io/managed-by: cap-operator-plugin
"#};

pub(crate) const SIMPLE_VALUES_YAML: &str = indoc! {r#"
    app:
      domains:
        primary: bookshop.c-1.kyma.ondemand.com
    btp:
      globalAccountId: ga-1
    workloads:
      server:
        name: server
        consumedBTPServices: [xsuaa, db]
        deploymentDefinition:
          type: CAP
          image: registry/bookshop-srv:1
          env:
            - name: CDS_CONFIG
              value: '{"requires":{"cds.xt.DeploymentService":{"hdi":{"create":{"database_id":"db-1"}}}}}'
      app-router:
        name: app-router
        deploymentDefinition:
          type: Router
          image: registry/bookshop-router:1
          env:
            - name: PORT
              value: "5000"
      tenant-job:
        name: tenant-job
        jobDefinition:
          type: TenantOperation
          image: registry/bookshop-mtx:1
    tenantOperations:
      provisioning:
        - workloadName: tenant-job
"#};

/// CAP project scaffolded into the current working directory.
pub(crate) struct ProjectFixture {
    layout: ProjectLayout,
}

impl ProjectFixture {
    pub(crate) fn new(chart_yaml: &str, values_yaml: &str) -> Result<Self> {
        let layout = ProjectLayout::current()?;
        let fixture = Self { layout };
        fixture.write("package.json", PACKAGE_JSON)?;
        fixture.write("chart/Chart.yaml", chart_yaml)?;
        fixture.write("chart/values.yaml", values_yaml)?;

        Ok(fixture)
    }

    pub(crate) fn simple() -> Result<Self> {
        Self::new(SIMPLE_CHART_YAML, SIMPLE_VALUES_YAML)
    }

    pub(crate) fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub(crate) fn write(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) -> Result<()> {
        let path = self.layout.resolve(path);
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(path, contents.as_ref())?;

        Ok(())
    }

    pub(crate) fn read(&self, path: impl AsRef<Path>) -> Result<String> {
        Ok(read_to_string(self.layout.resolve(path))?)
    }
}

/// Prompter that replays canned answers, and records what it was asked.
#[derive(Debug, Default)]
pub(crate) struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub(crate) asked: Vec<Question>,
}

impl ScriptedPrompter {
    pub(crate) fn new(answers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &Question) -> Result<String, PromptError> {
        self.asked.push(question.clone());
        self.answers
            .pop_front()
            .ok_or_else(|| PromptError::Exhausted(question.message.clone()))
    }
}
