// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use cap_op_plugin::{
    convert::convert_to_configurable_template_chart,
    path::ProjectLayout,
    prompt::TerminalPrompter,
    runtime::{generate_runtime_values, AnswerSource},
};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  cap-op-plugin [options] <command> [--via-prompts | --via-input-yaml <input-yaml-path>]",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Root of CAP project, defaults to current working directory.
    #[arg(short = 'C', long, global = true, value_name = "path")]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let layout = match self.project {
            Some(root) => ProjectLayout::new(root),
            None => ProjectLayout::current()?,
        };

        match self.command {
            Command::GenerateRuntimeValues(opts) => run_generate_runtime_values(&layout, opts),
            Command::ConvertToConfigurableTemplateChart => run_convert(&layout),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Generate runtime-values.yaml file for the CAP Operator chart.
    #[command(
        override_usage = "cap-op-plugin generate-runtime-values [--via-prompts | --via-input-yaml <input-yaml-path>]"
    )]
    GenerateRuntimeValues(GenerateRuntimeValuesOptions),

    /// Convert simple CAP Operator chart into a configurable template chart.
    #[command(override_usage = "cap-op-plugin convert-to-configurable-template-chart")]
    ConvertToConfigurableTemplateChart,
}

#[derive(Args, Clone, Debug)]
#[group(multiple = false)]
struct GenerateRuntimeValuesOptions {
    /// Ask for every value interactively.
    #[arg(long)]
    pub via_prompts: bool,

    /// Read values from input YAML file.
    #[arg(long, value_name = "input-yaml-path")]
    pub via_input_yaml: Option<String>,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = Cli::parse().run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run_generate_runtime_values(
    layout: &ProjectLayout,
    opts: GenerateRuntimeValuesOptions,
) -> Result<()> {
    let source = match (opts.via_prompts, opts.via_input_yaml) {
        (false, Some(path)) => AnswerSource::InputYaml(path),
        _ => AnswerSource::Prompts,
    };

    generate_runtime_values(layout, source, &mut TerminalPrompter)?;

    Ok(())
}

fn run_convert(layout: &ProjectLayout) -> Result<()> {
    convert_to_configurable_template_chart(layout)?;

    Ok(())
}
