// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for the input files the plugin reads to simplify the
//! process of serialization and deserialization. File I/O is left to the
//! caller to figure out.

use crate::transform::placeholder::Replacements;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Answers needed to render runtime values of a chart.
///
/// Collected either from an input YAML file, or by prompting the user.
///
/// # General Layout
///
/// ```yaml
/// appName: bookshop
/// capOperatorSubdomain: cap-op
/// clusterDomain: c-1234.kyma.ondemand.com
/// globalAccountId: 0d9a1f6e-...
/// providerSubdomain: bookshop-provider
/// tenantId: 5d1d0a2b-...
/// hanaInstanceId: 6f8c2d3e-...   # optional
/// imagePullSecret: regcred       # optional
/// ```
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeAnswers {
    #[serde(default)]
    pub app_name: String,

    #[serde(default)]
    pub cap_operator_subdomain: String,

    #[serde(default)]
    pub cluster_domain: String,

    #[serde(default)]
    pub global_account_id: String,

    #[serde(default)]
    pub provider_subdomain: String,

    #[serde(default)]
    pub tenant_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hana_instance_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secret: Option<String>,

    /// Description shown to subscribers. Falls back to the app name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_description: Option<String>,
}

impl RuntimeAnswers {
    /// Check that every mandatory answer was given.
    ///
    /// Blank optional answers are cleared, so they count as not given.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::MissingMandatory`] if a mandatory answer is
    ///   blank.
    pub fn validate(mut self) -> Result<Self> {
        let mandatory = [
            &self.app_name,
            &self.cap_operator_subdomain,
            &self.cluster_domain,
            &self.global_account_id,
            &self.provider_subdomain,
            &self.tenant_id,
        ];
        if mandatory.iter().any(|answer| answer.trim().is_empty()) {
            return Err(ConfigError::MissingMandatory);
        }

        for answer in [
            &mut self.hana_instance_id,
            &mut self.image_pull_secret,
            &mut self.app_description,
        ] {
            if answer.as_deref().is_some_and(|text| text.trim().is_empty()) {
                *answer = None;
            }
        }

        Ok(self)
    }

    /// Description to render, falling back to app name.
    pub fn description(&self) -> &str {
        self.app_description.as_deref().unwrap_or(&self.app_name)
    }

    /// Placeholder table for rendering runtime value skeletons.
    ///
    /// Optional answers that were not given render as empty text.
    pub fn replacements(&self) -> Replacements {
        Replacements::from([
            ("appName".into(), self.app_name.clone()),
            ("appDescription".into(), self.description().into()),
            ("capOperatorSubdomain".into(), self.cap_operator_subdomain.clone()),
            ("clusterDomain".into(), self.cluster_domain.clone()),
            ("globalAccountId".into(), self.global_account_id.clone()),
            ("providerSubdomain".into(), self.provider_subdomain.clone()),
            ("tenantId".into(), self.tenant_id.clone()),
            (
                "hanaInstanceId".into(),
                self.hana_instance_id.clone().unwrap_or_default(),
            ),
            (
                "imagePullSecret".into(),
                self.image_pull_secret.clone().unwrap_or_default(),
            ),
        ])
    }

    /// Tenant host regex the router needs for this deployment.
    pub fn tenant_host_pattern(&self) -> String {
        format!("^(.*).{}.{}", self.app_name, self.cluster_domain)
    }
}

impl FromStr for RuntimeAnswers {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let answers: RuntimeAnswers =
            serde_yaml::from_str(data).map_err(ConfigError::Deserialize)?;
        answers.validate()
    }
}

impl Display for RuntimeAnswers {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            serde_yaml::to_string(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Name and description of the CAP application.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct AppDetails {
    pub name: String,
    pub description: Option<String>,
}

impl FromStr for AppDetails {
    type Err = ConfigError;

    /// Read app details out of `package.json` content.
    ///
    /// The app name is the last `/` segment of the package name with every
    /// `@` removed, so `@capire/bookshop` becomes `bookshop`.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        #[derive(Deserialize)]
        struct PackageJson {
            #[serde(default)]
            name: Option<String>,

            #[serde(default)]
            description: Option<String>,
        }

        let package: PackageJson = serde_json::from_str(data)?;
        let name = package
            .name
            .unwrap_or_default()
            .trim()
            .replace('@', "")
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            name,
            description: package.description.filter(|text| !text.trim().is_empty()),
        })
    }
}

/// Perform shell expansion on user supplied input path.
///
/// # Errors
///
/// - Return [`ConfigError::ShellExpansion`] if a referenced variable is not
///   set.
pub fn expand_path(path: impl AsRef<str>) -> Result<PathBuf> {
    Ok(PathBuf::from(shellexpand::full(path.as_ref())?.into_owned()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize input YAML.
    #[error(transparent)]
    Deserialize(serde_yaml::Error),

    /// Failed to serialize answers.
    #[error(transparent)]
    Serialize(serde_yaml::Error),

    /// Failed to read `package.json`.
    #[error("failed to parse package.json")]
    PackageJson(#[from] serde_json::Error),

    /// Input YAML lacks mandatory answers.
    #[error(
        "'appName', 'capOperatorSubdomain', 'clusterDomain', 'globalAccountId', 'providerSubdomain' and 'tenantId' are mandatory fields in the input yaml file."
    )]
    MissingMandatory,

    /// Failed to perform shell expansion on input path.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    fn answers() -> RuntimeAnswers {
        RuntimeAnswers {
            app_name: "bookshop".into(),
            cap_operator_subdomain: "cap-op".into(),
            cluster_domain: "c-1.kyma.ondemand.com".into(),
            global_account_id: "ga-1".into(),
            provider_subdomain: "provider".into(),
            tenant_id: "tenant-1".into(),
            hana_instance_id: None,
            image_pull_secret: Some("regcred".into()),
            app_description: None,
        }
    }

    #[test]
    fn deserialize_runtime_answers() -> anyhow::Result<()> {
        let result: RuntimeAnswers = indoc! {r#"
            appName: bookshop
            capOperatorSubdomain: cap-op
            clusterDomain: c-1.kyma.ondemand.com
            globalAccountId: ga-1
            providerSubdomain: provider
            tenantId: tenant-1
            hanaInstanceId: ""
            imagePullSecret: regcred
        "#}
        .parse()?;

        pretty_assertions::assert_eq!(result, answers());

        Ok(())
    }

    #[test]
    fn serialize_runtime_answers() {
        let result = answers().to_string();
        let expect = indoc! {r#"
            appName: bookshop
            capOperatorSubdomain: cap-op
            clusterDomain: c-1.kyma.ondemand.com
            globalAccountId: ga-1
            providerSubdomain: provider
            tenantId: tenant-1
            imagePullSecret: regcred
        "#};

        pretty_assertions::assert_eq!(result, expect);
    }

    #[test]
    fn runtime_answers_reject_missing_mandatory_field() {
        let result = "appName: bookshop\nclusterDomain: x\n".parse::<RuntimeAnswers>();
        assert!(matches!(result, Err(ConfigError::MissingMandatory)));
        pretty_assertions::assert_eq!(
            result.unwrap_err().to_string(),
            "'appName', 'capOperatorSubdomain', 'clusterDomain', 'globalAccountId', 'providerSubdomain' and 'tenantId' are mandatory fields in the input yaml file."
        );
    }

    #[test]
    fn runtime_answers_replacements() {
        let result = answers().replacements();
        pretty_assertions::assert_eq!(result["appDescription"], "bookshop");
        pretty_assertions::assert_eq!(result["hanaInstanceId"], "");
        pretty_assertions::assert_eq!(result["imagePullSecret"], "regcred");
        pretty_assertions::assert_eq!(
            answers().tenant_host_pattern(),
            "^(.*).bookshop.c-1.kyma.ondemand.com"
        );
    }

    #[test_case(r#"{"name":"@capire/bookshop","description":"Books"}"#, "bookshop", Some("Books"); "scoped")]
    #[test_case(r#"{"name":"bookshop"}"#, "bookshop", None; "plain")]
    #[test_case(r#"{"name":" bookshop@1 ","description":""}"#, "bookshop1", None; "stray at sign")]
    #[test_case(r#"{}"#, "", None; "no name")]
    #[test]
    fn app_details_from_package_json(data: &str, name: &str, description: Option<&str>) {
        let result: AppDetails = data.parse().unwrap();
        pretty_assertions::assert_eq!(result.name, name);
        pretty_assertions::assert_eq!(result.description.as_deref(), description);
    }

    #[sealed_test(env = [("INPUTS", "/home/dev/inputs")])]
    fn expand_input_path() -> anyhow::Result<()> {
        pretty_assertions::assert_eq!(
            expand_path("$INPUTS/values.yaml")?,
            PathBuf::from("/home/dev/inputs/values.yaml")
        );
        pretty_assertions::assert_eq!(expand_path("plain.yaml")?, PathBuf::from("plain.yaml"));

        Ok(())
    }
}
