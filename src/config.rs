use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use config::{Config, Environment, File, FileFormat, Map};

use crate::domain::model::TargetDefaults;

pub const DEFAULT_HOST: &str = "https://dashboard.getporter.dev";

/// CLI settings persisted by `porter config`, read from `~/.porter/porter.yaml`.
#[derive(Debug, serde_derive::Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CliConfig {
    pub host: String,
    pub token: Option<String>,
    pub project: u64,
    pub cluster: u64,
    pub timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            token: None,
            project: 0,
            cluster: 0,
            timeout_secs: 30,
        }
    }
}

impl CliConfig {
    pub fn defaults(&self) -> TargetDefaults {
        TargetDefaults {
            project: self.project,
            cluster: self.cluster,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".porter").join("porter.yaml"))
}

pub fn load_config(path: Option<&Path>) -> Result<CliConfig, Error> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(
            File::from(path)
                .format(FileFormat::Yaml)
                .required(false),
        );
    }
    let config = builder.build().context("Can't load configuration")?;

    config
        .try_deserialize()
        .context("Can't deserialize CliConfig from loaded configuration")
}

/// `PORTER_*` variables that override document values. Empty variables are
/// treated as unset.
#[derive(Debug, Clone, Default, serde_derive::Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnvOverrides {
    pub source_name: Option<String>,
    pub source_repo: Option<String>,
    pub source_version: Option<String>,
    pub project: Option<String>,
    pub cluster: Option<String>,
    pub namespace: Option<String>,
}

impl EnvOverrides {
    pub fn from_process() -> Result<Self, Error> {
        Self::load(Environment::with_prefix("porter"))
    }

    /// Same as [`EnvOverrides::from_process`] but reads `PORTER_*` keys from `vars`.
    pub fn from_map(vars: Map<String, String>) -> Result<Self, Error> {
        Self::load(Environment::with_prefix("porter").source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self, Error> {
        let overrides: Self = Config::builder()
            .add_source(environment)
            .build()
            .context("Can't read PORTER_* environment")?
            .try_deserialize()
            .context("Can't deserialize environment overrides")?;
        Ok(overrides.without_empty())
    }

    fn without_empty(self) -> Self {
        let keep = |value: Option<String>| value.filter(|v| !v.is_empty());
        Self {
            source_name: keep(self.source_name),
            source_repo: keep(self.source_repo),
            source_version: keep(self.source_version),
            project: keep(self.project),
            cluster: keep(self.cluster),
            namespace: keep(self.namespace),
        }
    }
}
