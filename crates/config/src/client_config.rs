// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    load_config::{find_in_parent, load_yaml_with_env, resolve_config_path, ConfigSource},
    runtime_config::{ContractsConfig, NetworkConfig, RuntimeSettings},
};

pub const DEFAULT_CONFIG_NAME: &str = "cv.config.yaml";
pub const ENV_PREFIX: &str = "CV_";

/// Validity window of a freshly signed decryption authorization.
pub const DEFAULT_AUTHORIZATION_DURATION_DAYS: u64 = 365;

/// Where authorizations are kept between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum StorageConfig {
    Durable { path: PathBuf },
    Ephemeral,
}

impl Default for StorageConfig {
    fn default() -> Self {
        match OsDirs::data_dir() {
            Some(dir) => StorageConfig::Durable {
                path: dir.join("db"),
            },
            None => StorageConfig::Ephemeral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationConfig {
    pub duration_days: u64,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            duration_days: DEFAULT_AUTHORIZATION_DURATION_DAYS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub network: NetworkConfig,
    pub contracts: ContractsConfig,
    pub storage: StorageConfig,
    pub authorization: AuthorizationConfig,
    /// The file this configuration was read from, if any
    #[serde(skip)]
    pub found_config_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn runtime_settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            network: self.network.clone(),
            contracts: self.contracts.clone(),
        }
    }

    pub fn authorization_duration_days(&self) -> Result<u64> {
        if self.authorization.duration_days == 0 {
            bail!("authorization.duration_days must be at least 1");
        }
        Ok(self.authorization.duration_days)
    }
}

/// Layers defaults, the YAML file (explicit or found above the working directory) and
/// `CV_`-prefixed environment variables, in that order.
pub fn load_config(cli_file: Option<&Path>) -> Result<ClientConfig> {
    let cwd = env::current_dir().context("Could not determine working directory")?;
    let source = resolve_config_path(find_in_parent, &cwd, DEFAULT_CONFIG_NAME, cli_file);

    let mut figment = Figment::from(Serialized::defaults(ClientConfig::default()));
    let found = match source {
        ConfigSource::Explicit(path) if !path.exists() => {
            bail!("Configuration file not found at {}", path.display())
        }
        ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => {
            let yaml = load_yaml_with_env(&path)?;
            figment = figment.merge(Yaml::string(&yaml));
            info!("loaded configuration from {}", path.display());
            Some(path)
        }
        ConfigSource::None => {
            debug!("no {DEFAULT_CONFIG_NAME} found, using defaults and environment");
            None
        }
    };

    let mut config: ClientConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Could not parse configuration")?;
    config.found_config_file = found;
    Ok(config)
}

pub struct OsDirs;
impl OsDirs {
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("cv"))
    }
}
