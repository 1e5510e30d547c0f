use dust_core::{Result, StorageConfig, StorageError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// The media host this process serves with `dust serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub readonly: bool,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_dir: default_data_dir(),
            readonly: false,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(
                ::config::Environment::with_prefix("DUST")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("storage.hosts"),
            )
            .build()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;

        Ok(config)
    }
}
