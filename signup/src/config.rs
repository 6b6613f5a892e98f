use std::{path::PathBuf, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::level_filters::LevelFilter;

use crate::dir::DataDirectory;

pub const DEFAULT_API_BASE_URL: &str = "https://b01025612-tutorial05.onrender.com";

fn deserialize_fromstr<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let string = String::deserialize(deserializer)?;
    T::from_str(&string)
        .map_err(|e| de::Error::custom(format!("Error parsing '{}': {}", string, e)))
}

pub fn serialize_to_string<T: std::fmt::Display, S: Serializer>(
    field: T,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.serialize_str(&field.to_string())
}

fn default_loglevel() -> LevelFilter {
    LevelFilter::INFO
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// Which flavour of the form is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormVariant {
    /// Login and registration against the remote auth API.
    #[default]
    Remote,
    /// Registration only, submissions are logged locally and never sent.
    Local,
}

impl FormVariant {
    pub fn allows_mode_switch(&self) -> bool {
        *self == FormVariant::Remote
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the auth and products API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// What messages to log
    #[serde(
        deserialize_with = "deserialize_fromstr",
        serialize_with = "serialize_to_string",
        default = "default_loglevel"
    )]
    pub log_level: LevelFilter,
    #[serde(default)]
    pub variant: FormVariant,
    /// An optional custom data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            log_level: default_loglevel(),
            variant: FormVariant::default(),
            data_dir: None,
        }
    }
}

#[derive(PartialEq, Eq, Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not locate the configuration directory.")]
    DatadirNotFound,
    #[error("Could not locate the configuration file.")]
    FileNotFound,
    #[error("Failed to read configuration file: {0}")]
    ReadingFile(String),
    #[error("Configuration error: {0}")]
    Unexpected(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound,
            _ => Self::ReadingFile(e.to_string()),
        }
    }
}

impl Config {
    pub fn from_file(path: PathBuf) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str::<Config>(&content)
            .map_err(|e| ConfigError::ReadingFile(format!("Parsing configuration file: {}", e)))?;
        config.check()?;

        Ok(config)
    }

    /// Load the configuration from a custom path, which must exist, or from the
    /// data directory, where it is optional.
    pub fn load(
        custom_path: Option<PathBuf>,
        datadir: &DataDirectory,
    ) -> Result<Config, ConfigError> {
        if let Some(path) = custom_path {
            return Self::from_file(path);
        }
        match Self::from_file(datadir.config_file_path()) {
            Err(ConfigError::FileNotFound) => {
                tracing::debug!("No configuration file, using defaults");
                Ok(Config::default())
            }
            res => res,
        }
    }

    /// Make sure the settings are sane.
    pub fn check(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.api_base_url).map_err(|e| {
            ConfigError::Unexpected(format!(
                "Invalid API base URL '{}': {}",
                self.api_base_url, e
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Unexpected(format!(
                "API base URL must use http or https, not '{}'",
                url.scheme()
            )));
        }

        Ok(())
    }
}
