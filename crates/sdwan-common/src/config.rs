//! TOML config loading shared by both binaries.
//!
//! Each binary defines an all-optional `*Input` struct that is parsed here
//! and then resolved into its validated config.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::Invalid(msg.into())
    }
}

/// Parse a TOML document; blank input yields `T::default()`.
pub fn from_toml_str<T: DeserializeOwned + Default>(input: &str) -> Result<T, ConfigError> {
    if input.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(toml::from_str(input)?)
}

pub fn from_toml_file<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_toml_str(&input)
}
