//! Controller configuration.
//!
//! ```toml
//! listen_addr = "0.0.0.0:8081"
//! logging_level = "info"
//! upload_interface = "eth0"
//! download_interface = "eth1"
//! use_sudo = true
//! dry_run = false
//! ```

use std::net::SocketAddr;
use std::path::Path;

use sdwan_common::config::{self, ConfigError};
use sdwan_common::LogLevel;
use serde::Deserialize;

use crate::receiver::InterfaceMap;
use crate::tc::InterfaceName;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_UPLOAD_INTERFACE: &str = "eth0";
pub const DEFAULT_DOWNLOAD_INTERFACE: &str = "eth1";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ControllerConfigInput {
    pub listen_addr: Option<String>,
    pub logging_level: Option<LogLevel>,
    pub upload_interface: Option<String>,
    pub download_interface: Option<String>,
    pub use_sudo: Option<bool>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub listen_addr: SocketAddr,
    pub logging_level: LogLevel,
    pub interfaces: InterfaceMap,
    pub use_sudo: bool,
    pub dry_run: bool,
}

impl ControllerConfigInput {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        config::from_toml_str(input)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        config::from_toml_file(path)
    }

    pub fn resolve(self) -> Result<ControllerConfig, ConfigError> {
        let listen_addr = self
            .listen_addr
            .as_deref()
            .unwrap_or(DEFAULT_LISTEN_ADDR)
            .parse()
            .map_err(|e| ConfigError::invalid(format!("listen_addr: {e}")))?;

        let upload = interface(self.upload_interface, DEFAULT_UPLOAD_INTERFACE, "upload")?;
        let download = interface(self.download_interface, DEFAULT_DOWNLOAD_INTERFACE, "download")?;
        let interfaces =
            InterfaceMap::new(upload, download).map_err(|e| ConfigError::invalid(e.to_string()))?;

        Ok(ControllerConfig {
            listen_addr,
            logging_level: self.logging_level.unwrap_or(LogLevel::Info),
            interfaces,
            use_sudo: self.use_sudo.unwrap_or(true),
            dry_run: self.dry_run.unwrap_or(false),
        })
    }
}

fn interface(value: Option<String>, default: &str, which: &str) -> Result<InterfaceName, ConfigError> {
    let value = value.unwrap_or_else(|| default.to_string());
    InterfaceName::new(value.trim()).map_err(|e| ConfigError::invalid(format!("{which}_interface: {e}")))
}
