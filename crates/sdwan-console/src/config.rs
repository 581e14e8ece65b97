//! Console configuration.
//!
//! ```toml
//! listen_addr = "0.0.0.0:8080"
//! logging_level = "info"
//! primary_endpoint = "http://10.0.0.2/"
//! secondary_endpoint = "http://10.0.0.3/"
//! request_timeout_ms = 5000
//!
//! [demo]
//! tick_interval_ms = 1000
//! max_ticks = 10
//! escalation_source = "primary"
//!
//! [demo.escalation]
//! packet_loss = 5.0
//! latency = 22.0
//! jitter = 20.0
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use sdwan_common::config::{self, ConfigError};
use sdwan_common::LogLevel;
use serde::Deserialize;

use crate::sequencer::{EscalationSource, EscalationStep, SequencerConfig};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PRIMARY_ENDPOINT: &str = "http://127.0.0.1:8081/";
pub const DEFAULT_SECONDARY_ENDPOINT: &str = "http://127.0.0.1:8082/";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConsoleConfigInput {
    pub listen_addr: Option<String>,
    pub logging_level: Option<LogLevel>,
    pub primary_endpoint: Option<String>,
    pub secondary_endpoint: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub demo: DemoConfigInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DemoConfigInput {
    pub tick_interval_ms: Option<u64>,
    pub max_ticks: Option<u32>,
    pub escalation_source: Option<EscalationSource>,
    pub escalation: EscalationInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EscalationInput {
    pub packet_loss: Option<f64>,
    pub latency: Option<f64>,
    pub jitter: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub listen_addr: SocketAddr,
    pub logging_level: LogLevel,
    pub primary_endpoint: String,
    pub secondary_endpoint: String,
    pub request_timeout: Duration,
    pub sequencer: SequencerConfig,
}

impl ConsoleConfigInput {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        config::from_toml_str(input)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        config::from_toml_file(path)
    }

    pub fn resolve(self) -> Result<ConsoleConfig, ConfigError> {
        let listen_addr = self
            .listen_addr
            .as_deref()
            .unwrap_or(DEFAULT_LISTEN_ADDR)
            .parse()
            .map_err(|e| ConfigError::invalid(format!("listen_addr: {e}")))?;

        let primary_endpoint = endpoint(self.primary_endpoint, DEFAULT_PRIMARY_ENDPOINT, "primary")?;
        let secondary_endpoint =
            endpoint(self.secondary_endpoint, DEFAULT_SECONDARY_ENDPOINT, "secondary")?;

        let timeout_ms = self
            .request_timeout_ms
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        if timeout_ms == 0 {
            return Err(ConfigError::invalid("request_timeout_ms must be positive"));
        }

        let defaults = SequencerConfig::default();
        let tick_interval = self
            .demo
            .tick_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);
        if tick_interval.is_zero() {
            return Err(ConfigError::invalid("demo.tick_interval_ms must be positive"));
        }
        let max_ticks = self.demo.max_ticks.unwrap_or(defaults.max_ticks);
        if max_ticks == 0 {
            return Err(ConfigError::invalid("demo.max_ticks must be positive"));
        }

        let step = EscalationStep::default();
        let escalation = EscalationStep {
            packet_loss: self.demo.escalation.packet_loss.unwrap_or(step.packet_loss),
            latency: self.demo.escalation.latency.unwrap_or(step.latency),
            jitter: self.demo.escalation.jitter.unwrap_or(step.jitter),
        };
        if [escalation.packet_loss, escalation.latency, escalation.jitter]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(ConfigError::invalid(
                "demo.escalation steps must be non-negative numbers",
            ));
        }

        Ok(ConsoleConfig {
            listen_addr,
            logging_level: self.logging_level.unwrap_or(LogLevel::Info),
            primary_endpoint,
            secondary_endpoint,
            request_timeout: Duration::from_millis(timeout_ms),
            sequencer: SequencerConfig {
                tick_interval,
                max_ticks,
                escalation,
                escalation_source: self.demo.escalation_source.unwrap_or_default(),
            },
        })
    }
}

fn endpoint(value: Option<String>, default: &str, which: &str) -> Result<String, ConfigError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(format!("{which}_endpoint is empty")));
    }
    Ok(trimmed.to_string())
}
