//! Level-filtered logger shared by the console and controller.
//!
//! The filter is deliberately not a severity threshold: `error` as the
//! configured level lets everything through, `debug` lets `debug` and
//! `info` through, and `info` lets only `info` through. Messages that pass
//! are forwarded to `tracing` under the `sdwan` target.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Debug,
    Info,
}

impl LogLevel {
    pub const ALL: [LogLevel; 3] = [LogLevel::Error, LogLevel::Debug, LogLevel::Info];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => LogLevel::Error,
            1 => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown logging level {0:?} (expected error, debug or info)")]
pub struct ParseLogLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            other => Err(ParseLogLevelError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogOutcome {
    Logged,
    NotLogged,
}

/// Whether a message at `level` passes a logger configured at `configured`.
pub fn passes(configured: LogLevel, level: LogLevel) -> bool {
    match configured {
        LogLevel::Error => true,
        LogLevel::Debug => matches!(level, LogLevel::Debug | LogLevel::Info),
        LogLevel::Info => level == LogLevel::Info,
    }
}

/// Cheaply clonable logger handle. Clones share the same level.
#[derive(Debug, Clone)]
pub struct Logger {
    level: Arc<AtomicU8>,
}

impl Logger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: Arc::new(AtomicU8::new(level.to_raw())),
        }
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_raw(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level.to_raw(), Ordering::Relaxed);
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) -> LogOutcome {
        if !passes(self.level(), level) {
            return LogOutcome::NotLogged;
        }
        let message = message.as_ref();
        match level {
            LogLevel::Error => tracing::error!(target: "sdwan", "{message}"),
            LogLevel::Debug => tracing::debug!(target: "sdwan", "{message}"),
            LogLevel::Info => tracing::info!(target: "sdwan", "{message}"),
        }
        LogOutcome::Logged
    }

    pub fn error(&self, message: impl AsRef<str>) -> LogOutcome {
        self.log(LogLevel::Error, message)
    }

    pub fn debug(&self, message: impl AsRef<str>) -> LogOutcome {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: impl AsRef<str>) -> LogOutcome {
        self.log(LogLevel::Info, message)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}
