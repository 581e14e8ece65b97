//! Typed `tc` command builder.
//!
//! Each apply cycle issues three commands per interface, in order:
//!
//! ```text
//! tc qdisc del dev <if> root
//! tc qdisc add dev <if> root handle 1:0 tbf rate <N>kbit buffer 1600 limit 3000
//! tc qdisc add dev <if> parent 1:1 handle 10: netem delay <L>ms [<J>ms] loss <P>%
//! ```
//!
//! Commands are argument vectors built from typed, range-checked values;
//! nothing is ever passed through a shell.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `tbf` burst buffer in bytes.
pub const TBF_BUFFER: u32 = 1600;
/// `tbf` queue limit in bytes.
pub const TBF_LIMIT: u32 = 3000;

const IFNAMSIZ: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TcError {
    #[error("invalid interface name {0:?}")]
    InvalidInterface(String),
}

/// A validated Linux interface name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceName(String);

impl InterfaceName {
    pub fn new(name: impl Into<String>) -> Result<Self, TcError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.len() <= IFNAMSIZ
            && name != "."
            && name != ".."
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-'));
        if !valid {
            return Err(TcError::InvalidInterface(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = TcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InterfaceName> for String {
    fn from(name: InterfaceName) -> Self {
        name.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shaping to install on one interface.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceTarget {
    pub name: InterfaceName,
    pub rate_limit_mbps: f64,
    pub packet_loss: f64,
    pub latency_ms: f64,
    pub jitter_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QdiscPhase {
    Clear,
    RateLimit,
    Inject,
}

impl QdiscPhase {
    pub const ORDER: [QdiscPhase; 3] = [QdiscPhase::Clear, QdiscPhase::RateLimit, QdiscPhase::Inject];
}

#[derive(Debug, Clone, PartialEq)]
pub enum TcCommand {
    Clear {
        dev: InterfaceName,
    },
    RateLimit {
        dev: InterfaceName,
        rate_kbit: u64,
    },
    Inject {
        dev: InterfaceName,
        delay_ms: f64,
        jitter_ms: f64,
        loss_percent: f64,
    },
}

impl TcCommand {
    pub fn for_phase(target: &InterfaceTarget, phase: QdiscPhase) -> Self {
        match phase {
            QdiscPhase::Clear => TcCommand::Clear {
                dev: target.name.clone(),
            },
            QdiscPhase::RateLimit => TcCommand::RateLimit {
                dev: target.name.clone(),
                rate_kbit: mbps_to_kbit(target.rate_limit_mbps),
            },
            QdiscPhase::Inject => TcCommand::Inject {
                dev: target.name.clone(),
                delay_ms: non_negative(target.latency_ms),
                jitter_ms: non_negative(target.jitter_ms),
                loss_percent: non_negative(target.packet_loss).min(100.0),
            },
        }
    }

    /// The full clear → rate-limit → inject sequence for one interface.
    pub fn sequence(target: &InterfaceTarget) -> [TcCommand; 3] {
        QdiscPhase::ORDER.map(|phase| Self::for_phase(target, phase))
    }

    pub fn phase(&self) -> QdiscPhase {
        match self {
            TcCommand::Clear { .. } => QdiscPhase::Clear,
            TcCommand::RateLimit { .. } => QdiscPhase::RateLimit,
            TcCommand::Inject { .. } => QdiscPhase::Inject,
        }
    }

    pub fn dev(&self) -> &InterfaceName {
        match self {
            TcCommand::Clear { dev }
            | TcCommand::RateLimit { dev, .. }
            | TcCommand::Inject { dev, .. } => dev,
        }
    }

    /// Arguments to the `tc` binary.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["qdisc".into()];
        match self {
            TcCommand::Clear { dev } => {
                args.extend(["del".into(), "dev".into(), dev.to_string(), "root".into()]);
            }
            TcCommand::RateLimit { dev, rate_kbit } => {
                args.extend([
                    "add".into(),
                    "dev".into(),
                    dev.to_string(),
                    "root".into(),
                    "handle".into(),
                    "1:0".into(),
                    "tbf".into(),
                    "rate".into(),
                    format!("{rate_kbit}kbit"),
                    "buffer".into(),
                    TBF_BUFFER.to_string(),
                    "limit".into(),
                    TBF_LIMIT.to_string(),
                ]);
            }
            TcCommand::Inject {
                dev,
                delay_ms,
                jitter_ms,
                loss_percent,
            } => {
                args.extend([
                    "add".into(),
                    "dev".into(),
                    dev.to_string(),
                    "parent".into(),
                    "1:1".into(),
                    "handle".into(),
                    "10:".into(),
                    "netem".into(),
                    "delay".into(),
                    format!("{delay_ms}ms"),
                ]);
                if *jitter_ms > 0.0 {
                    args.push(format!("{jitter_ms}ms"));
                }
                args.push("loss".into());
                args.push(format!("{loss_percent}%"));
            }
        }
        args
    }
}

impl fmt::Display for TcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tc {}", self.args().join(" "))
    }
}

fn mbps_to_kbit(mbps: f64) -> u64 {
    (non_negative(mbps) * 1000.0).round() as u64
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(name: &str) -> InterfaceTarget {
        InterfaceTarget {
            name: InterfaceName::new(name).unwrap(),
            rate_limit_mbps: 10.0,
            packet_loss: 5.0,
            latency_ms: 52.0,
            jitter_ms: 20.0,
        }
    }

    #[test]
    fn interface_names_are_validated() {
        assert!(InterfaceName::new("eth0").is_ok());
        assert!(InterfaceName::new("enp0s31f6").is_ok());
        assert!(InterfaceName::new("br-lan.10").is_ok());
        assert!(InterfaceName::new("").is_err());
        assert!(InterfaceName::new("..").is_err());
        assert!(InterfaceName::new("eth0 root").is_err());
        assert!(InterfaceName::new("eth0;reboot").is_err());
        assert!(InterfaceName::new("averyveryverylongname").is_err());
    }

    #[test]
    fn renders_the_three_phases() {
        let [clear, rate, inject] = TcCommand::sequence(&target("eth0"));
        assert_eq!(clear.to_string(), "tc qdisc del dev eth0 root");
        assert_eq!(
            rate.to_string(),
            "tc qdisc add dev eth0 root handle 1:0 tbf rate 10000kbit buffer 1600 limit 3000"
        );
        assert_eq!(
            inject.to_string(),
            "tc qdisc add dev eth0 parent 1:1 handle 10: netem delay 52ms 20ms loss 5%"
        );
        assert_eq!(clear.phase(), QdiscPhase::Clear);
        assert_eq!(rate.phase(), QdiscPhase::RateLimit);
        assert_eq!(inject.phase(), QdiscPhase::Inject);
        assert_eq!(inject.dev().as_str(), "eth0");
    }

    #[test]
    fn zero_jitter_is_omitted() {
        let t = InterfaceTarget {
            jitter_ms: 0.0,
            latency_ms: 30.0,
            packet_loss: 0.0,
            ..target("eth1")
        };
        let inject = TcCommand::for_phase(&t, QdiscPhase::Inject);
        assert_eq!(
            inject.args(),
            ["qdisc", "add", "dev", "eth1", "parent", "1:1", "handle", "10:", "netem", "delay", "30ms", "loss", "0%"]
        );
    }

    #[test]
    fn loss_is_capped_and_rates_converted() {
        let t = InterfaceTarget {
            packet_loss: 150.0,
            rate_limit_mbps: 1.5,
            ..target("eth0")
        };
        match TcCommand::for_phase(&t, QdiscPhase::Inject) {
            TcCommand::Inject { loss_percent, .. } => assert_eq!(loss_percent, 100.0),
            other => panic!("unexpected {other:?}"),
        }
        match TcCommand::for_phase(&t, QdiscPhase::RateLimit) {
            TcCommand::RateLimit { rate_kbit, .. } => assert_eq!(rate_kbit, 1500),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fractional_delays_render_plainly() {
        let t = InterfaceTarget {
            latency_ms: 12.5,
            jitter_ms: 0.25,
            ..target("eth0")
        };
        let inject = TcCommand::for_phase(&t, QdiscPhase::Inject).to_string();
        assert!(inject.ends_with("delay 12.5ms 0.25ms loss 5%"), "{inject}");
    }
}
