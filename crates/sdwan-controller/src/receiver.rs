//! Applies impairment requests to the controller's two interfaces.
//!
//! Each request is mapped onto an upload-side and a download-side interface.
//! Both get the same loss/latency/jitter; the rate cap comes from `upload`
//! and `download` respectively. Per interface the commands run in strict
//! order: clear, rate-limit, inject. Clearing first makes repeated applies
//! idempotent.

use std::sync::{Arc, Mutex};

use sdwan_common::Logger;
use serde::Serialize;

use crate::request::ImpairmentRequest;
use crate::runner::CommandRunner;
use crate::tc::{InterfaceName, InterfaceTarget, QdiscPhase, TcCommand, TcError};

/// Which interface carries which direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceMap {
    upload: InterfaceName,
    download: InterfaceName,
}

impl InterfaceMap {
    pub fn new(upload: InterfaceName, download: InterfaceName) -> Result<Self, TcError> {
        if upload == download {
            return Err(TcError::InvalidInterface(format!(
                "{upload} is configured for both upload and download"
            )));
        }
        Ok(Self { upload, download })
    }

    pub fn upload(&self) -> &InterfaceName {
        &self.upload
    }

    pub fn download(&self) -> &InterfaceName {
        &self.download
    }

    /// Upload interface first.
    pub fn targets(&self, req: &ImpairmentRequest) -> [InterfaceTarget; 2] {
        let target = |name: &InterfaceName, rate| InterfaceTarget {
            name: name.clone(),
            rate_limit_mbps: rate,
            packet_loss: req.packet_loss,
            latency_ms: req.latency,
            jitter_ms: req.jitter,
        };
        [
            target(&self.upload, req.upload),
            target(&self.download, req.download),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseReport {
    pub interface: String,
    pub phase: QdiscPhase,
    pub command: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one apply. Informational: the request itself always succeeds
/// once it has parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    pub phases: Vec<PhaseReport>,
}

impl ApplyReport {
    pub fn all_succeeded(&self) -> bool {
        self.phases.iter().all(|p| p.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PhaseReport> {
        self.phases.iter().filter(|p| !p.success)
    }
}

pub struct InterfaceImpairmentReceiver {
    interfaces: InterfaceMap,
    runner: Arc<dyn CommandRunner>,
    logger: Logger,
    apply_lock: Mutex<()>,
}

impl InterfaceImpairmentReceiver {
    pub fn new(interfaces: InterfaceMap, runner: Arc<dyn CommandRunner>, logger: Logger) -> Self {
        Self {
            interfaces,
            runner,
            logger,
            apply_lock: Mutex::new(()),
        }
    }

    pub fn interfaces(&self) -> &InterfaceMap {
        &self.interfaces
    }

    /// Runs the full command sequence on both interfaces. Blocking.
    ///
    /// Every phase runs even if an earlier one failed; failures are logged
    /// and recorded in the report. A clear that finds nothing to delete
    /// counts as success.
    pub fn apply(&self, req: &ImpairmentRequest) -> ApplyReport {
        let _guard = self.apply_lock.lock().unwrap_or_else(|e| e.into_inner());

        self.logger.debug(format!(
            "applying download={} upload={} packetLoss={} latency={} jitter={}",
            req.download, req.upload, req.packet_loss, req.latency, req.jitter
        ));

        let mut report = ApplyReport::default();
        for target in self.interfaces.targets(req) {
            for command in TcCommand::sequence(&target) {
                report.phases.push(self.run(&command));
            }
        }

        if report.all_succeeded() {
            self.logger.info("impairment applied");
        } else {
            self.logger.error(format!(
                "impairment applied with {} failed command(s)",
                report.failures().count()
            ));
        }
        report
    }

    fn run(&self, command: &TcCommand) -> PhaseReport {
        let rendered = command.to_string();
        tracing::debug!(command = %rendered, "running");

        let error = match self.runner.run(command) {
            Ok(out) if out.success => None,
            // `del` on an interface without a root qdisc exits non-zero;
            // there is simply nothing to clear.
            Ok(out) if command.phase() == QdiscPhase::Clear => {
                tracing::debug!(
                    interface = %command.dev(),
                    stderr = %out.stderr,
                    "nothing to clear"
                );
                None
            }
            Ok(out) => {
                let code = out
                    .status
                    .map_or_else(|| "signal".to_string(), |c| c.to_string());
                Some(format!("exit {code}: {}", out.stderr))
            }
            Err(e) => Some(e.to_string()),
        };
        if let Some(err) = &error {
            tracing::warn!(
                interface = %command.dev(),
                phase = ?command.phase(),
                command = %rendered,
                error = %err,
                "tc command failed"
            );
        }

        PhaseReport {
            interface: command.dev().to_string(),
            phase: command.phase(),
            command: rendered,
            success: error.is_none(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::RecordingRunner;
    use sdwan_common::LogLevel;

    fn map() -> InterfaceMap {
        InterfaceMap::new(
            InterfaceName::new("eth0").unwrap(),
            InterfaceName::new("eth1").unwrap(),
        )
        .unwrap()
    }

    fn receiver(runner: Arc<RecordingRunner>) -> InterfaceImpairmentReceiver {
        InterfaceImpairmentReceiver::new(map(), runner, Logger::new(LogLevel::Error))
    }

    fn request(download: f64, upload: f64) -> ImpairmentRequest {
        ImpairmentRequest {
            download,
            upload,
            packet_loss: 100.0,
            latency: 100.0,
            jitter: 100.0,
        }
    }

    #[test]
    fn same_interface_twice_is_rejected() {
        let eth0 = InterfaceName::new("eth0").unwrap();
        assert!(InterfaceMap::new(eth0.clone(), eth0).is_err());
    }

    #[test]
    fn applies_two_sequences_with_directional_rates() {
        let runner = Arc::new(RecordingRunner::new());
        let report = receiver(runner.clone()).apply(&request(100.0, 100.0));
        assert!(report.all_succeeded());

        assert_eq!(
            runner.rendered(),
            [
                "tc qdisc del dev eth0 root",
                "tc qdisc add dev eth0 root handle 1:0 tbf rate 100000kbit buffer 1600 limit 3000",
                "tc qdisc add dev eth0 parent 1:1 handle 10: netem delay 100ms 100ms loss 100%",
                "tc qdisc del dev eth1 root",
                "tc qdisc add dev eth1 root handle 1:0 tbf rate 100000kbit buffer 1600 limit 3000",
                "tc qdisc add dev eth1 parent 1:1 handle 10: netem delay 100ms 100ms loss 100%",
            ]
        );
    }

    #[test]
    fn upload_and_download_land_on_their_interfaces() {
        let runner = Arc::new(RecordingRunner::new());
        receiver(runner.clone()).apply(&request(50.0, 10.0));
        let rates: Vec<_> = runner
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                TcCommand::RateLimit { dev, rate_kbit } => Some((dev.to_string(), rate_kbit)),
                _ => None,
            })
            .collect();
        assert_eq!(rates, [("eth0".to_string(), 10_000u64), ("eth1".to_string(), 50_000u64)]);
    }

    #[test]
    fn repeated_apply_clears_first_each_time() {
        let runner = Arc::new(RecordingRunner::new());
        let rx = receiver(runner.clone());
        rx.apply(&request(10.0, 1.0));
        rx.apply(&request(50.0, 10.0));
        let cmds = runner.commands();
        assert_eq!(cmds.len(), 12);
        assert_eq!(cmds[6].phase(), QdiscPhase::Clear);
        assert_eq!(cmds[6].dev().as_str(), "eth0");
    }

    #[test]
    fn failures_do_not_stop_later_phases() {
        let runner = Arc::new(RecordingRunner::failing(QdiscPhase::RateLimit));
        let report = receiver(runner.clone()).apply(&request(10.0, 1.0));
        assert_eq!(runner.commands().len(), 6);
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().count(), 2);
        let failed = &report.phases[1];
        assert_eq!(failed.interface, "eth0");
        assert_eq!(failed.phase, QdiscPhase::RateLimit);
        assert!(failed.error.as_deref().unwrap_or_default().starts_with("exit 2"));
        assert!(report.phases[2].success);
        assert!(report.phases[3].success);
    }

    #[test]
    fn first_apply_on_bare_interfaces_succeeds() {
        let runner = Arc::new(RecordingRunner::kernel_like());
        let rx = receiver(runner.clone());

        let first = rx.apply(&request(10.0, 1.0));
        assert!(first.all_succeeded(), "{first:?}");
        assert_eq!(first.failures().count(), 0);
        assert!(first.phases.iter().all(|p| p.error.is_none()));

        let second = rx.apply(&request(50.0, 10.0));
        assert!(second.all_succeeded());
        assert_eq!(runner.commands().len(), 12);
    }

    #[test]
    fn clear_that_cannot_spawn_is_still_a_failure() {
        struct Missing;
        impl CommandRunner for Missing {
            fn run(&self, _: &TcCommand) -> std::io::Result<crate::runner::CommandOutput> {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "tc not found"))
            }
        }
        let rx = InterfaceImpairmentReceiver::new(map(), Arc::new(Missing), Logger::new(LogLevel::Error));
        let report = rx.apply(&request(10.0, 1.0));
        assert_eq!(report.failures().count(), 6);
        assert_eq!(report.phases[0].error.as_deref(), Some("tc not found"));
    }
}
