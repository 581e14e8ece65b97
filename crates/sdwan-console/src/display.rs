//! Display snapshot and observer seam.
//!
//! The sequencer never renders anything itself; the session builds a
//! [`DisplaySnapshot`] after every update and hands it to each registered
//! [`StateObserver`]. Only the primary link's numbers are mirrored into the
//! text fields.

use serde::{Deserialize, Serialize};

use crate::sequencer::{Phase, SequencerState};
use crate::telemetry::LinkCounters;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub primary: LinkCounters,
    pub secondary: LinkCounters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub status_text: String,
    pub primary_packet_loss_text: String,
    pub primary_latency_text: String,
    pub primary_jitter_text: String,
    pub button_label: String,
    pub phase: Phase,
    pub step: u8,
    pub enabled: bool,
    pub click_count: u32,
    pub tick_count: u32,
    pub links: SessionCounters,
}

impl DisplaySnapshot {
    pub fn new(state: &SequencerState, links: SessionCounters) -> Self {
        let primary = state.pair.primary;
        Self {
            status_text: state.status.to_string(),
            primary_packet_loss_text: percent_text(primary.packet_loss),
            primary_latency_text: ms_text(primary.latency),
            primary_jitter_text: ms_text(primary.jitter),
            button_label: state.phase.button_label().to_string(),
            phase: state.phase,
            step: state.phase.step(),
            enabled: state.enabled,
            click_count: state.click_count,
            tick_count: state.tick_count,
            links,
        }
    }
}

pub fn percent_text(value: f64) -> String {
    format!("{} %", rounded(value))
}

pub fn ms_text(value: f64) -> String {
    format!("{} ms", rounded(value))
}

/// Three decimals at most; accumulated float error is not shown.
fn rounded(value: f64) -> f64 {
    let r = (value * 1000.0).round() / 1000.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Receives a snapshot after every state change.
pub trait StateObserver: Send + Sync {
    fn on_state_change(&self, snapshot: &DisplaySnapshot);
}

/// Mirrors status changes into the process log.
pub struct LogObserver {
    logger: sdwan_common::Logger,
}

impl LogObserver {
    pub fn new(logger: sdwan_common::Logger) -> Self {
        Self { logger }
    }
}

impl StateObserver for LogObserver {
    fn on_state_change(&self, snapshot: &DisplaySnapshot) {
        self.logger.debug(format!(
            "display: [{}] {} | loss {} | latency {} | jitter {}",
            snapshot.button_label,
            snapshot.status_text,
            snapshot.primary_packet_loss_text,
            snapshot.primary_latency_text,
            snapshot.primary_jitter_text
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::{Advance, DemoSequencer};

    #[test]
    fn numbers_render_without_trailing_zeroes() {
        assert_eq!(percent_text(5.0), "5 %");
        assert_eq!(ms_text(52.0), "52 ms");
        assert_eq!(ms_text(12.5), "12.5 ms");
    }

    #[test]
    fn accumulated_fractional_steps_render_cleanly() {
        let mut loss = 0.0;
        for _ in 0..3 {
            loss += 0.1;
        }
        assert_eq!(percent_text(loss), "0.3 %");
        assert_eq!(ms_text(22.0 * 3.0 + 0.1 * 3.0), "66.3 ms");
        assert_eq!(ms_text(1.0 / 3.0), "0.333 ms");
        assert_eq!(percent_text(-0.0), "0 %");
    }

    #[test]
    fn snapshot_mirrors_primary_only() {
        let mut seq = DemoSequencer::default();
        assert!(matches!(seq.advance(), Advance::Applied(_)));
        assert!(matches!(seq.advance(), Advance::Applied(_)));
        seq.tick();

        let snap = DisplaySnapshot::new(&seq.state(), SessionCounters::default());
        assert_eq!(snap.primary_packet_loss_text, "5 %");
        assert_eq!(snap.primary_latency_text, "52 ms");
        assert_eq!(snap.primary_jitter_text, "20 ms");
        assert_eq!(snap.button_label, "Running");
        assert_eq!(snap.step, 2);
        assert!(!snap.enabled);
        assert_eq!(snap.tick_count, 1);
    }

    #[test]
    fn initial_snapshot_shows_prompt() {
        let seq = DemoSequencer::default();
        let snap = DisplaySnapshot::new(&seq.state(), SessionCounters::default());
        assert_eq!(
            snap.status_text,
            "Click the \"Start Test\" button to the left to begin the demo."
        );
        assert_eq!(snap.primary_packet_loss_text, "0 %");
        assert_eq!(snap.button_label, "Start Test");
    }
}
