//! Demo sequencer: the stepped state machine behind the console button.
//!
//! ```text
//!  Idle ──advance──▶ Announce ──advance──▶ Run ──tick × max_ticks──▶ Cooldown ──advance──▶ Idle
//!                                          │                            ▲
//!                                          └────────── stop ────────────┘
//! ```
//!
//! The sequencer is pure: every transition returns a [`StepUpdate`]
//! describing the link values to push, the status text to show, and what to
//! do with the run timer. Applying updates (sending to controllers, driving
//! the timer, rendering) is the session's job.
//!
//! While in `Run` the sequencer is disabled and `advance()` is ignored
//! without touching any state. Each tick escalates loss, latency and jitter
//! by fixed steps from the previous primary readings; both links are derived
//! from the same source unless [`EscalationSource::Own`] is configured.

use std::time::Duration;

use sdwan_common::{ImpairmentParams, LinkPair};
use serde::{Deserialize, Serialize};

pub const STATUS_READY: &str = "Click the \"Start Test\" button to the left to begin the demo.";
pub const STATUS_CALL_SETUP: &str =
    "Initialize a phone call between the two sites and click 'Continue'";
pub const STATUS_RUNNING: &str = "Demo currently running...";
pub const STATUS_COMPLETE: &str = "Demo complete, click 'Reset' to start over...";

/// Rate caps (download, upload) in Mbps.
pub const PRIMARY_RATES: (f64, f64) = (50.0, 10.0);
pub const SECONDARY_RATES: (f64, f64) = (10.0, 1.0);

/// Baseline call conditions: 30 ms latency, no loss or jitter.
pub const CALL_SETUP: LinkPair = LinkPair::new(
    ImpairmentParams::new(0.0, 30.0, 0.0, PRIMARY_RATES.0, PRIMARY_RATES.1),
    ImpairmentParams::new(0.0, 30.0, 0.0, SECONDARY_RATES.0, SECONDARY_RATES.1),
);

/// Unimpaired links, rate caps only.
pub const READY: LinkPair = LinkPair::new(
    ImpairmentParams::new(0.0, 0.0, 0.0, PRIMARY_RATES.0, PRIMARY_RATES.1),
    ImpairmentParams::new(0.0, 0.0, 0.0, SECONDARY_RATES.0, SECONDARY_RATES.1),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Announce,
    Run,
    Cooldown,
}

impl Phase {
    pub fn step(self) -> u8 {
        match self {
            Phase::Idle => 0,
            Phase::Announce => 1,
            Phase::Run => 2,
            Phase::Cooldown => 3,
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            Phase::Idle => "Start Test",
            Phase::Announce => "Continue",
            Phase::Run => "Running",
            Phase::Cooldown => "Reset",
        }
    }
}

/// Per-tick increments applied during `Run`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscalationStep {
    pub packet_loss: f64,
    pub latency: f64,
    pub jitter: f64,
}

impl Default for EscalationStep {
    fn default() -> Self {
        Self {
            packet_loss: 5.0,
            latency: 22.0,
            jitter: 20.0,
        }
    }
}

impl EscalationStep {
    fn apply(&self, base: ImpairmentParams, rates: (f64, f64)) -> ImpairmentParams {
        ImpairmentParams {
            packet_loss: base.packet_loss + self.packet_loss,
            latency: base.latency + self.latency,
            jitter: base.jitter + self.jitter,
            ..base
        }
        .with_rates(rates.0, rates.1)
    }
}

/// Which readings the secondary link escalates from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationSource {
    /// Both links escalate from the primary's previous readings.
    #[default]
    Primary,
    /// Each link escalates from its own previous readings.
    Own,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequencerConfig {
    pub tick_interval: Duration,
    pub max_ticks: u32,
    pub escalation: EscalationStep,
    pub escalation_source: EscalationSource,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1000),
            max_ticks: 10,
            escalation: EscalationStep::default(),
            escalation_source: EscalationSource::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Keep,
    Arm(Duration),
    Cancel,
}

/// One set of values to push to both controllers and the display.
#[derive(Debug, Clone, PartialEq)]
pub struct StepUpdate {
    pub phase: Phase,
    pub status: &'static str,
    pub pair: LinkPair,
    pub timer: TimerCommand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Applied(StepUpdate),
    /// The sequencer is disabled (mid-run); nothing changed.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub escalation: StepUpdate,
    /// Present on the tick that reaches the tick bound.
    pub completion: Option<StepUpdate>,
}

/// Read-only view of the sequencer for observers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerState {
    pub phase: Phase,
    pub tick_count: u32,
    pub enabled: bool,
    pub click_count: u32,
    pub status: &'static str,
    pub pair: LinkPair,
}

#[derive(Debug, Clone)]
pub struct DemoSequencer {
    config: SequencerConfig,
    phase: Phase,
    tick_count: u32,
    enabled: bool,
    click_count: u32,
    status: &'static str,
    pair: LinkPair,
}

impl DemoSequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            tick_count: 0,
            enabled: true,
            click_count: 0,
            status: STATUS_READY,
            pair: LinkPair::default(),
        }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    pub fn pair(&self) -> LinkPair {
        self.pair
    }

    pub fn state(&self) -> SequencerState {
        SequencerState {
            phase: self.phase,
            tick_count: self.tick_count,
            enabled: self.enabled,
            click_count: self.click_count,
            status: self.status,
            pair: self.pair,
        }
    }

    pub fn advance(&mut self) -> Advance {
        if !self.enabled {
            return Advance::Ignored;
        }

        let update = match self.phase {
            Phase::Run => return Advance::Ignored,
            Phase::Idle => {
                self.click_count += 1;
                self.enter(
                    Phase::Announce,
                    STATUS_CALL_SETUP,
                    CALL_SETUP,
                    TimerCommand::Keep,
                )
            }
            Phase::Announce => {
                self.click_count += 1;
                self.enabled = false;
                let interval = self.config.tick_interval;
                self.enter(
                    Phase::Run,
                    STATUS_RUNNING,
                    CALL_SETUP,
                    TimerCommand::Arm(interval),
                )
            }
            Phase::Cooldown => {
                self.click_count = 0;
                self.tick_count = 0;
                self.enter(Phase::Idle, STATUS_READY, READY, TimerCommand::Keep)
            }
        };
        Advance::Applied(update)
    }

    /// One run-timer tick. `None` outside `Run` (stale timer).
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if self.phase != Phase::Run {
            return None;
        }

        let previous = self.pair;
        let step = self.config.escalation;
        let secondary_base = match self.config.escalation_source {
            EscalationSource::Primary => previous.primary,
            EscalationSource::Own => previous.secondary,
        };
        let next = LinkPair::new(
            step.apply(previous.primary, PRIMARY_RATES),
            step.apply(secondary_base, SECONDARY_RATES),
        );

        self.tick_count += 1;
        let escalation = self.enter(Phase::Run, STATUS_RUNNING, next, TimerCommand::Keep);
        let completion = (self.tick_count >= self.config.max_ticks).then(|| self.complete());

        Some(TickOutcome {
            escalation,
            completion,
        })
    }

    /// Cut a run short, as if the tick bound had been reached.
    pub fn stop(&mut self) -> Option<StepUpdate> {
        (self.phase == Phase::Run).then(|| self.complete())
    }

    fn complete(&mut self) -> StepUpdate {
        self.enabled = true;
        self.tick_count = 0;
        self.enter(
            Phase::Cooldown,
            STATUS_COMPLETE,
            CALL_SETUP,
            TimerCommand::Cancel,
        )
    }

    fn enter(
        &mut self,
        phase: Phase,
        status: &'static str,
        pair: LinkPair,
        timer: TimerCommand,
    ) -> StepUpdate {
        self.phase = phase;
        self.status = status;
        self.pair = pair;
        StepUpdate {
            phase,
            status,
            pair,
            timer,
        }
    }
}

impl Default for DemoSequencer {
    fn default() -> Self {
        Self::new(SequencerConfig::default())
    }
}
