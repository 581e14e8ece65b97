//! Demo session: owns the sequencer, both controller clients, the run
//! timer, and the observers.
//!
//! Every [`StepUpdate`] from the sequencer is applied the same way: write
//! the new values into both clients, send both (independently, without
//! waiting for acknowledgement), handle the timer command, then publish a
//! fresh [`DisplaySnapshot`]. Ticks run under the session lock, so they
//! never overlap with each other or with a button press.

use std::sync::Arc;

use sdwan_common::Logger;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

use crate::client::ImpairmentClient;
use crate::display::{DisplaySnapshot, SessionCounters, StateObserver};
use crate::sequencer::{Advance, DemoSequencer, StepUpdate, TimerCommand};
use crate::telemetry::LinkTelemetry;

/// Outcome of a session-level command.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub applied: bool,
    pub snapshot: DisplaySnapshot,
}

#[derive(Clone)]
pub struct DemoSession {
    inner: Arc<Mutex<SessionCore>>,
    updates: Arc<watch::Sender<DisplaySnapshot>>,
}

struct SessionCore {
    sequencer: DemoSequencer,
    primary: ImpairmentClient,
    secondary: ImpairmentClient,
    primary_telemetry: Arc<LinkTelemetry>,
    secondary_telemetry: Arc<LinkTelemetry>,
    observers: Vec<Arc<dyn StateObserver>>,
    timer: Option<JoinHandle<()>>,
    logger: Logger,
}

impl SessionCore {
    fn snapshot(&self) -> DisplaySnapshot {
        let links = SessionCounters {
            primary: self.primary_telemetry.counters(),
            secondary: self.secondary_telemetry.counters(),
        };
        DisplaySnapshot::new(&self.sequencer.state(), links)
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl DemoSession {
    /// Both clients must already be configured with their endpoints.
    pub fn new(
        sequencer: DemoSequencer,
        primary: ImpairmentClient,
        secondary: ImpairmentClient,
        logger: Logger,
    ) -> Self {
        let core = SessionCore {
            sequencer,
            primary,
            secondary,
            primary_telemetry: LinkTelemetry::new(),
            secondary_telemetry: LinkTelemetry::new(),
            observers: Vec::new(),
            timer: None,
            logger,
        };
        let (updates, _) = watch::channel(core.snapshot());
        Self {
            inner: Arc::new(Mutex::new(core)),
            updates: Arc::new(updates),
        }
    }

    pub async fn add_observer(&self, observer: Arc<dyn StateObserver>) {
        self.inner.lock().await.observers.push(observer);
    }

    /// Latest published snapshot, updated on every state change.
    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.updates.subscribe()
    }

    /// Fresh snapshot including current dispatch counters.
    pub async fn snapshot(&self) -> DisplaySnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Button press. Ignored while a run is in progress.
    pub async fn advance(&self) -> StepResult {
        let mut core = self.inner.lock().await;
        match core.sequencer.advance() {
            Advance::Applied(update) => {
                core.logger.info(format!(
                    "DemoSession - advance(): button pressed, click count {}",
                    core.sequencer.click_count()
                ));
                let snapshot = self.apply(&mut core, update);
                StepResult {
                    applied: true,
                    snapshot,
                }
            }
            Advance::Ignored => {
                core.logger
                    .debug("DemoSession - advance(): ignored, demo is running");
                StepResult {
                    applied: false,
                    snapshot: core.snapshot(),
                }
            }
        }
    }

    /// Abort a run early. Ignored outside the run phase.
    pub async fn stop(&self) -> StepResult {
        let mut core = self.inner.lock().await;
        match core.sequencer.stop() {
            Some(update) => {
                core.logger.info("DemoSession - stop(): run cancelled");
                let snapshot = self.apply(&mut core, update);
                StepResult {
                    applied: true,
                    snapshot,
                }
            }
            None => StepResult {
                applied: false,
                snapshot: core.snapshot(),
            },
        }
    }

    fn apply(&self, core: &mut SessionCore, update: StepUpdate) -> DisplaySnapshot {
        core.primary.set_params(update.pair.primary);
        core.secondary.set_params(update.pair.secondary);

        let primary = core.primary.send();
        core.primary_telemetry.observe(primary);
        let secondary = core.secondary.send();
        core.secondary_telemetry.observe(secondary);

        match update.timer {
            TimerCommand::Keep => {}
            TimerCommand::Arm(period) => {
                core.cancel_timer();
                core.timer = Some(self.spawn_timer(period));
            }
            TimerCommand::Cancel => core.cancel_timer(),
        }

        let snapshot = core.snapshot();
        for observer in &core.observers {
            observer.on_state_change(&snapshot);
        }
        self.updates.send_replace(snapshot.clone());
        snapshot
    }

    fn spawn_timer(&self, period: Duration) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !session.on_tick().await {
                    break;
                }
            }
        })
    }

    /// Returns whether the timer should keep running.
    async fn on_tick(&self) -> bool {
        let mut core = self.inner.lock().await;
        let Some(outcome) = core.sequencer.tick() else {
            return false;
        };

        self.apply(&mut core, outcome.escalation);
        core.logger.debug(format!(
            "DemoSession - tick(): tick {} of {}",
            core.sequencer.tick_count(),
            core.sequencer.config().max_ticks
        ));

        match outcome.completion {
            Some(done) => {
                // The completion update cancels this very task; drop the
                // handle first so we only stop by returning.
                core.timer = None;
                self.apply(&mut core, done);
                core.logger.info("DemoSession - tick(): run complete");
                false
            }
            None => true,
        }
    }
}
