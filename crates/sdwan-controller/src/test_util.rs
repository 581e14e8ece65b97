//! In-process fakes for tests.

use std::collections::HashSet;
use std::io;
use std::sync::Mutex;

use crate::runner::{CommandOutput, CommandRunner};
use crate::tc::{QdiscPhase, TcCommand};

#[derive(Debug, Default)]
enum Behaviour {
    #[default]
    Succeed,
    /// Every command of this phase exits non-zero.
    FailPhase(QdiscPhase),
    /// Tracks root qdiscs like the kernel: deleting a missing one fails.
    Kernel(HashSet<String>),
}

/// Records every command and answers with a canned result.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<TcCommand>>,
    behaviour: Mutex<Behaviour>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command of `phase` exits non-zero.
    pub fn failing(phase: QdiscPhase) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            behaviour: Mutex::new(Behaviour::FailPhase(phase)),
        }
    }

    /// Starts with no qdisc on any interface; `del` on a bare interface
    /// exits 2 the way `tc` does.
    pub fn kernel_like() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            behaviour: Mutex::new(Behaviour::Kernel(HashSet::new())),
        }
    }

    pub fn commands(&self) -> Vec<TcCommand> {
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.commands().iter().map(ToString::to_string).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &TcCommand) -> io::Result<CommandOutput> {
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(command.clone());

        let mut behaviour = self.behaviour.lock().unwrap_or_else(|e| e.into_inner());
        match &mut *behaviour {
            Behaviour::Succeed => Ok(CommandOutput::ok()),
            Behaviour::FailPhase(phase) if *phase == command.phase() => Ok(CommandOutput::failed(
                2,
                "RTNETLINK answers: No such file or directory",
            )),
            Behaviour::FailPhase(_) => Ok(CommandOutput::ok()),
            Behaviour::Kernel(configured) => {
                let dev = command.dev().to_string();
                match command.phase() {
                    QdiscPhase::Clear if !configured.remove(&dev) => Ok(CommandOutput::failed(
                        2,
                        "Error: Cannot delete qdisc with handle of zero.",
                    )),
                    QdiscPhase::RateLimit => {
                        configured.insert(dev);
                        Ok(CommandOutput::ok())
                    }
                    _ => Ok(CommandOutput::ok()),
                }
            }
        }
    }
}
