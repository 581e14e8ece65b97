//! Execution of `tc` commands.

use std::io;
use std::process::Command;

use crate::tc::TcCommand;

/// Result of one executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            status: Some(0),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            status: Some(status),
            stderr: stderr.into(),
        }
    }
}

/// Runs traffic-control commands. Blocking.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &TcCommand) -> io::Result<CommandOutput>;
}

/// Executes `tc` on the host, optionally through `sudo`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    use_sudo: bool,
}

impl SystemRunner {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    fn command(&self, command: &TcCommand) -> Command {
        let mut cmd = if self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg("tc");
            cmd
        } else {
            Command::new("tc")
        };
        cmd.args(command.args());
        cmd
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &TcCommand) -> io::Result<CommandOutput> {
        let output = self.command(command).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Logs commands instead of running them.
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, command: &TcCommand) -> io::Result<CommandOutput> {
        tracing::info!(command = %command, "dry run");
        Ok(CommandOutput::ok())
    }
}
