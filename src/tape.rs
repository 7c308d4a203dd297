//! Tape-control collaborator
//!
//! The pipeline only ever needs three things from the drive: is there a tape,
//! move to end of data, and take the tape offline. `MtTapeControl` does this
//! through the `mt` utility.

use crate::error::{CsaveError, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapeCommand {
    Status,
    SeekEndOfData,
    Eject,
}

impl TapeCommand {
    /// `mt` operation name
    pub fn mt_operation(&self) -> &'static str {
        match self {
            TapeCommand::Status => "status",
            TapeCommand::SeekEndOfData => "eod",
            TapeCommand::Eject => "offline",
        }
    }
}

impl fmt::Display for TapeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TapeCommand::Status => "status",
            TapeCommand::SeekEndOfData => "seek-end-of-data",
            TapeCommand::Eject => "eject",
        };
        f.write_str(name)
    }
}

/// Exit status and error-stream text of one tape-control invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeOutcome {
    pub status: i32,
    pub detail: String,
}

impl TapeOutcome {
    pub fn success() -> Self {
        Self {
            status: 0,
            detail: String::new(),
        }
    }

    pub fn failure(status: i32, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// Turn a non-zero status into the fatal tape error.
    pub fn into_result(self, command: TapeCommand) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        error!(
            "Tape {} failed with status {}: {}",
            command,
            self.status,
            self.detail.trim_end()
        );
        Err(CsaveError::tape_control(self.status, self.detail))
    }
}

#[async_trait]
pub trait TapeControl: Send + Sync {
    /// Run `command` to completion.
    async fn execute(&self, command: TapeCommand) -> TapeOutcome;
}

pub struct MtTapeControl {
    binary: PathBuf,
    device: Option<String>,
}

impl MtTapeControl {
    pub fn new(binary: impl Into<PathBuf>, device: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            device,
        }
    }

    fn build_command(&self, command: TapeCommand) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(device) = &self.device {
            cmd.arg("-f").arg(device);
        }
        cmd.arg(command.mt_operation());
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl TapeControl for MtTapeControl {
    async fn execute(&self, command: TapeCommand) -> TapeOutcome {
        debug!(
            "Running {} {} (device: {})",
            self.binary.display(),
            command.mt_operation(),
            self.device.as_deref().unwrap_or("<default>")
        );

        let output = match self.build_command(command).output().await {
            Ok(output) => output,
            Err(e) => {
                // Could not even run mt; the drive state is unknown.
                return TapeOutcome::failure(
                    1,
                    format!("Cannot run {}: {}", self.binary.display(), e),
                );
            }
        };

        let detail = String::from_utf8_lossy(&output.stderr).into_owned();
        match output.status.code() {
            Some(0) => TapeOutcome::success(),
            Some(code) => TapeOutcome::failure(code, detail),
            None => TapeOutcome::failure(
                1,
                format!("{} terminated by signal. {}", self.binary.display(), detail),
            ),
        }
    }
}
