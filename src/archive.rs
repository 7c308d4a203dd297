//! Archive-producer collaborator
//!
//! One archive run per selected directory. The producer writes the archive to
//! the tape and emits a textual listing; the pipeline only looks at that
//! listing (for the progress display) and at the exit status.

use crate::backup_config::BlockSize;
use crate::error::{CsaveError, Result};
use crate::sentinel::format_cutoff;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

/// Lines of the producer's error stream kept for the failure detail.
const STDERR_TAIL_LINES: usize = 20;

/// Longest progress line kept; the remainder of a longer line is dropped.
const MAX_LINE_BYTES: usize = 4096;

/// Archive name that makes tar write the archive to its standard output.
const STDOUT_ARCHIVE: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub directory: PathBuf,
    pub block_size: BlockSize,
    pub one_file_system: bool,
    pub exclude_snapshot_metadata: bool,
    /// Only archive files modified after this date
    pub newer_than: Option<NaiveDate>,
}

impl ArchiveRequest {
    pub fn new(directory: impl Into<PathBuf>, block_size: BlockSize) -> Self {
        Self {
            directory: directory.into(),
            block_size,
            one_file_system: true,
            exclude_snapshot_metadata: true,
            newer_than: None,
        }
    }

    pub fn with_cutoff(mut self, cutoff: Option<NaiveDate>) -> Self {
        self.newer_than = cutoff;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveExit {
    Success,
    Failed { status: Option<i32>, detail: String },
}

impl ArchiveExit {
    pub fn is_success(&self) -> bool {
        matches!(self, ArchiveExit::Success)
    }
}

/// A started producer whose output is being consumed.
#[async_trait]
pub trait ArchiveRun: Send {
    /// Next line of progress output, `None` once the producer closed its
    /// output streams.
    async fn next_line(&mut self) -> Result<Option<String>>;

    /// Wait for the producer to exit.
    async fn wait(self: Box<Self>) -> Result<ArchiveExit>;
}

#[async_trait]
pub trait ArchiveProducer: Send + Sync {
    /// Launch the producer for `request`. An error here means nothing was
    /// written for the directory.
    async fn start(&self, request: &ArchiveRequest) -> Result<Box<dyn ArchiveRun>>;
}

/// Archive producer backed by `tar`. The archive always goes to `device`;
/// the standard output stream carries only the verbose listing.
pub struct TarArchiver {
    binary: PathBuf,
    device: String,
    exclude: String,
}

impl TarArchiver {
    pub fn new(
        binary: impl Into<PathBuf>,
        device: impl Into<String>,
        exclude: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            device: device.into(),
            exclude: exclude.into(),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Arguments for archiving `request.directory`, which becomes the working
    /// directory so member names are relative.
    pub fn arguments(&self, request: &ArchiveRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-c".into(),
            "-v".into(),
            "--totals".into(),
            "-b".into(),
            request.block_size.to_string().into(),
        ];
        if request.one_file_system {
            args.push("--one-file-system".into());
        }
        if request.exclude_snapshot_metadata {
            args.push(format!("--exclude={}", self.exclude).into());
        }
        if let Some(cutoff) = request.newer_than {
            args.push(format!("--newer-mtime={}", format_cutoff(cutoff)).into());
        }
        args.push("-f".into());
        args.push(self.device.as_str().into());
        args.push(".".into());
        args
    }
}

#[async_trait]
impl ArchiveProducer for TarArchiver {
    async fn start(&self, request: &ArchiveRequest) -> Result<Box<dyn ArchiveRun>> {
        let device = self.device.trim();
        if device.is_empty() || device == STDOUT_ARCHIVE {
            return Err(CsaveError::archive_producer(format!(
                "Refusing to archive {}: no tape device (got {:?})",
                request.directory.display(),
                self.device
            )));
        }

        let args = self.arguments(request);
        debug!(
            "Starting {} {:?} in {}",
            self.binary.display(),
            args,
            request.directory.display()
        );

        let mut child = Command::new(&self.binary)
            .args(&args)
            .current_dir(&request.directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CsaveError::archive_producer(format!(
                    "Cannot start {} in {}: {}",
                    self.binary.display(),
                    request.directory.display(),
                    e
                ))
            })?;

        let stdout = child.stdout.take().map(CappedLines::new);
        let stderr = child.stderr.take().map(CappedLines::new);

        Ok(Box::new(TarRun {
            child,
            directory: request.directory.clone(),
            stdout,
            stderr,
            stderr_tail: VecDeque::with_capacity(STDERR_TAIL_LINES),
            totals: None,
        }))
    }
}

struct TarRun {
    child: Child,
    directory: PathBuf,
    stdout: Option<CappedLines<ChildStdout>>,
    stderr: Option<CappedLines<ChildStderr>>,
    stderr_tail: VecDeque<String>,
    totals: Option<String>,
}

impl TarRun {
    fn remember_stderr(&mut self, line: &str) {
        if line.starts_with("Total bytes written") {
            self.totals = Some(line.to_string());
        }
        if self.stderr_tail.len() == STDERR_TAIL_LINES {
            self.stderr_tail.pop_front();
        }
        self.stderr_tail.push_back(line.to_string());
    }
}

/// Newline-delimited reader with a bounded line buffer. Partial lines live
/// in `pending`, so a `next_line` future dropped by `select!` loses nothing.
struct CappedLines<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin> CappedLines<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
        }
    }

    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_line()));
            }

            let (end, consumed, complete) = match available.iter().position(|b| *b == b'\n') {
                Some(pos) => (pos, pos + 1, true),
                None => (available.len(), available.len(), false),
            };
            let room = MAX_LINE_BYTES.saturating_sub(self.pending.len());
            self.pending
                .extend_from_slice(&available[..end.min(room)]);
            self.reader.consume(consumed);

            if complete {
                return Ok(Some(self.take_line()));
            }
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.pending)
            .trim_end_matches('\r')
            .to_string();
        self.pending.clear();
        line
    }
}

async fn next_segment<R>(stream: &mut Option<CappedLines<R>>) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    match stream {
        Some(lines) => lines.next_line().await,
        None => std::future::pending().await,
    }
}

#[async_trait]
impl ArchiveRun for TarRun {
    async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if self.stdout.is_none() && self.stderr.is_none() {
                return Ok(None);
            }

            tokio::select! {
                line = next_segment(&mut self.stdout) => match line? {
                    Some(line) => return Ok(Some(line)),
                    None => self.stdout = None,
                },
                line = next_segment(&mut self.stderr) => match line? {
                    Some(line) => {
                        self.remember_stderr(&line);
                        return Ok(Some(line));
                    }
                    None => self.stderr = None,
                },
            }
        }
    }

    async fn wait(mut self: Box<Self>) -> Result<ArchiveExit> {
        // Unread output would block the child forever.
        self.stdout = None;
        self.stderr = None;

        let status = self.child.wait().await?;
        if let Some(totals) = &self.totals {
            info!("{}: {}", self.directory.display(), totals);
        }

        if status.success() {
            return Ok(ArchiveExit::Success);
        }

        let detail = self.stderr_tail.iter().cloned().collect::<Vec<_>>().join("\n");
        warn!(
            "Archive producer for {} exited with {}",
            self.directory.display(),
            status
        );
        Ok(ArchiveExit::Failed {
            status: status.code(),
            detail,
        })
    }
}
