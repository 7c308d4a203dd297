//! Backup Execution Pipeline
//!
//! Runs one confirmed configuration against the tape:
//!
//! 1. wait for the operator to load a tape and probe its status
//! 2. seek to end of data when appending
//! 3. derive the differential cutoff from the last-dump sentinel
//! 4. archive each selected directory in order, streaming progress
//! 5. eject if requested (always attempted once the tape is positioned)
//! 6. advance the sentinel when every directory was archived
//! 7. show the final report
//!
//! A failing tape-control command is fatal: the error detail is shown and
//! `run` returns [`crate::error::CsaveError::TapeControl`], whose status becomes the process
//! exit code. Archive failures only shorten the completed list.

use crate::archive::{ArchiveExit, ArchiveProducer, ArchiveRequest};
use crate::backup_config::{BackupConfiguration, BackupMode, TapeMode};
use crate::console::Console;
use crate::display::{render_progress_text, render_report};
use crate::error::Result;
use crate::sentinel::{format_cutoff, parse_cutoff, LastDumpSentinel};
use crate::tape::{TapeCommand, TapeControl};
use chrono::NaiveDate;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every selected directory was archived
    Completed,
    /// At least one directory failed or was never reached
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryFailure {
    pub directory: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRunResult {
    /// Directories archived successfully, in archive order
    pub completed: Vec<String>,
    pub failed: Vec<DirectoryFailure>,
    pub status: RunStatus,
    pub sentinel_advanced: bool,
    pub elapsed: Duration,
}

/// Tape held positioned for writing. Must be handed back through
/// [`MountedTape::release`], which performs the teardown.
#[must_use = "the tape must be released so teardown runs"]
pub struct MountedTape<'a> {
    tape: &'a dyn TapeControl,
    released: bool,
}

impl<'a> MountedTape<'a> {
    /// Position the loaded tape for writing according to `tape_mode`.
    pub async fn acquire(
        tape: &'a dyn TapeControl,
        console: &mut dyn Console,
        tape_mode: TapeMode,
    ) -> Result<MountedTape<'a>> {
        match tape_mode {
            TapeMode::Append => {
                info!("Append mode: seeking to end of data");
                run_tape_command(tape, console, TapeCommand::SeekEndOfData).await?;
            }
            TapeMode::Overwrite => debug!("Overwrite mode: writing from current position"),
        }
        Ok(MountedTape {
            tape,
            released: false,
        })
    }

    pub async fn release(mut self, console: &mut dyn Console, auto_eject: bool) -> Result<()> {
        self.released = true;
        if auto_eject {
            info!("Ejecting tape");
            run_tape_command(self.tape, console, TapeCommand::Eject).await
        } else {
            info!("Leaving tape in the drive");
            Ok(())
        }
    }
}

impl Drop for MountedTape<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!("Tape session dropped without teardown; tape may still be loaded");
        }
    }
}

/// Run one tape-control command; on failure show the raw detail to the
/// operator and return the fatal error.
pub async fn run_tape_command(
    tape: &dyn TapeControl,
    console: &mut dyn Console,
    command: TapeCommand,
) -> Result<()> {
    let outcome = tape.execute(command).await;
    if !outcome.is_success() {
        console.error("Tape Error", &outcome.detail);
    }
    outcome.into_result(command)
}

#[derive(Debug, Default)]
struct ArchiveProgress {
    completed: Vec<String>,
    failed: Vec<DirectoryFailure>,
}

pub struct BackupPipeline<'a> {
    tape: &'a dyn TapeControl,
    archiver: &'a dyn ArchiveProducer,
    sentinel: &'a LastDumpSentinel,
}

impl<'a> BackupPipeline<'a> {
    pub fn new(
        tape: &'a dyn TapeControl,
        archiver: &'a dyn ArchiveProducer,
        sentinel: &'a LastDumpSentinel,
    ) -> Self {
        Self {
            tape,
            archiver,
            sentinel,
        }
    }

    pub async fn run(
        &self,
        console: &mut dyn Console,
        config: &BackupConfiguration,
    ) -> Result<BackupRunResult> {
        let started = Instant::now();
        debug!("Starting backup with {:?}", config);

        self.wait_for_tape(console).await?;
        let mounted = MountedTape::acquire(self.tape, console, config.tape_mode).await?;

        let cutoff = match config.mode {
            BackupMode::Differential => self.confirm_cutoff(console),
            BackupMode::Full => None,
        };

        let progress = self.archive_all(console, config, cutoff).await;

        mounted.release(console, config.auto_eject).await?;

        let all_archived = progress.failed.is_empty()
            && progress.completed.len() == config.selected_directories().len();
        let status = if all_archived {
            RunStatus::Completed
        } else {
            RunStatus::Incomplete
        };

        let sentinel_advanced = if all_archived && !progress.completed.is_empty() {
            match self.sentinel.advance() {
                Ok(()) => true,
                Err(e) => {
                    error!("Cannot update last dump sentinel: {}", e);
                    console.error("Sentinel Error", &e.to_string());
                    false
                }
            }
        } else {
            if !all_archived {
                warn!(
                    "Backup incomplete ({} of {} directories); sentinel left unchanged",
                    progress.completed.len(),
                    config.selected_directories().len()
                );
            }
            false
        };

        let elapsed = started.elapsed();
        console.scroll_box(
            "Backup Complete",
            &render_report(&progress.completed, elapsed),
        );
        info!(
            "Backup finished: {} completed, {} failed, {:?}",
            progress.completed.len(),
            progress.failed.len(),
            status
        );

        Ok(BackupRunResult {
            completed: progress.completed,
            failed: progress.failed,
            status,
            sentinel_advanced,
            elapsed,
        })
    }

    async fn wait_for_tape(&self, console: &mut dyn Console) -> Result<()> {
        console.message("Load Tape", "Please insert a tape.");
        run_tape_command(self.tape, console, TapeCommand::Status).await
    }

    /// Ask the operator to confirm or override the differential cutoff. An
    /// empty answer means no cutoff.
    fn confirm_cutoff(&self, console: &mut dyn Console) -> Option<NaiveDate> {
        let last = match self.sentinel.last_date() {
            Ok(date) => date,
            Err(e) => {
                warn!("Cannot read last dump sentinel: {}", e);
                None
            }
        };
        if last.is_none() {
            info!("No previous dump recorded");
        }
        let suggested = last.map(format_cutoff).unwrap_or_default();

        loop {
            let answer = console
                .input(
                    "Last Backup Time",
                    "Enter last backup time in YYYY-mm-dd format:",
                    &suggested,
                )
                .unwrap_or_else(|| suggested.clone());

            if answer.trim().is_empty() {
                info!("No differential cutoff; archiving all files");
                return None;
            }
            match parse_cutoff(&answer) {
                Ok(date) => {
                    info!("Differential cutoff: files newer than {}", format_cutoff(date));
                    return Some(date);
                }
                Err(e) => console.error("Invalid Date", &e.to_string()),
            }
        }
    }

    /// Archive every selected directory in order. Stops at the first
    /// directory whose producer cannot be started; a producer that starts but
    /// exits non-zero is recorded and the next directory is tried.
    async fn archive_all(
        &self,
        console: &mut dyn Console,
        config: &BackupConfiguration,
        cutoff: Option<NaiveDate>,
    ) -> ArchiveProgress {
        let mut progress = ArchiveProgress::default();

        for directory in config.selected_directories() {
            let request = ArchiveRequest::new(directory, config.block_size).with_cutoff(cutoff);

            let mut run = match self.archiver.start(&request).await {
                Ok(run) => run,
                Err(e) => {
                    error!("Cannot archive {}: {}", directory, e);
                    console.error("Archive Error", &e.to_string());
                    progress.failed.push(DirectoryFailure {
                        directory: directory.clone(),
                        reason: e.to_string(),
                    });
                    break;
                }
            };

            console.progress_begin(
                &format!("Backing up {}", directory),
                &render_progress_text(&progress.completed, directory),
            );
            let streamed = loop {
                match run.next_line().await {
                    Ok(Some(line)) => console.progress_line(&line),
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                }
            };
            console.progress_end();

            let exit = match streamed {
                Ok(()) => run.wait().await,
                Err(e) => {
                    if let Err(wait_err) = run.wait().await {
                        debug!("Waiting after read failure: {}", wait_err);
                    }
                    Err(e)
                }
            };

            match exit {
                Ok(ArchiveExit::Success) => {
                    info!("Archived {}", directory);
                    progress.completed.push(directory.clone());
                }
                Ok(ArchiveExit::Failed { status, detail }) => {
                    let reason = match status {
                        Some(code) => format!("exit status {}: {}", code, detail),
                        None => format!("terminated by signal: {}", detail),
                    };
                    warn!("Archiving {} failed, {}", directory, reason);
                    progress.failed.push(DirectoryFailure {
                        directory: directory.clone(),
                        reason,
                    });
                }
                Err(e) => {
                    warn!("Archiving {} failed: {}", directory, e);
                    progress.failed.push(DirectoryFailure {
                        directory: directory.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup_config::BlockSize;
    use crate::mock::{
        Answer, ArchiveBehavior, Event, EventLog, RecordingTape, ScriptedArchiver,
        ScriptedConsole, Shown,
    };
    use chrono::{Local, TimeZone};
    use std::path::PathBuf;
    use std::time::SystemTime;
    use tempfile::{tempdir, TempDir};

    fn dirs(list: &[&str]) -> Vec<String> {
        list.iter().map(|d| d.to_string()).collect()
    }

    fn config(catalog: &[String]) -> BackupConfiguration {
        BackupConfiguration::with_catalog(catalog)
    }

    fn sentinel_in(dir: &TempDir) -> LastDumpSentinel {
        LastDumpSentinel::new(dir.path().join("lastdump"))
    }

    fn jan_first_2024() -> SystemTime {
        Local
            .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn test_scenario_full_overwrite_success() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone());
        let mut console = ScriptedConsole::default();

        let catalog = dirs(&["/data", "/home"]);
        let pipeline = BackupPipeline::new(&tape, &archiver, &sentinel);
        let result = pipeline.run(&mut console, &config(&catalog)).await.unwrap();

        assert_eq!(result.completed, ["/data", "/home"]);
        assert_eq!(result.status, RunStatus::Completed);
        assert!(result.sentinel_advanced);
        assert!(sentinel.last_time().is_ok());
        assert_eq!(log.count(TapeCommand::Eject), 1);
        assert_eq!(log.count(TapeCommand::SeekEndOfData), 0);
        assert!(archiver.requests().iter().all(|r| r.newer_than.is_none()));

        assert_eq!(
            log.events(),
            vec![
                Event::Tape(TapeCommand::Status),
                Event::ArchiveStarted(PathBuf::from("/data")),
                Event::ArchiveFinished(PathBuf::from("/data")),
                Event::ArchiveStarted(PathBuf::from("/home")),
                Event::ArchiveFinished(PathBuf::from("/home")),
                Event::Tape(TapeCommand::Eject),
            ]
        );

        let reports = console.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("/data\n/home"));
    }

    #[tokio::test]
    async fn test_scenario_differential_uses_sentinel_date() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        sentinel.touch(jan_first_2024()).unwrap();

        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone());
        // Operator accepts the suggested date unchanged
        let mut console = ScriptedConsole::new([Answer::Input(Some("2024-01-01".into()))]);

        let catalog = dirs(&["/data", "/home"]);
        let mut cfg = config(&catalog);
        cfg.mode = BackupMode::Differential;

        let pipeline = BackupPipeline::new(&tape, &archiver, &sentinel);
        let result = pipeline.run(&mut console, &cfg).await.unwrap();

        assert!(console.transcript().contains(&Shown::Input {
            title: "Last Backup Time".into(),
            initial: "2024-01-01".into(),
        }));
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1);
        let requests = archiver.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.newer_than == expected));

        assert_eq!(result.status, RunStatus::Completed);
        assert!(sentinel.last_time().unwrap() > jan_first_2024());
    }

    #[tokio::test]
    async fn test_scenario_status_probe_failure_is_fatal() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape =
            RecordingTape::new(log.clone()).fail_on(TapeCommand::Status, 1, "no tape loaded");
        let archiver = ScriptedArchiver::new(log.clone());
        let mut console = ScriptedConsole::default();

        let catalog = dirs(&["/data", "/home"]);
        let pipeline = BackupPipeline::new(&tape, &archiver, &sentinel);
        let err = pipeline
            .run(&mut console, &config(&catalog))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(err.is_fatal_tape_error());
        assert_eq!(
            console.errors(),
            vec![("Tape Error".to_string(), "no tape loaded".to_string())]
        );
        assert!(archiver.requests().is_empty());
        assert_eq!(log.tape_commands(), vec![TapeCommand::Status]);
        assert!(sentinel.last_time().is_err());
        assert!(console.reports().is_empty());
    }

    #[tokio::test]
    async fn test_scenario_start_failure_stops_and_still_ejects() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone()).with_behavior(
            "/home",
            ArchiveBehavior::FailToStart("No such file or directory".into()),
        );
        let mut console = ScriptedConsole::default();

        let catalog = dirs(&["/data", "/home", "/srv"]);
        let pipeline = BackupPipeline::new(&tape, &archiver, &sentinel);
        let result = pipeline.run(&mut console, &config(&catalog)).await.unwrap();

        assert_eq!(result.completed, ["/data"]);
        assert_eq!(result.status, RunStatus::Incomplete);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].directory, "/home");
        assert!(!result.sentinel_advanced);
        assert!(sentinel.last_time().is_err());

        // /srv is never attempted
        assert_eq!(
            archiver
                .requests()
                .iter()
                .map(|r| r.directory.clone())
                .collect::<Vec<_>>(),
            vec![PathBuf::from("/data"), PathBuf::from("/home")]
        );
        assert_eq!(log.events().last(), Some(&Event::Tape(TapeCommand::Eject)));
        assert_eq!(console.errors()[0].0, "Archive Error");
        assert_eq!(console.reports().len(), 1);
    }

    #[tokio::test]
    async fn test_differential_start_failure_keeps_sentinel() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        sentinel.touch(jan_first_2024()).unwrap();

        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone())
            .with_behavior("/data", ArchiveBehavior::FailToStart("busy".into()));
        let mut console = ScriptedConsole::new([Answer::Input(None)]);

        let mut cfg = config(&dirs(&["/data"]));
        cfg.mode = BackupMode::Differential;
        let result = BackupPipeline::new(&tape, &archiver, &sentinel)
            .run(&mut console, &cfg)
            .await
            .unwrap();

        assert!(result.completed.is_empty());
        assert_eq!(sentinel.last_time().unwrap(), jan_first_2024());
    }

    #[tokio::test]
    async fn test_non_zero_exit_skips_directory_and_continues() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone()).with_behavior(
            "/home",
            ArchiveBehavior::ExitWith(2, "tar: ./x: Cannot open".into()),
        );
        let mut console = ScriptedConsole::default();

        let catalog = dirs(&["/data", "/home", "/srv"]);
        let result = BackupPipeline::new(&tape, &archiver, &sentinel)
            .run(&mut console, &config(&catalog))
            .await
            .unwrap();

        assert_eq!(result.completed, ["/data", "/srv"]);
        assert_eq!(result.status, RunStatus::Incomplete);
        assert!(result.failed[0].reason.contains("exit status 2"));
        assert!(!result.sentinel_advanced);
    }

    #[tokio::test]
    async fn test_append_mode_seeks_before_archiving() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone());
        let mut console = ScriptedConsole::default();

        let mut cfg = config(&dirs(&["/data"]));
        cfg.tape_mode = TapeMode::Append;
        BackupPipeline::new(&tape, &archiver, &sentinel)
            .run(&mut console, &cfg)
            .await
            .unwrap();

        let events = log.events();
        assert_eq!(events[0], Event::Tape(TapeCommand::Status));
        assert_eq!(events[1], Event::Tape(TapeCommand::SeekEndOfData));
        assert_eq!(events[2], Event::ArchiveStarted(PathBuf::from("/data")));
    }

    #[tokio::test]
    async fn test_seek_failure_is_fatal_before_archiving() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone()).fail_on(
            TapeCommand::SeekEndOfData,
            2,
            "mt: /dev/nsa0: Input/output error",
        );
        let archiver = ScriptedArchiver::new(log.clone());
        let mut console = ScriptedConsole::default();

        let mut cfg = config(&dirs(&["/data"]));
        cfg.tape_mode = TapeMode::Append;
        let err = BackupPipeline::new(&tape, &archiver, &sentinel)
            .run(&mut console, &cfg)
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert!(archiver.requests().is_empty());
    }

    #[tokio::test]
    async fn test_no_eject_when_disabled_on_success_and_failure() {
        for fail in [false, true] {
            let tmp = tempdir().unwrap();
            let sentinel = sentinel_in(&tmp);
            let log = EventLog::default();
            let tape = RecordingTape::new(log.clone());
            let mut archiver = ScriptedArchiver::new(log.clone());
            if fail {
                archiver = archiver
                    .with_behavior("/data", ArchiveBehavior::FailToStart("gone".into()));
            }
            let mut console = ScriptedConsole::default();

            let mut cfg = config(&dirs(&["/data", "/home"]));
            cfg.auto_eject = false;
            BackupPipeline::new(&tape, &archiver, &sentinel)
                .run(&mut console, &cfg)
                .await
                .unwrap();

            assert_eq!(log.count(TapeCommand::Eject), 0, "fail = {}", fail);
        }
    }

    #[tokio::test]
    async fn test_eject_failure_is_fatal_and_sentinel_untouched() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone()).fail_on(TapeCommand::Eject, 5, "door stuck");
        let archiver = ScriptedArchiver::new(log.clone());
        let mut console = ScriptedConsole::default();

        let err = BackupPipeline::new(&tape, &archiver, &sentinel)
            .run(&mut console, &config(&dirs(&["/data"])))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 5);
        assert_eq!(console.errors()[0].1, "door stuck");
        assert!(sentinel.last_time().is_err());
    }

    #[tokio::test]
    async fn test_directories_archived_in_selection_order() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone());
        let mut console = ScriptedConsole::default();

        let catalog = dirs(&["/a", "/b", "/c", "/d"]);
        let mut cfg = BackupConfiguration::default();
        cfg.select_directories(dirs(&["/c", "/a", "/d"]), &catalog);
        cfg.block_size = BlockSize::new(128).unwrap();

        let result = BackupPipeline::new(&tape, &archiver, &sentinel)
            .run(&mut console, &cfg)
            .await
            .unwrap();

        assert_eq!(result.completed, ["/c", "/a", "/d"]);
        assert_eq!(
            log.archived_directories(),
            vec![PathBuf::from("/c"), PathBuf::from("/a"), PathBuf::from("/d")]
        );
        // Each run finishes before the next starts
        let events = log.events();
        for pair in events.windows(2) {
            if let Event::ArchiveStarted(dir) = &pair[0] {
                assert_eq!(pair[1], Event::ArchiveFinished(dir.clone()));
            }
        }
        assert!(archiver
            .requests()
            .iter()
            .all(|r| r.block_size.get() == 128 && r.one_file_system && r.exclude_snapshot_metadata));
    }

    #[tokio::test]
    async fn test_progress_shows_lines_and_completed_directories() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone()).with_behavior(
            "/home",
            ArchiveBehavior::Succeed(vec!["./alice/notes.txt".into()]),
        );
        let mut console = ScriptedConsole::default();

        BackupPipeline::new(&tape, &archiver, &sentinel)
            .run(&mut console, &config(&dirs(&["/data", "/home"])))
            .await
            .unwrap();

        assert!(console.transcript().contains(&Shown::Progress {
            title: "Backing up /home".into(),
            text: "Already backed up: \n/data\n\nBacking up /home".into(),
        }));
        assert!(console
            .transcript()
            .contains(&Shown::ProgressLine("./alice/notes.txt".into())));
    }

    #[tokio::test]
    async fn test_differential_without_sentinel_and_empty_answer_has_no_cutoff() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone());
        let mut console = ScriptedConsole::new([Answer::Input(Some(String::new()))]);

        let mut cfg = config(&dirs(&["/data"]));
        cfg.mode = BackupMode::Differential;
        BackupPipeline::new(&tape, &archiver, &sentinel)
            .run(&mut console, &cfg)
            .await
            .unwrap();

        assert!(console.transcript().contains(&Shown::Input {
            title: "Last Backup Time".into(),
            initial: String::new(),
        }));
        assert_eq!(archiver.requests()[0].newer_than, None);
    }

    #[tokio::test]
    async fn test_malformed_cutoff_is_reprompted() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        sentinel.touch(jan_first_2024()).unwrap();
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone());
        let mut console = ScriptedConsole::new([
            Answer::Input(Some("01/06/2024".into())),
            Answer::Input(Some("2024-06-01".into())),
        ]);

        let mut cfg = config(&dirs(&["/data"]));
        cfg.mode = BackupMode::Differential;
        BackupPipeline::new(&tape, &archiver, &sentinel)
            .run(&mut console, &cfg)
            .await
            .unwrap();

        assert_eq!(console.errors()[0].0, "Invalid Date");
        assert_eq!(
            archiver.requests()[0].newer_than,
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[tokio::test]
    async fn test_empty_selection_does_not_advance_sentinel() {
        let tmp = tempdir().unwrap();
        let sentinel = sentinel_in(&tmp);
        let log = EventLog::default();
        let tape = RecordingTape::new(log.clone());
        let archiver = ScriptedArchiver::new(log.clone());
        let mut console = ScriptedConsole::default();

        let result = BackupPipeline::new(&tape, &archiver, &sentinel)
            .run(&mut console, &BackupConfiguration::default())
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Completed);
        assert!(!result.sentinel_advanced);
        assert_eq!(log.count(TapeCommand::Eject), 1);
    }
}
