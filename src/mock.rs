//! Test doubles for the pipeline's collaborators
//!
//! `RecordingTape` and `ScriptedArchiver` append to one shared [`EventLog`] so
//! tests can assert on the relative order of tape and archive operations.
//! `ScriptedConsole` replays pre-recorded operator answers and keeps a
//! transcript of everything shown.
//!
//! # Example
//! ```no_run
//! use csave::mock::{EventLog, RecordingTape, ScriptedArchiver};
//! use csave::tape::TapeCommand;
//!
//! let log = EventLog::default();
//! let tape = RecordingTape::new(log.clone()).fail_on(TapeCommand::Status, 1, "no tape loaded");
//! let archiver = ScriptedArchiver::new(log.clone());
//! ```

use crate::archive::{ArchiveExit, ArchiveProducer, ArchiveRequest, ArchiveRun};
use crate::console::{ChoiceItem, Console, ListItem, MenuAction, MenuEntry};
use crate::error::{CsaveError, Result};
use crate::tape::{TapeCommand, TapeControl, TapeOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Tape(TapeCommand),
    ArchiveStarted(PathBuf),
    ArchiveFinished(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().clone()
    }

    pub fn tape_commands(&self) -> Vec<TapeCommand> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Tape(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, command: TapeCommand) -> usize {
        self.tape_commands().iter().filter(|c| **c == command).count()
    }

    pub fn archived_directories(&self) -> Vec<PathBuf> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::ArchiveStarted(dir) => Some(dir),
                _ => None,
            })
            .collect()
    }
}

pub struct RecordingTape {
    log: EventLog,
    failures: HashMap<TapeCommand, TapeOutcome>,
}

impl RecordingTape {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            failures: HashMap::new(),
        }
    }

    pub fn fail_on(mut self, command: TapeCommand, status: i32, detail: &str) -> Self {
        self.failures
            .insert(command, TapeOutcome::failure(status, detail));
        self
    }
}

#[async_trait]
impl TapeControl for RecordingTape {
    async fn execute(&self, command: TapeCommand) -> TapeOutcome {
        self.log.push(Event::Tape(command));
        self.failures
            .get(&command)
            .cloned()
            .unwrap_or_else(TapeOutcome::success)
    }
}

#[derive(Debug, Clone)]
pub enum ArchiveBehavior {
    /// Emit these progress lines and exit 0
    Succeed(Vec<String>),
    /// Emit nothing and exit with this status and error text
    ExitWith(i32, String),
    /// The producer cannot be launched
    FailToStart(String),
}

impl Default for ArchiveBehavior {
    fn default() -> Self {
        ArchiveBehavior::Succeed(vec!["./".to_string()])
    }
}

pub struct ScriptedArchiver {
    log: EventLog,
    behaviors: HashMap<PathBuf, ArchiveBehavior>,
    requests: Mutex<Vec<ArchiveRequest>>,
}

impl ScriptedArchiver {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            behaviors: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_behavior(mut self, directory: &str, behavior: ArchiveBehavior) -> Self {
        self.behaviors.insert(PathBuf::from(directory), behavior);
        self
    }

    /// Every request received, including ones that failed to start.
    pub fn requests(&self) -> Vec<ArchiveRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ArchiveProducer for ScriptedArchiver {
    async fn start(&self, request: &ArchiveRequest) -> Result<Box<dyn ArchiveRun>> {
        self.requests.lock().push(request.clone());

        let behavior = self
            .behaviors
            .get(&request.directory)
            .cloned()
            .unwrap_or_default();
        let (lines, exit) = match behavior {
            ArchiveBehavior::FailToStart(reason) => {
                return Err(CsaveError::archive_producer(reason));
            }
            ArchiveBehavior::Succeed(lines) => (lines, ArchiveExit::Success),
            ArchiveBehavior::ExitWith(status, detail) => (
                Vec::new(),
                ArchiveExit::Failed {
                    status: Some(status),
                    detail,
                },
            ),
        };

        self.log
            .push(Event::ArchiveStarted(request.directory.clone()));
        Ok(Box::new(ScriptedRun {
            log: self.log.clone(),
            directory: request.directory.clone(),
            lines: lines.into(),
            exit,
        }))
    }
}

struct ScriptedRun {
    log: EventLog,
    directory: PathBuf,
    lines: VecDeque<String>,
    exit: ArchiveExit,
}

#[async_trait]
impl ArchiveRun for ScriptedRun {
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    async fn wait(self: Box<Self>) -> Result<ArchiveExit> {
        self.log.push(Event::ArchiveFinished(self.directory.clone()));
        Ok(self.exit)
    }
}

/// One pre-recorded operator answer, consumed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Menu(MenuAction),
    Choice(Option<usize>),
    Input(Option<String>),
    YesNo(Option<bool>),
    List(Option<Vec<usize>>),
    Confirm(bool),
}

/// What the console was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Message { title: String, text: String },
    Error { title: String, detail: String },
    Menu { entries: Vec<MenuEntry> },
    Choice { title: String, current: usize },
    Input { title: String, initial: String },
    YesNo { title: String },
    List { items: Vec<ListItem> },
    Form { rows: Vec<(String, String)> },
    Progress { title: String, text: String },
    ProgressLine(String),
    Report { title: String, text: String },
}

/// Console replaying [`Answer`]s. A missing or mismatched answer is treated
/// as the operator cancelling that prompt.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<Answer>,
    transcript: Vec<Shown>,
}

impl ScriptedConsole {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[Shown] {
        &self.transcript
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }

    pub fn errors(&self) -> Vec<(String, String)> {
        self.transcript
            .iter()
            .filter_map(|s| match s {
                Shown::Error { title, detail } => Some((title.clone(), detail.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn reports(&self) -> Vec<String> {
        self.transcript
            .iter()
            .filter_map(|s| match s {
                Shown::Report { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn next_answer(&mut self) -> Option<Answer> {
        self.answers.pop_front()
    }
}

impl Console for ScriptedConsole {
    fn message(&mut self, title: &str, text: &str) {
        self.transcript.push(Shown::Message {
            title: title.to_string(),
            text: text.to_string(),
        });
    }

    fn error(&mut self, title: &str, detail: &str) {
        self.transcript.push(Shown::Error {
            title: title.to_string(),
            detail: detail.to_string(),
        });
    }

    fn menu(&mut self, _title: &str, _message: &str, entries: &[MenuEntry]) -> MenuAction {
        self.transcript.push(Shown::Menu {
            entries: entries.to_vec(),
        });
        match self.next_answer() {
            Some(Answer::Menu(action)) => action,
            _ => MenuAction::Exit,
        }
    }

    fn radio_list(
        &mut self,
        title: &str,
        _message: &str,
        _items: &[ChoiceItem],
        current: usize,
    ) -> Option<usize> {
        self.transcript.push(Shown::Choice {
            title: title.to_string(),
            current,
        });
        match self.next_answer() {
            Some(Answer::Choice(choice)) => choice,
            _ => None,
        }
    }

    fn input(&mut self, title: &str, _message: &str, initial: &str) -> Option<String> {
        self.transcript.push(Shown::Input {
            title: title.to_string(),
            initial: initial.to_string(),
        });
        match self.next_answer() {
            Some(Answer::Input(value)) => value,
            _ => None,
        }
    }

    fn yes_no(&mut self, title: &str, _message: &str) -> Option<bool> {
        self.transcript.push(Shown::YesNo {
            title: title.to_string(),
        });
        match self.next_answer() {
            Some(Answer::YesNo(value)) => value,
            _ => None,
        }
    }

    fn build_list(
        &mut self,
        _title: &str,
        _message: &str,
        items: &[ListItem],
    ) -> Option<Vec<usize>> {
        self.transcript.push(Shown::List {
            items: items.to_vec(),
        });
        match self.next_answer() {
            Some(Answer::List(value)) => value,
            _ => None,
        }
    }

    fn confirm_form(&mut self, _title: &str, _message: &str, rows: &[(String, String)]) -> bool {
        self.transcript.push(Shown::Form {
            rows: rows.to_vec(),
        });
        matches!(self.next_answer(), Some(Answer::Confirm(true)))
    }

    fn progress_begin(&mut self, title: &str, text: &str) {
        self.transcript.push(Shown::Progress {
            title: title.to_string(),
            text: text.to_string(),
        });
    }

    fn progress_line(&mut self, line: &str) {
        self.transcript.push(Shown::ProgressLine(line.to_string()));
    }

    fn progress_end(&mut self) {}

    fn scroll_box(&mut self, title: &str, text: &str) {
        self.transcript.push(Shown::Report {
            title: title.to_string(),
            text: text.to_string(),
        });
    }
}
