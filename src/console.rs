//! Operator Console
//!
//! Everything the operator sees or answers goes through [`Console`]. The
//! controller and the pipeline never print directly, which keeps them
//! testable with a scripted console (see [`crate::mock`]).
//!
//! [`TerminalConsole`] is a plain line-oriented implementation. In every
//! prompt a lone `!` cancels and end of input behaves like cancel.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, BufReader, IsTerminal, Stdin, Stdout, Write};
use std::time::Duration;
use tracing::warn;

pub const BACK_TITLE: &str = "CSave";

const CANCEL_TOKEN: &str = "!";
const CLEAR_TOKEN: &str = "-";
const PROGRESS_LINE_WIDTH: usize = 72;

/// Operator's answer to the configuration menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Edit the entry at this index
    Edit(usize),
    Start,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceItem {
    pub tag: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub label: String,
    pub selected: bool,
}

pub trait Console {
    /// Informational box, returns once acknowledged.
    fn message(&mut self, title: &str, text: &str);

    /// Error box with raw detail text, returns once acknowledged.
    fn error(&mut self, title: &str, detail: &str);

    fn menu(&mut self, title: &str, message: &str, entries: &[MenuEntry]) -> MenuAction;

    /// Single choice. `None` when cancelled.
    fn radio_list(
        &mut self,
        title: &str,
        message: &str,
        items: &[ChoiceItem],
        current: usize,
    ) -> Option<usize>;

    /// Free text pre-filled with `initial`. `None` when cancelled.
    fn input(&mut self, title: &str, message: &str, initial: &str) -> Option<String>;

    /// `None` when the question was dismissed without an answer.
    fn yes_no(&mut self, title: &str, message: &str) -> Option<bool>;

    /// Ordered multi-select. Returns the chosen indices in the order the
    /// operator wants them, or `None` when cancelled.
    fn build_list(&mut self, title: &str, message: &str, items: &[ListItem])
        -> Option<Vec<usize>>;

    /// Read-only review form; true when the operator accepts.
    fn confirm_form(&mut self, title: &str, message: &str, rows: &[(String, String)]) -> bool;

    fn progress_begin(&mut self, title: &str, text: &str);
    fn progress_line(&mut self, line: &str);
    fn progress_end(&mut self);

    /// Long text for the operator to read, returns once acknowledged.
    fn scroll_box(&mut self, title: &str, text: &str);
}

pub struct TerminalConsole<R, W> {
    reader: R,
    writer: W,
    spinner_enabled: bool,
    spinner: Option<ProgressBar>,
    write_failed: bool,
}

impl TerminalConsole<BufReader<Stdin>, Stdout> {
    /// Console on the process's standard streams. The spinner is drawn on
    /// stderr when it is a terminal; otherwise progress lines are printed.
    pub fn stdio() -> Self {
        let spinner_enabled = io::stderr().is_terminal();
        Self::new(BufReader::new(io::stdin()), io::stdout(), spinner_enabled)
    }
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(reader: R, writer: W, spinner_enabled: bool) -> Self {
        Self {
            reader,
            writer,
            spinner_enabled,
            spinner: None,
            write_failed: false,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn say(&mut self, text: &str) {
        if let Err(e) = writeln!(self.writer, "{}", text) {
            self.write_error(e);
        }
    }

    /// Logged once per console; later failures repeat the same cause.
    fn write_error(&mut self, error: io::Error) {
        if !self.write_failed {
            warn!("Cannot write to terminal: {}", error);
            self.write_failed = true;
        }
    }

    fn header(&mut self, title: &str) {
        self.say("");
        self.say(&format!("== {}: {} ==", BACK_TITLE, title));
    }

    /// Next answer line without its line ending, `None` at end of input.
    /// A prompt that cannot be shown counts as end of input.
    fn ask(&mut self, prompt: &str) -> Option<String> {
        let shown = write!(self.writer, "{} ", prompt).and_then(|()| self.writer.flush());
        if let Err(e) = shown {
            self.write_error(e);
            return None;
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn pause(&mut self) {
        self.ask("Press Enter to continue...");
    }
}

impl<R: BufRead, W: Write> Console for TerminalConsole<R, W> {
    fn message(&mut self, title: &str, text: &str) {
        self.header(title);
        self.say(text);
        self.pause();
    }

    fn error(&mut self, title: &str, detail: &str) {
        self.header(title);
        self.say(detail.trim_end());
        self.pause();
    }

    fn menu(&mut self, title: &str, message: &str, entries: &[MenuEntry]) -> MenuAction {
        let width = entries.iter().map(|e| e.label.len()).max().unwrap_or(0);
        loop {
            self.header(title);
            self.say(message);
            for (i, entry) in entries.iter().enumerate() {
                self.say(&format!(
                    "  {:>2}) {:<width$}  {}",
                    i + 1,
                    entry.label,
                    entry.value,
                    width = width
                ));
            }

            let Some(answer) = self.ask("Number to edit, 's' to start backup, 'q' to exit:") else {
                return MenuAction::Exit;
            };
            match answer.trim().to_lowercase().as_str() {
                "s" | "start" => return MenuAction::Start,
                "q" | "exit" | CANCEL_TOKEN => return MenuAction::Exit,
                other => match parse_index(other, entries.len()) {
                    Some(index) => return MenuAction::Edit(index),
                    None => self.say(&format!("Not a menu entry: {:?}", other)),
                },
            }
        }
    }

    fn radio_list(
        &mut self,
        title: &str,
        message: &str,
        items: &[ChoiceItem],
        current: usize,
    ) -> Option<usize> {
        loop {
            self.header(title);
            self.say(message);
            for (i, item) in items.iter().enumerate() {
                let mark = if i == current { "(*)" } else { "( )" };
                self.say(&format!(
                    "  {} {}) {:<14} {}",
                    mark,
                    i + 1,
                    item.tag,
                    item.description
                ));
            }

            let answer = self.ask("Choice (Enter keeps current, '!' cancels):")?;
            let answer = answer.trim();
            if answer.is_empty() {
                return Some(current);
            }
            if answer == CANCEL_TOKEN {
                return None;
            }
            match parse_index(answer, items.len()) {
                Some(index) => return Some(index),
                None => self.say(&format!("Not a valid choice: {:?}", answer)),
            }
        }
    }

    fn input(&mut self, title: &str, message: &str, initial: &str) -> Option<String> {
        self.header(title);
        self.say(message);
        let answer = self.ask(&format!(
            "[{}] (Enter keeps, '{}' clears, '{}' cancels):",
            initial, CLEAR_TOKEN, CANCEL_TOKEN
        ))?;
        match answer.trim() {
            "" => Some(initial.to_string()),
            CANCEL_TOKEN => None,
            CLEAR_TOKEN => Some(String::new()),
            value => Some(value.to_string()),
        }
    }

    fn yes_no(&mut self, title: &str, message: &str) -> Option<bool> {
        self.header(title);
        self.say(message);
        loop {
            let answer = self.ask("[y/n] ('!' cancels):")?;
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Some(true),
                "n" | "no" => return Some(false),
                CANCEL_TOKEN => return None,
                _ => self.say("Please answer y or n."),
            }
        }
    }

    fn build_list(
        &mut self,
        title: &str,
        message: &str,
        items: &[ListItem],
    ) -> Option<Vec<usize>> {
        loop {
            self.header(title);
            self.say(message);
            for (i, item) in items.iter().enumerate() {
                let mark = if item.selected { "[x]" } else { "[ ]" };
                self.say(&format!("  {} {:>2}) {}", mark, i + 1, item.label));
            }

            let answer = self.ask(
                "Numbers in backup order, 'all', 'none' (Enter keeps current, '!' cancels):",
            )?;
            let answer = answer.trim().to_lowercase();
            match answer.as_str() {
                "" => {
                    return Some(
                        items
                            .iter()
                            .enumerate()
                            .filter(|(_, item)| item.selected)
                            .map(|(i, _)| i)
                            .collect(),
                    )
                }
                CANCEL_TOKEN => return None,
                "all" => return Some((0..items.len()).collect()),
                "none" => return Some(Vec::new()),
                _ => {}
            }

            let picked: Option<Vec<usize>> = answer
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|token| !token.is_empty())
                .map(|token| parse_index(token, items.len()))
                .collect();
            match picked {
                Some(indices) => {
                    let mut ordered = Vec::with_capacity(indices.len());
                    for index in indices {
                        if !ordered.contains(&index) {
                            ordered.push(index);
                        }
                    }
                    return Some(ordered);
                }
                None => self.say(&format!("Not a valid selection: {:?}", answer)),
            }
        }
    }

    fn confirm_form(&mut self, title: &str, message: &str, rows: &[(String, String)]) -> bool {
        self.header(title);
        self.say(message);
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in rows {
            self.say(&format!("  {:<width$}  {}", label, value, width = width));
        }
        matches!(
            self.ask("Start backup? [y/N]:")
                .map(|a| a.trim().to_lowercase())
                .as_deref(),
            Some("y") | Some("yes")
        )
    }

    fn progress_begin(&mut self, title: &str, text: &str) {
        self.header(title);
        self.say(text);
        if let Err(e) = self.writer.flush() {
            self.write_error(e);
        }

        if self.spinner_enabled {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}") {
                spinner.set_style(style);
            }
            spinner.enable_steady_tick(Duration::from_millis(120));
            self.spinner = Some(spinner);
        }
    }

    fn progress_line(&mut self, line: &str) {
        match &self.spinner {
            Some(spinner) => spinner.set_message(truncate_line(line, PROGRESS_LINE_WIDTH)),
            None => self.say(&format!("  {}", line)),
        }
    }

    fn progress_end(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn scroll_box(&mut self, title: &str, text: &str) {
        self.header(title);
        self.say(text);
        self.pause();
    }
}

/// 1-based menu number to index.
fn parse_index(answer: &str, len: usize) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Some(n - 1),
        _ => None,
    }
}

/// Shorten to `max_chars` characters, keeping the tail (file names end there).
pub fn truncate_line(line: &str, max_chars: usize) -> String {
    let count = line.chars().count();
    if count <= max_chars {
        line.to_string()
    } else if max_chars <= 3 {
        "...".to_string()
    } else {
        let tail: String = line.chars().skip(count - (max_chars - 3)).collect();
        format!("...{}", tail)
    }
}
