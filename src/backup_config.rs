//! Backup Configuration State
//!
//! The per-session choices the operator edits from the configuration menu.
//! Every field is changed through one of the setters below so that the block
//! size stays positive and the directory selection stays inside the catalog.

use crate::error::{CsaveError, Result};
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroU32;

pub const DEFAULT_BLOCK_SIZE: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMode {
    /// Every file, regardless of modification time
    #[default]
    Full,
    /// Only files modified after a cutoff derived from the last-dump sentinel
    Differential,
}

impl BackupMode {
    pub const ALL: [BackupMode; 2] = [BackupMode::Full, BackupMode::Differential];

    pub fn display_name(&self) -> &'static str {
        match self {
            BackupMode::Full => "Full",
            BackupMode::Differential => "Differential",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BackupMode::Full => "Back up all files, regardless of last change date",
            BackupMode::Differential => {
                "Only back up files that have changed since the last backup"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapeMode {
    /// Seek to end of data before writing
    Append,
    /// Write from the current position
    #[default]
    Overwrite,
}

impl TapeMode {
    pub const ALL: [TapeMode; 2] = [TapeMode::Append, TapeMode::Overwrite];

    pub fn display_name(&self) -> &'static str {
        match self {
            TapeMode::Append => "Append",
            TapeMode::Overwrite => "Overwrite",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TapeMode::Append => "Append this backup to the end of the tape",
            TapeMode::Overwrite => "Overwrite the tape with this backup",
        }
    }
}

/// Tape block size, always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSize(NonZeroU32);

impl BlockSize {
    pub fn new(value: u32) -> Result<Self> {
        NonZeroU32::new(value).map(Self).ok_or_else(|| {
            CsaveError::parameter_validation("Block size must be a positive integer")
        })
    }

    /// Parse operator input. Surrounding whitespace is ignored; anything that
    /// is not a positive integer is rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let value: u32 = trimmed.parse().map_err(|_| {
            CsaveError::parameter_validation(format!(
                "Block size must be a positive integer, got {:?}",
                trimmed
            ))
        })?;
        Self::new(value)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        const DEFAULT: NonZeroU32 = match NonZeroU32::new(DEFAULT_BLOCK_SIZE) {
            Some(value) => value,
            None => panic!("default block size is zero"),
        };
        Self(DEFAULT)
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fields reachable from the configuration menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    BackupMode,
    BlockSize,
    AutoEject,
    TapeMode,
    Directories,
}

impl EditTarget {
    pub const ALL: [EditTarget; 5] = [
        EditTarget::BackupMode,
        EditTarget::BlockSize,
        EditTarget::AutoEject,
        EditTarget::TapeMode,
        EditTarget::Directories,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EditTarget::BackupMode => "Backup mode",
            EditTarget::BlockSize => "Block size",
            EditTarget::AutoEject => "Eject when finished",
            EditTarget::TapeMode => "Tape mode",
            EditTarget::Directories => "Directories to back up...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfiguration {
    pub mode: BackupMode,
    pub block_size: BlockSize,
    pub auto_eject: bool,
    pub tape_mode: TapeMode,
    selected_directories: Vec<String>,
}

impl Default for BackupConfiguration {
    fn default() -> Self {
        Self {
            mode: BackupMode::default(),
            block_size: BlockSize::default(),
            auto_eject: true,
            tape_mode: TapeMode::default(),
            selected_directories: Vec::new(),
        }
    }
}

impl BackupConfiguration {
    /// Session-start configuration: every catalog entry is selected.
    pub fn with_catalog(catalog: &[String]) -> Self {
        let mut config = Self::default();
        config.select_directories(catalog.iter().cloned(), catalog);
        config
    }

    pub fn selected_directories(&self) -> &[String] {
        &self.selected_directories
    }

    /// Replace the selection, keeping the given order. Entries not in
    /// `catalog` and repeats are dropped.
    pub fn select_directories<I>(&mut self, chosen: I, catalog: &[String])
    where
        I: IntoIterator<Item = String>,
    {
        let mut selection: Vec<String> = Vec::new();
        for dir in chosen {
            if catalog.contains(&dir) && !selection.contains(&dir) {
                selection.push(dir);
            }
        }
        self.selected_directories = selection;
    }

    /// Drop selected entries that disappeared from the catalog.
    pub fn retain_catalog(&mut self, catalog: &[String]) {
        self.selected_directories.retain(|dir| catalog.contains(dir));
    }

    /// Value column of the configuration menu for `target`.
    pub fn field_value(&self, target: EditTarget) -> String {
        match target {
            EditTarget::BackupMode => self.mode.display_name().to_string(),
            EditTarget::BlockSize => self.block_size.to_string(),
            EditTarget::AutoEject => yes_no(self.auto_eject).to_string(),
            EditTarget::TapeMode => self.tape_mode.display_name().to_string(),
            EditTarget::Directories => String::new(),
        }
    }

    /// Rows for the final confirmation form.
    pub fn summary_rows(&self) -> Vec<(String, String)> {
        vec![
            ("Backup mode".to_string(), self.mode.display_name().to_string()),
            ("Block size".to_string(), self.block_size.to_string()),
            ("Auto eject".to_string(), yes_no(self.auto_eject).to_string()),
            (
                "Tape mode".to_string(),
                self.tape_mode.display_name().to_string(),
            ),
            (
                "Selected dirs".to_string(),
                self.selected_directories.join(", "),
            ),
        ]
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<String> {
        vec!["/data".to_string(), "/home".to_string(), "/srv".to_string()]
    }

    #[test]
    fn test_defaults() {
        let config = BackupConfiguration::default();
        assert_eq!(config.mode, BackupMode::Full);
        assert_eq!(config.block_size.get(), 512);
        assert!(config.auto_eject);
        assert_eq!(config.tape_mode, TapeMode::Overwrite);
        assert!(config.selected_directories().is_empty());
    }

    #[test]
    fn test_with_catalog_selects_everything_in_order() {
        let config = BackupConfiguration::with_catalog(&catalog());
        assert_eq!(config.selected_directories(), catalog().as_slice());
    }

    #[test]
    fn test_block_size_parse() {
        assert_eq!(BlockSize::parse("1024").unwrap().get(), 1024);
        assert_eq!(BlockSize::parse("  64\n").unwrap().get(), 64);
        assert!(BlockSize::parse("0").is_err());
        assert!(BlockSize::parse("-5").is_err());
        assert!(BlockSize::parse("abc").is_err());
        assert!(BlockSize::parse("").is_err());
        assert!(BlockSize::parse("12.5").is_err());
    }

    #[test]
    fn test_selection_stays_inside_catalog() {
        let mut config = BackupConfiguration::default();
        config.select_directories(
            vec![
                "/home".to_string(),
                "/nonexistent".to_string(),
                "/data".to_string(),
                "/home".to_string(),
            ],
            &catalog(),
        );
        assert_eq!(config.selected_directories(), ["/home", "/data"]);
    }

    #[test]
    fn test_retain_catalog_drops_vanished_entries() {
        let mut config = BackupConfiguration::with_catalog(&catalog());
        config.retain_catalog(&["/srv".to_string(), "/data".to_string()]);
        assert_eq!(config.selected_directories(), ["/data", "/srv"]);
    }

    #[test]
    fn test_field_values() {
        let mut config = BackupConfiguration::default();
        config.auto_eject = false;
        config.tape_mode = TapeMode::Append;
        assert_eq!(config.field_value(EditTarget::AutoEject), "No");
        assert_eq!(config.field_value(EditTarget::TapeMode), "Append");
        assert_eq!(config.field_value(EditTarget::BlockSize), "512");
        assert_eq!(config.field_value(EditTarget::Directories), "");
    }
}
