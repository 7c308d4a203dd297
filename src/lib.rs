//! CSave Library
//!
//! Interactive tape backup of a fixed set of dataset mount points: a menu
//! builds a backup configuration, then a pipeline drives the tape-control and
//! archive tools over the selected directories and records the last complete
//! dump.

pub mod archive;
pub mod backup_config;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod display;
pub mod error;
pub mod logger;
pub mod menu;
pub mod mock;
pub mod pipeline;
pub mod sentinel;
pub mod session;
pub mod tape;

// Re-export key types for easier use
pub use backup_config::{BackupConfiguration, BackupMode, BlockSize, EditTarget, TapeMode};
pub use error::{CsaveError, Result};
pub use pipeline::{BackupPipeline, BackupRunResult, DirectoryFailure, RunStatus};
pub use session::{Session, SessionOutcome};
pub use tape::{TapeCommand, TapeControl};
