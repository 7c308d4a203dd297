use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CsaveError>;

#[derive(Error, Debug)]
pub enum CsaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A tape-control command exited non-zero. Always fatal for the process.
    #[error("Tape control error (exit status {status}): {detail}")]
    TapeControl { status: i32, detail: String },

    #[error("Archive producer error: {0}")]
    ArchiveProducer(String),

    #[error("Dataset list not found: {}", .0.display())]
    DatasetListNotFound(PathBuf),

    #[error("Last dump sentinel not found: {}", .0.display())]
    SentinelNotFound(PathBuf),

    #[error("Filesystem inventory error: {0}")]
    Inventory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parameter validation error: {0}")]
    ParameterValidation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl CsaveError {
    pub fn tape_control<T: Into<String>>(status: i32, detail: T) -> Self {
        Self::TapeControl {
            status,
            detail: detail.into(),
        }
    }

    pub fn archive_producer<T: Into<String>>(msg: T) -> Self {
        Self::ArchiveProducer(msg.into())
    }

    pub fn inventory<T: Into<String>>(msg: T) -> Self {
        Self::Inventory(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn parameter_validation<T: Into<String>>(msg: T) -> Self {
        Self::ParameterValidation(msg.into())
    }

    pub fn parse<T: Into<String>>(msg: T) -> Self {
        Self::Parse(msg.into())
    }

    /// True for the "never generated / never created" conditions that callers
    /// are expected to degrade to an empty or default state.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::DatasetListNotFound(_) | Self::SentinelNotFound(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Tape failures end the process; everything else is reported and survived.
    pub fn is_fatal_tape_error(&self) -> bool {
        matches!(self, Self::TapeControl { .. })
    }

    /// Process exit code to use when this error ends the program.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::TapeControl { status, .. } if *status != 0 => *status,
            _ => 1,
        }
    }
}
