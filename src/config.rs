//! Deployment configuration loaded from TOML.
//!
//! Every key is optional. A missing file at the default location means
//! built-in defaults; a missing file named with `--config` is an error.

use crate::backup_config::{BackupConfiguration, BackupMode, BlockSize, TapeMode, DEFAULT_BLOCK_SIZE};
use crate::error::{CsaveError, Result};
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// `<size> <mountpoint>` inventory the dataset list is derived from
    pub inventory: PathBuf,
    pub dataset_list: PathBuf,
    /// Marker whose mtime records the last complete backup
    pub sentinel: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            inventory: PathBuf::from("/root/filesystem.usage"),
            dataset_list: PathBuf::from("/usr/local/etc/dumplist"),
            sentinel: PathBuf::from("/var/preserve/lastdump"),
            log_file: None,
        }
    }
}

/// Non-rewinding tape device used when neither the config nor `$TAPE`
/// names one.
pub const DEFAULT_TAPE_DEVICE: &str = "/dev/nsa0";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TapeConfig {
    /// Tape device; `$TAPE`, then `default_device` when unset
    pub device: Option<String>,
    pub default_device: String,
    pub mt_binary: PathBuf,
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self {
            device: None,
            default_device: DEFAULT_TAPE_DEVICE.to_string(),
            mt_binary: PathBuf::from("mt"),
        }
    }
}

impl TapeConfig {
    /// Device both `mt` and `tar` are pointed at.
    pub fn resolved_device(&self) -> String {
        resolve_tape_device(
            self.device.as_deref(),
            env::var("TAPE").ok(),
            &self.default_device,
        )
    }
}

pub fn resolve_tape_device(
    configured: Option<&str>,
    from_env: Option<String>,
    fallback: &str,
) -> String {
    configured
        .map(str::to_string)
        .or_else(|| from_env.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| fallback.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub tar_binary: PathBuf,
    /// Pattern excluded from every archive
    pub exclude: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            tar_binary: PathBuf::from("tar"),
            exclude: ".zfs".to_string(),
        }
    }
}

/// Initial values of the interactive configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub mode: BackupMode,
    pub block_size: u32,
    pub auto_eject: bool,
    pub tape_mode: TapeMode,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            mode: BackupMode::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            auto_eject: true,
            tape_mode: TapeMode::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub tape: TapeConfig,
    pub archive: ArchiveConfig,
    pub defaults: DefaultsConfig,
}

/// `$XDG_CONFIG_HOME/csave/config.toml`, or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("csave").join("config.toml"))
}

impl AppConfig {
    /// Load from `explicit` if given, else from the default location if it
    /// exists, else use defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No configuration file; using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Cannot read configuration file {}", path.display()))?;
        Self::from_toml(&contents)
            .map_err(|e| CsaveError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| CsaveError::config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        BlockSize::new(self.defaults.block_size).map_err(|_| {
            CsaveError::config(format!(
                "defaults.block_size must be a positive integer, got {}",
                self.defaults.block_size
            ))
        })?;
        let device = self.tape.resolved_device();
        if device.trim().is_empty() || device.trim() == "-" {
            return Err(CsaveError::config(format!(
                "tape device must name a tape drive, got {:?}",
                device
            )));
        }
        if self.archive.exclude.trim().is_empty() {
            return Err(CsaveError::config("archive.exclude must not be empty"));
        }
        Ok(())
    }

    /// Starting configuration for the menu: the configured defaults with
    /// every catalog entry selected.
    pub fn initial_backup_configuration(&self, catalog: &[String]) -> Result<BackupConfiguration> {
        let mut config = BackupConfiguration::with_catalog(catalog);
        config.mode = self.defaults.mode;
        config.block_size = BlockSize::new(self.defaults.block_size)?;
        config.auto_eject = self.defaults.auto_eject;
        config.tape_mode = self.defaults.tape_mode;
        Ok(config)
    }
}
