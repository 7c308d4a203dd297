//! Dataset Catalog
//!
//! Derives the list of directories that may be backed up from the filesystem
//! inventory (`<size> <mountpoint>` per line) and persists it as a plain list,
//! one mount point per line.

use crate::error::{CsaveError, Result};
use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    inventory_path: PathBuf,
    list_path: PathBuf,
}

impl DatasetCatalog {
    pub fn new(inventory_path: impl Into<PathBuf>, list_path: impl Into<PathBuf>) -> Self {
        Self {
            inventory_path: inventory_path.into(),
            list_path: list_path.into(),
        }
    }

    pub fn list_path(&self) -> &Path {
        &self.list_path
    }

    /// Rewrite the derived list from the inventory, keeping inventory order.
    /// Returns the number of mount points written.
    pub fn regenerate(&self) -> Result<usize> {
        debug!(
            "Regenerating dataset list {} from {}",
            self.list_path.display(),
            self.inventory_path.display()
        );

        let inventory = fs::File::open(&self.inventory_path).map_err(|e| {
            CsaveError::inventory(format!(
                "Cannot open filesystem inventory {}: {}",
                self.inventory_path.display(),
                e
            ))
        })?;

        let mut mount_points = Vec::new();
        for (line_no, line) in BufReader::new(inventory).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match line.split_whitespace().nth(1) {
                Some(mount_point) => mount_points.push(mount_point.to_string()),
                None => {
                    return Err(CsaveError::inventory(format!(
                        "{}:{}: expected `<size> <mountpoint>`, got {:?}",
                        self.inventory_path.display(),
                        line_no + 1,
                        line
                    )))
                }
            }
        }

        let mut writer = BufWriter::new(fs::File::create(&self.list_path)?);
        for mount_point in &mount_points {
            writeln!(writer, "{}", mount_point)?;
        }
        writer.flush()?;

        info!(
            "Dataset list regenerated: {} mount point(s)",
            mount_points.len()
        );
        Ok(mount_points.len())
    }

    /// Read the derived list in file order.
    pub fn list(&self) -> Result<Vec<String>> {
        let content = match fs::read_to_string(&self.list_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CsaveError::DatasetListNotFound(self.list_path.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// `list()`, with a missing list treated as an empty catalog.
    pub fn list_or_empty(&self) -> Result<Vec<String>> {
        match self.list() {
            Ok(entries) => Ok(entries),
            Err(e) if e.is_not_found() => {
                warn!("{}; starting with no directories", e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
