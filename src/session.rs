//! Interactive session: the configuration menu loop followed by one run.

use crate::backup_config::{BackupConfiguration, EditTarget};
use crate::catalog::DatasetCatalog;
use crate::console::Console;
use crate::error::Result;
use crate::menu::{self, MenuIntent};
use crate::pipeline::{BackupPipeline, BackupRunResult};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Operator left the menu without starting a backup
    Cancelled,
    Completed(BackupRunResult),
}

pub struct Session<'a> {
    console: &'a mut dyn Console,
    catalog: &'a DatasetCatalog,
    pipeline: BackupPipeline<'a>,
}

impl<'a> Session<'a> {
    pub fn new(
        console: &'a mut dyn Console,
        catalog: &'a DatasetCatalog,
        pipeline: BackupPipeline<'a>,
    ) -> Self {
        Self {
            console,
            catalog,
            pipeline,
        }
    }

    /// Loop through the menu until the operator exits or confirms a run.
    /// A declined confirmation returns to the menu with the configuration
    /// unchanged. Fatal tape errors propagate.
    pub async fn run(self, mut config: BackupConfiguration) -> Result<SessionOutcome> {
        let Session {
            console,
            catalog,
            pipeline,
        } = self;

        loop {
            match menu::next_intent(console, &config) {
                MenuIntent::Cancel => {
                    info!("Backup cancelled from menu");
                    return Ok(SessionOutcome::Cancelled);
                }
                MenuIntent::Edit(target) => {
                    let entries = match target {
                        EditTarget::Directories => load_catalog(catalog),
                        _ => Vec::new(),
                    };
                    menu::edit(console, target, &mut config, &entries);
                }
                MenuIntent::Start => {
                    if !menu::confirm(console, &config) {
                        debug!("Confirmation declined; back to menu");
                        continue;
                    }
                    debug!("Confirmed configuration: {:?}", config);
                    let result = pipeline.run(console, &config).await?;
                    return Ok(SessionOutcome::Completed(result));
                }
            }
        }
    }
}

fn load_catalog(catalog: &DatasetCatalog) -> Vec<String> {
    match catalog.list_or_empty() {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read dataset list {}: {}", catalog.list_path().display(), e);
            Vec::new()
        }
    }
}
