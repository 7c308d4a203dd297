//! Backup Command Handler
//!
//! Wires the real collaborators together and runs one interactive session.

use crate::archive::TarArchiver;
use crate::catalog::DatasetCatalog;
use crate::config::AppConfig;
use crate::console::{TerminalConsole, BACK_TITLE};
use crate::error::Result;
use crate::pipeline::{BackupPipeline, RunStatus};
use crate::sentinel::LastDumpSentinel;
use crate::session::{Session, SessionOutcome};
use crate::tape::MtTapeControl;
use tracing::{debug, info, warn};

pub async fn execute(config: AppConfig) -> Result<()> {
    info!("{} starting", BACK_TITLE);
    debug_config(&config);

    let catalog = DatasetCatalog::new(&config.paths.inventory, &config.paths.dataset_list);
    let entries = load_selection(&catalog)?;
    let initial = config.initial_backup_configuration(&entries)?;

    let device = config.tape.resolved_device();
    let tape = MtTapeControl::new(&config.tape.mt_binary, Some(device.clone()));
    let archiver = TarArchiver::new(
        &config.archive.tar_binary,
        device,
        config.archive.exclude.clone(),
    );
    let sentinel = LastDumpSentinel::new(&config.paths.sentinel);
    let mut console = TerminalConsole::stdio();

    let pipeline = BackupPipeline::new(&tape, &archiver, &sentinel);
    let outcome = Session::new(&mut console, &catalog, pipeline)
        .run(initial)
        .await?;

    match outcome {
        SessionOutcome::Cancelled => info!("Exited without running a backup"),
        SessionOutcome::Completed(result) => match result.status {
            RunStatus::Completed => info!(
                "Backup completed: {} directories",
                result.completed.len()
            ),
            RunStatus::Incomplete => {
                for failure in &result.failed {
                    warn!("Not backed up: {} ({})", failure.directory, failure.reason);
                }
            }
        },
    }

    Ok(())
}

/// Regenerate the dataset list, then read it. A failed regeneration falls
/// back to whatever list is already on disk.
fn load_selection(catalog: &DatasetCatalog) -> Result<Vec<String>> {
    match catalog.regenerate() {
        Ok(count) => info!(
            "Dataset list {} regenerated with {} entries",
            catalog.list_path().display(),
            count
        ),
        Err(e) => warn!("Cannot regenerate dataset list, using previous one: {}", e),
    }
    catalog.list_or_empty()
}

fn debug_config(config: &AppConfig) {
    debug!(
        "inventory={} dataset_list={} sentinel={} device={}",
        config.paths.inventory.display(),
        config.paths.dataset_list.display(),
        config.paths.sentinel.display(),
        config.tape.resolved_device()
    );
}
