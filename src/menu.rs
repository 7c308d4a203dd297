//! Configuration Menu Controller
//!
//! One call to [`next_intent`] is one interaction cycle: the operator either
//! picks a field to edit, asks to start, or exits. Field editors take the
//! current value and return the new one; a cancelled editor returns the
//! current value unchanged.

use crate::backup_config::{BackupConfiguration, BackupMode, BlockSize, EditTarget, TapeMode};
use crate::console::{ChoiceItem, Console, ListItem, MenuAction, MenuEntry};
use tracing::{debug, warn};

const DIRECTORY_SELECTION_HELP: &str = "Select directories to back up.

Enter the numbers of the directories to include, in the order they should
be written to tape. Entries marked [x] are currently selected.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuIntent {
    Edit(EditTarget),
    Start,
    Cancel,
}

pub fn next_intent(console: &mut dyn Console, config: &BackupConfiguration) -> MenuIntent {
    let entries: Vec<MenuEntry> = EditTarget::ALL
        .iter()
        .map(|target| MenuEntry {
            label: target.label().to_string(),
            value: config.field_value(*target),
        })
        .collect();

    loop {
        match console.menu(
            "Backup Configuration",
            "Please review the following:",
            &entries,
        ) {
            MenuAction::Edit(index) => match EditTarget::ALL.get(index) {
                Some(target) => return MenuIntent::Edit(*target),
                None => warn!("Menu returned unknown entry {}", index),
            },
            MenuAction::Start => return MenuIntent::Start,
            MenuAction::Exit => return MenuIntent::Cancel,
        }
    }
}

/// Run the editor for `target` and merge its result into `config`.
/// `catalog` is the current dataset listing.
pub fn edit(
    console: &mut dyn Console,
    target: EditTarget,
    config: &mut BackupConfiguration,
    catalog: &[String],
) {
    match target {
        EditTarget::BackupMode => config.mode = select_backup_mode(console, config.mode),
        EditTarget::BlockSize => config.block_size = enter_block_size(console, config.block_size),
        EditTarget::AutoEject => config.auto_eject = select_auto_eject(console, config.auto_eject),
        EditTarget::TapeMode => config.tape_mode = select_tape_mode(console, config.tape_mode),
        EditTarget::Directories => select_directories(console, config, catalog),
    }
    debug!("Edited {}: {:?}", target.label(), config);
}

/// Final review before the run. True means go.
pub fn confirm(console: &mut dyn Console, config: &BackupConfiguration) -> bool {
    console.confirm_form(
        "Final Confirmation",
        "Please review the following. Confirm to start backup or decline to return to backup menu.",
        &config.summary_rows(),
    )
}

pub fn select_backup_mode(console: &mut dyn Console, current: BackupMode) -> BackupMode {
    let items: Vec<ChoiceItem> = BackupMode::ALL
        .iter()
        .map(|mode| ChoiceItem {
            tag: mode.display_name().to_string(),
            description: mode.description().to_string(),
        })
        .collect();
    let current_index = BackupMode::ALL
        .iter()
        .position(|m| *m == current)
        .unwrap_or(0);

    console
        .radio_list("Backup Mode", "Select backup mode:", &items, current_index)
        .and_then(|i| BackupMode::ALL.get(i).copied())
        .unwrap_or(current)
}

/// Re-prompts on invalid input; only a positive integer is ever returned
/// besides `current`.
pub fn enter_block_size(console: &mut dyn Console, current: BlockSize) -> BlockSize {
    loop {
        let Some(answer) = console.input(
            "Block Size",
            "Enter tape block size (default 512):",
            &current.to_string(),
        ) else {
            return current;
        };

        match BlockSize::parse(&answer) {
            Ok(size) => return size,
            Err(e) => {
                warn!("Rejected block size {:?}", answer);
                console.error("Invalid Block Size", &e.to_string());
            }
        }
    }
}

pub fn select_auto_eject(console: &mut dyn Console, current: bool) -> bool {
    console
        .yes_no(
            "Auto Eject",
            "Should the tape automatically eject when the backup is finished?",
        )
        .unwrap_or(current)
}

pub fn select_tape_mode(console: &mut dyn Console, current: TapeMode) -> TapeMode {
    let items: Vec<ChoiceItem> = TapeMode::ALL
        .iter()
        .map(|mode| ChoiceItem {
            tag: mode.display_name().to_string(),
            description: mode.description().to_string(),
        })
        .collect();
    let current_index = TapeMode::ALL
        .iter()
        .position(|m| *m == current)
        .unwrap_or(0);

    console
        .radio_list("Tape Mode", "Select tape mode:", &items, current_index)
        .and_then(|i| TapeMode::ALL.get(i).copied())
        .unwrap_or(current)
}

/// Offers exactly the catalog entries, pre-checked from the current
/// selection.
pub fn select_directories(
    console: &mut dyn Console,
    config: &mut BackupConfiguration,
    catalog: &[String],
) {
    config.retain_catalog(catalog);

    let items: Vec<ListItem> = catalog
        .iter()
        .map(|dir| ListItem {
            label: dir.clone(),
            selected: config.selected_directories().contains(dir),
        })
        .collect();

    if let Some(indices) = console.build_list("Select Directories", DIRECTORY_SELECTION_HELP, &items) {
        let chosen = indices
            .into_iter()
            .filter_map(|i| catalog.get(i).cloned());
        config.select_directories(chosen, catalog);
    }
}
