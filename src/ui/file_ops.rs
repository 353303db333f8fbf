//! Presets file dialogs.
//!
//! The toolbar only records which dialog was requested; the native dialog runs
//! at the start of the next frame so it never opens while a menu is drawn.

use super::actions::SettingsAction;
use super::state::LatticeViewerApp;
use std::path::{Path, PathBuf};

/// A presets file dialog requested from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetsFileOperation {
    /// Pick an existing presets file
    Open,
    /// Choose where to create a new, empty presets file
    New,
}

impl LatticeViewerApp {
    /// Runs a requested file dialog and dispatches its outcome.
    ///
    /// Cancelling a dialog leaves the current presets untouched.
    pub fn handle_pending_operations(&mut self) {
        let Some(operation) = self.pending_file_operation.take() else {
            return;
        };
        let current = self.presets.path().to_path_buf();
        match operation {
            PresetsFileOperation::Open => {
                if let Some(path) = pick_presets_file(&current) {
                    self.dispatch(SettingsAction::OpenPresetsFile(path));
                }
            }
            PresetsFileOperation::New => {
                if let Some(path) = pick_new_presets_file(&current) {
                    self.dispatch(SettingsAction::NewPresetsFile(path));
                }
            }
        }
    }
}

fn dialog_for(current: &Path) -> rfd::FileDialog {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Presets")
        .add_filter("JSON", &["json"]);
    if let Some(dir) = current.parent().filter(|p| p.is_dir()) {
        dialog = dialog.set_directory(dir);
    }
    dialog
}

fn pick_presets_file(current: &Path) -> Option<PathBuf> {
    let path = dialog_for(current).pick_file();
    log::debug!("Open presets dialog returned {path:?}");
    path
}

fn pick_new_presets_file(current: &Path) -> Option<PathBuf> {
    let path = dialog_for(current)
        .set_file_name("presets.json")
        .save_file();
    log::debug!("New presets dialog returned {path:?}");
    path
}
