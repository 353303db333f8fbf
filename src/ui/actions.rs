//! Structural edits of the settings and presets.
//!
//! Widgets never change rows, presets or the preset file directly: they emit a
//! [`SettingsAction`], and [`LatticeViewerApp::dispatch`] applies it. Failures
//! end up in the error dialog.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use super::state::{ErrorDialog, LatticeViewerApp, NamePrompt, PresetScope, PromptPurpose};
use crate::error::{CodegenError, PipelineError, PresetError};
use crate::examples::{build_example, ExampleKind};
use crate::presets::{category, PresetStore};
use crate::types::*;

/// Shown when a preset bar action needs a selected preset.
pub const NO_PRESET_MESSAGE: &str = "No preset defined. Create new preset by clicking add!";

/// Every structural change the settings panel can request.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsAction {
    /// Select a preset of a bar and load its values
    SelectPreset(PresetScope, String),
    /// Overwrite the selected preset of a bar with the current values
    SavePreset(PresetScope),
    /// Store the current values under a new name and select it
    AddPreset(PresetScope, String),
    /// Delete the selected preset of a bar
    DeletePreset(PresetScope),
    /// Append an empty parameter row
    AddParameter,
    /// Remove a parameter row; the last row is kept
    RemoveParameter(usize),
    /// Store a parameter row as a scalar-property preset
    SaveParameterPreset {
        /// Row index
        index: usize,
        /// Preset name
        name: String,
    },
    /// Replace a parameter row with a scalar-property preset
    LoadParameterPreset {
        /// Row index
        index: usize,
        /// Preset name
        preset: String,
    },
    /// Append a default site
    AddSite,
    /// Remove a site; the last site is kept
    RemoveSite(usize),
    /// Store a site as a vector-property preset
    SaveSitePreset {
        /// Site index
        index: usize,
        /// Preset name
        name: String,
    },
    /// Replace a site with a vector-property preset
    LoadSitePreset {
        /// Site index
        index: usize,
        /// Preset name
        preset: String,
    },
    /// Ask the user for a name, pre-filled with a default
    PromptName(PromptPurpose, String),
    /// Replace the settings with a built-in example
    LoadExample(ExampleKind),
    /// Switch to another presets file; a missing file starts empty
    OpenPresetsFile(PathBuf),
    /// Start an empty presets file at a path, replacing its contents
    NewPresetsFile(PathBuf),
    /// Generate, compile, enumerate and render
    Compile,
    /// Restore the default camera
    ResetCamera,
}

impl LatticeViewerApp {
    /// Applies one action. Errors are shown in the error dialog.
    pub fn dispatch(&mut self, action: SettingsAction) {
        log::debug!("Settings action: {action:?}");
        let result = match action {
            SettingsAction::SelectPreset(scope, name) => self.select_preset(scope, name),
            SettingsAction::SavePreset(scope) => self.save_preset(scope),
            SettingsAction::AddPreset(scope, name) => self.add_preset(scope, name),
            SettingsAction::DeletePreset(scope) => self.delete_preset(scope),
            SettingsAction::AddParameter => {
                self.settings.parameters.push(ScalarParameter::default());
                Ok(())
            }
            SettingsAction::RemoveParameter(index) => {
                if self.settings.parameters.len() > 1 && index < self.settings.parameters.len() {
                    self.settings.parameters.remove(index);
                }
                Ok(())
            }
            SettingsAction::SaveParameterPreset { index, name } => {
                match self.settings.parameters.get(index) {
                    Some(parameter) => {
                        self.presets
                            .upsert(category::SCALAR_PROPERTY, name.trim(), parameter)
                    }
                    None => Ok(()),
                }
            }
            SettingsAction::LoadParameterPreset { index, preset } => self
                .presets
                .get_as::<ScalarParameter>(category::SCALAR_PROPERTY, &preset)
                .map(|loaded| {
                    if let (Some(loaded), Some(row)) =
                        (loaded, self.settings.parameters.get_mut(index))
                    {
                        *row = loaded;
                    }
                }),
            SettingsAction::AddSite => {
                self.settings.lattice.sites.push(UnitCellSite::default());
                Ok(())
            }
            SettingsAction::RemoveSite(index) => {
                let sites = &mut self.settings.lattice.sites;
                if sites.len() > 1 && index < sites.len() {
                    sites.remove(index);
                }
                Ok(())
            }
            SettingsAction::SaveSitePreset { index, name } => {
                match self.settings.lattice.sites.get(index) {
                    Some(site) => self
                        .presets
                        .upsert(category::VECTOR_PROPERTY, name.trim(), site),
                    None => Ok(()),
                }
            }
            SettingsAction::LoadSitePreset { index, preset } => self
                .presets
                .get_as::<UnitCellSite>(category::VECTOR_PROPERTY, &preset)
                .map(|loaded| {
                    if let (Some(loaded), Some(site)) =
                        (loaded, self.settings.lattice.sites.get_mut(index))
                    {
                        *site = loaded;
                    }
                }),
            SettingsAction::PromptName(purpose, name) => {
                self.name_prompt = Some(NamePrompt { purpose, name });
                Ok(())
            }
            SettingsAction::LoadExample(kind) => {
                self.settings = build_example(kind);
                Ok(())
            }
            SettingsAction::OpenPresetsFile(path) => self.open_presets_file(path),
            SettingsAction::NewPresetsFile(path) => self.new_presets_file(path),
            SettingsAction::Compile => {
                self.compile();
                Ok(())
            }
            SettingsAction::ResetCamera => {
                self.prefs.camera.reset();
                Ok(())
            }
        };

        if let Err(err) = result {
            log::error!("{err}");
            self.show_error("Error", err.to_string());
        }
        self.normalize_rows();
    }

    /// Opens the error dialog.
    pub fn show_error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.error_dialog = Some(ErrorDialog {
            title: title.into(),
            message: message.into(),
        });
    }

    fn select_preset(&mut self, scope: PresetScope, name: String) -> Result<(), PresetError> {
        let category = scope.category();
        match scope {
            PresetScope::Settings => {
                if let Some(settings) = self.presets.get_as::<LatticeSettings>(category, &name)? {
                    self.settings = settings;
                }
            }
            PresetScope::ParameterList => {
                if let Some(parameters) =
                    self.presets.get_as::<Vec<ScalarParameter>>(category, &name)?
                {
                    self.settings.parameters = parameters;
                }
            }
            PresetScope::LatticeDefinition => {
                if let Some(lattice) = self.presets.get_as::<LatticeDefinition>(category, &name)? {
                    self.settings.lattice = lattice;
                }
            }
        }
        self.selection.set(scope, Some(name));
        Ok(())
    }

    fn save_preset(&mut self, scope: PresetScope) -> Result<(), PresetError> {
        let Some(name) = self.selection.get(scope).map(str::to_string) else {
            self.show_error("No preset", NO_PRESET_MESSAGE);
            return Ok(());
        };
        self.store_scope(scope, &name)
    }

    fn add_preset(&mut self, scope: PresetScope, name: String) -> Result<(), PresetError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Ok(());
        }
        self.store_scope(scope, &name)?;
        self.selection.set(scope, Some(name));
        Ok(())
    }

    fn delete_preset(&mut self, scope: PresetScope) -> Result<(), PresetError> {
        let Some(name) = self.selection.get(scope).map(str::to_string) else {
            return Ok(());
        };
        self.presets.delete(scope.category(), &name)?;
        self.selection.set(scope, None);
        if let Some(first) = self.presets.names(scope.category()).into_iter().next() {
            self.select_preset(scope, first)?;
        }
        Ok(())
    }

    fn store_scope(&mut self, scope: PresetScope, name: &str) -> Result<(), PresetError> {
        let category = scope.category();
        match scope {
            PresetScope::Settings => self.presets.upsert(category, name, &self.settings),
            PresetScope::ParameterList => {
                self.presets
                    .upsert(category, name, &self.settings.parameters)
            }
            PresetScope::LatticeDefinition => {
                self.presets.upsert(category, name, &self.settings.lattice)
            }
        }
    }

    fn open_presets_file(&mut self, path: PathBuf) -> Result<(), PresetError> {
        self.presets = PresetStore::open(path)?;
        self.select_first_presets();
        self.status = format!("Presets: {}", self.presets.path().display());
        Ok(())
    }

    fn new_presets_file(&mut self, path: PathBuf) -> Result<(), PresetError> {
        let store = PresetStore::empty(path);
        store.save()?;
        self.presets = store;
        self.select_first_presets();
        self.status = format!("Presets: {}", self.presets.path().display());
        Ok(())
    }

    fn compile(&mut self) {
        let preset = self
            .selection
            .get(PresetScope::Settings)
            .unwrap_or_default()
            .to_string();

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.session
                .compile_and_render(
                    &preset,
                    &self.settings,
                    self.toolchain.as_ref(),
                    &self.pipeline,
                )
                .map(|scene| scene.len())
        }));

        let result = match outcome {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<String>()
                    .cloned()
                    .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(PipelineError::Unexpected(detail))
            }
        };

        match result {
            Ok(count) => {
                self.status = format!("{preset}: {count} points");
            }
            Err(err) => {
                log::error!("Compile failed: {err:?}");
                let message = pipeline_message(&err);
                self.show_error(err.title(), message);
            }
        }
    }
}

/// Dialog text for a pipeline failure.
fn pipeline_message(err: &PipelineError) -> String {
    match err {
        PipelineError::Codegen(CodegenError::MissingPresetName) => NO_PRESET_MESSAGE.to_string(),
        PipelineError::Codegen(CodegenError::InvalidParameter { position }) => {
            format!("Missing name or value for property {position}\nSet correct name or value")
        }
        PipelineError::Unexpected(_) => {
            "An unexpected error occurred. Check the log for details.".to_string()
        }
        other => other.to_string(),
    }
}
