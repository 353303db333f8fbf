//! Application state management structures.
//!
//! This module contains the state the desktop surface keeps between frames:
//! persisted UI preferences (theme, panel width, camera), the settings being
//! edited, the preset selections of each preset bar, and the modal dialogs.

use super::actions::SettingsAction;
use super::file_ops::PresetsFileOperation;
use crate::compiler::{GfortranToolchain, Toolchain};
use crate::config::AppConfig;
use crate::constants::*;
use crate::presets::{category, PresetStore};
use crate::session::{LatticeSession, PipelineConfig};
use crate::types::*;
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Orbit camera looking at the centre of the scene.
///
/// With zero angles the camera looks straight down the z axis at the lattice plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrbitCamera {
    /// Rotation around the vertical screen axis, in radians
    pub yaw: f32,
    /// Rotation around the horizontal screen axis, in radians
    pub pitch: f32,
    /// Distance from the orbit target in normalized scene units
    pub distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: CAMERA_DEFAULT_DISTANCE,
        }
    }
}

impl OrbitCamera {
    /// Restores the default view.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Rotates by a dragged screen distance in pixels.
    pub fn rotate(&mut self, drag: egui::Vec2) {
        let limit = std::f32::consts::FRAC_PI_2;
        self.yaw = (self.yaw + drag.x * CAMERA_ROTATE_SPEED) % std::f32::consts::TAU;
        self.pitch = (self.pitch + drag.y * CAMERA_ROTATE_SPEED).clamp(-limit, limit);
    }

    /// Moves closer for positive scroll and farther for negative scroll.
    pub fn zoom(&mut self, scroll: f32) {
        let factor = (-scroll * 0.002).exp();
        self.distance =
            (self.distance * factor).clamp(CAMERA_MIN_DISTANCE, CAMERA_MAX_DISTANCE);
    }
}

/// Preferences persisted through eframe storage between restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiPreferences {
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Remembered width of the settings panel
    pub settings_panel_width: f32,
    /// Last camera position
    pub camera: OrbitCamera,
    /// Last known window inner size in logical points (desktop only)
    pub window_inner_size: Option<(f32, f32)>,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            settings_panel_width: SETTINGS_PANEL_WIDTH,
            camera: OrbitCamera::default(),
            window_inner_size: None,
        }
    }
}

impl UiPreferences {
    /// Serializes the preferences to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes preferences from JSON.
    ///
    /// # Arguments
    ///
    /// * `json` - JSON string previously produced by [`UiPreferences::to_json`]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The preset bars of the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetScope {
    /// Whole settings (top bar)
    Settings,
    /// The list of scalar parameters
    ParameterList,
    /// Basis vectors and unit cell
    LatticeDefinition,
}

impl PresetScope {
    /// Preset store category backing this bar.
    pub fn category(self) -> &'static str {
        match self {
            PresetScope::Settings => category::LATTICE,
            PresetScope::ParameterList => category::SCALAR_PROPERTY_LIST,
            PresetScope::LatticeDefinition => category::LATTICE_DEFINITION,
        }
    }

    /// Widget id salt for the preset combo of this bar.
    pub fn id_salt(self) -> &'static str {
        match self {
            PresetScope::Settings => "settings_presets_combo",
            PresetScope::ParameterList => "parameter_list_presets_combo",
            PresetScope::LatticeDefinition => "lattice_definition_presets_combo",
        }
    }
}

/// The selected preset of each preset bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetSelection {
    settings: Option<String>,
    parameter_list: Option<String>,
    lattice_definition: Option<String>,
}

impl PresetSelection {
    /// Selected preset of a bar.
    pub fn get(&self, scope: PresetScope) -> Option<&str> {
        match scope {
            PresetScope::Settings => self.settings.as_deref(),
            PresetScope::ParameterList => self.parameter_list.as_deref(),
            PresetScope::LatticeDefinition => self.lattice_definition.as_deref(),
        }
    }

    /// Changes the selection of a bar.
    pub fn set(&mut self, scope: PresetScope, name: Option<String>) {
        let slot = match scope {
            PresetScope::Settings => &mut self.settings,
            PresetScope::ParameterList => &mut self.parameter_list,
            PresetScope::LatticeDefinition => &mut self.lattice_definition,
        };
        *slot = name;
    }
}

/// A modal error message.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDialog {
    /// Window title
    pub title: String,
    /// Body text
    pub message: String,
}

/// What the name typed into a [`NamePrompt`] is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    /// Create a preset in a bar from the current values
    AddPreset(PresetScope),
    /// Save a parameter row as a scalar-property preset
    SaveParameter(usize),
    /// Save a site row as a vector-property preset
    SaveSite(usize),
}

/// A modal asking for a preset name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamePrompt {
    /// What happens on confirmation
    pub purpose: PromptPurpose,
    /// Name being typed
    pub name: String,
}

/// The main application structure containing UI state and the lattice settings.
///
/// This struct implements the `eframe::App` trait and handles all user interface
/// rendering and interaction logic.
pub struct LatticeViewerApp {
    /// Preferences persisted between restarts
    pub prefs: UiPreferences,
    /// Settings being edited
    pub settings: LatticeSettings,
    /// All presets, backed by the presets file
    pub presets: PresetStore,
    /// Selected preset of each bar
    pub selection: PresetSelection,
    /// Compiled mask and the scene it produced
    pub session: LatticeSession,
    /// Compiler used by the compile button
    pub toolchain: Box<dyn Toolchain>,
    /// Build location and enumeration limit
    pub pipeline: PipelineConfig,
    /// Error dialog currently shown, if any
    pub error_dialog: Option<ErrorDialog>,
    /// Name prompt currently shown, if any
    pub name_prompt: Option<NamePrompt>,
    /// One-line status shown in the toolbar
    pub status: String,
    /// Actions emitted by widgets this frame, dispatched after drawing
    pub(crate) pending_actions: Vec<SettingsAction>,
    /// File dialog requested from the toolbar, shown next frame
    pub(crate) pending_file_operation: Option<PresetsFileOperation>,
    /// Whether the stored window geometry was applied this session
    pub(crate) applied_viewport_restore: bool,
}

impl LatticeViewerApp {
    /// Builds the application from startup configuration and stored preferences.
    ///
    /// A presets file that cannot be read is reported in an error dialog; the
    /// application then starts with an empty store for the same path.
    pub fn new(config: AppConfig, storage: Option<&dyn eframe::Storage>) -> Self {
        let prefs = storage
            .and_then(|s| s.get_string("app_state"))
            .and_then(|json| match UiPreferences::from_json(&json) {
                Ok(prefs) => Some(prefs),
                Err(err) => {
                    log::warn!("Ignoring stored preferences: {err}");
                    None
                }
            })
            .unwrap_or_default();

        let (presets, error_dialog) = match PresetStore::open(&config.presets_path) {
            Ok(store) => (store, None),
            Err(err) => {
                log::error!("{err}");
                let dialog = ErrorDialog {
                    title: "Cannot load presets".to_string(),
                    message: err.to_string(),
                };
                (PresetStore::empty(&config.presets_path), Some(dialog))
            }
        };

        let toolchain = Box::new(GfortranToolchain::new(config.compiler.clone()));
        let mut app = Self::with_parts(presets, toolchain, config.pipeline);
        app.prefs = prefs;
        app.error_dialog = error_dialog;
        app
    }

    /// Builds the application around an existing store and toolchain.
    ///
    /// The first top-level preset, if any, is selected and loaded.
    pub fn with_parts(
        presets: PresetStore,
        toolchain: Box<dyn Toolchain>,
        pipeline: PipelineConfig,
    ) -> Self {
        let mut app = Self {
            prefs: UiPreferences::default(),
            settings: LatticeSettings::default(),
            presets,
            selection: PresetSelection::default(),
            session: LatticeSession::new(),
            toolchain,
            pipeline,
            error_dialog: None,
            name_prompt: None,
            status: String::new(),
            pending_actions: Vec::new(),
            pending_file_operation: None,
            applied_viewport_restore: false,
        };
        app.select_first_presets();
        app
    }

    /// Queues an action for dispatch at the end of the frame.
    pub fn emit(&mut self, action: SettingsAction) {
        self.pending_actions.push(action);
    }

    /// Dispatches every queued action in order.
    pub fn flush_actions(&mut self) {
        for action in std::mem::take(&mut self.pending_actions) {
            self.dispatch(action);
        }
    }

    /// Selects the first preset of every bar and loads the first top-level preset.
    pub(crate) fn select_first_presets(&mut self) {
        self.selection = PresetSelection::default();
        for scope in [PresetScope::ParameterList, PresetScope::LatticeDefinition] {
            let first = self.presets.names(scope.category()).into_iter().next();
            self.selection.set(scope, first);
        }
        if let Some(first) = self
            .presets
            .names(PresetScope::Settings.category())
            .into_iter()
            .next()
        {
            self.dispatch(SettingsAction::SelectPreset(PresetScope::Settings, first));
        }
    }

    /// Ensures the editor always shows at least one parameter row and one site.
    pub(crate) fn normalize_rows(&mut self) {
        if self.settings.parameters.is_empty() {
            self.settings.parameters.push(ScalarParameter::default());
        }
        if self.settings.lattice.sites.is_empty() {
            self.settings.lattice.sites.push(UnitCellSite::default());
        }
    }
}
