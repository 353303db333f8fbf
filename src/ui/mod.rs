//! Desktop user interface of the lattice viewer.
//!
//! The window has a toolbar on top, the settings panel on the left and the 3D
//! viewport filling the rest. Widgets never apply structural edits directly;
//! they emit [`SettingsAction`]s that are dispatched at the end of the frame.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main LatticeViewerApp
//! - `actions` - Settings actions and their dispatch
//! - `editor` - Keyboard handling and reindent for the Fortran editor
//! - `highlighters` - Syntax highlighting for Fortran
//! - `file_ops` - Presets file dialogs
//! - `viewport` - Camera, projection and viewport interaction
//! - `rendering` - Editor layouter and sphere painting

mod actions;
mod editor;
mod file_ops;
mod highlighters;
mod rendering;
mod state;
mod viewport;


pub use actions::{SettingsAction, NO_PRESET_MESSAGE};
pub use file_ops::PresetsFileOperation;
pub use state::{
    ErrorDialog, LatticeViewerApp, NamePrompt, OrbitCamera, PresetScope, PresetSelection,
    PromptPurpose, UiPreferences,
};
pub use viewport::{project_scene, ProjectedSphere};

use self::editor::{handle_code_textedit_keys, is_macos_platform, reindent_fortran, CodeEditOptions};
use crate::constants::*;
use crate::examples::all_examples;
use crate::presets::category;
use eframe::egui;

impl eframe::App for LatticeViewerApp {
    /// Persist the UI preferences between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.prefs.to_json() {
            Ok(json) => {
                storage.set_string("app_state", json);
            }
            Err(err) => {
                log::error!("Failed to serialize preferences: {err}");
            }
        }
    }

    /// Main update function called by egui for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.prefs.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        // File dialogs requested last frame
        self.handle_pending_operations();

        // Restore native window size once per session
        if !self.applied_viewport_restore {
            if let Some((w, h)) = self.prefs.window_inner_size {
                ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(w, h)));
            }
            self.applied_viewport_restore = true;
        }
        let size = ctx.input(|i| i.screen_rect().size());
        self.prefs.window_inner_size = Some((size.x, size.y));

        self.show(ctx);
    }
}

impl LatticeViewerApp {
    /// Lays out every panel and dialog, then dispatches the actions they emitted.
    pub fn show(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        let viewport_width = ctx.input(|i| i.screen_rect().width());
        let max_width = (viewport_width * 0.9).max(SETTINGS_PANEL_MIN_WIDTH);
        let width = self
            .prefs
            .settings_panel_width
            .clamp(SETTINGS_PANEL_MIN_WIDTH, max_width);

        egui::SidePanel::left("settings_panel")
            .resizable(true)
            .default_width(width)
            .min_width(SETTINGS_PANEL_MIN_WIDTH)
            .show(ctx, |ui| {
                self.prefs.settings_panel_width = ui
                    .available_width()
                    .clamp(SETTINGS_PANEL_MIN_WIDTH, max_width);
                self.draw_settings_panel(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_viewport(ui);
        });

        self.draw_error_dialog(ctx);
        self.draw_name_prompt(ctx);

        self.flush_actions();
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.menu_button("Examples", |ui| {
                for info in all_examples() {
                    if ui.button(info.name).clicked() {
                        self.emit(SettingsAction::LoadExample(info.kind));
                    }
                }
            });
            if ui.button("Open presets...").clicked() {
                self.pending_file_operation = Some(PresetsFileOperation::Open);
            }
            if ui.button("New presets...").clicked() {
                self.pending_file_operation = Some(PresetsFileOperation::New);
            }

            ui.separator();

            if ui.button("Reset view").clicked() {
                self.emit(SettingsAction::ResetCamera);
            }
            ui.checkbox(&mut self.prefs.dark_mode, "Dark Mode");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(self.presets.path().display().to_string());
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(self.status.as_str());
                }
            });
        });
    }

    fn draw_settings_panel(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .id_salt("settings_scroll")
            .show(ui, |ui| {
                ui.heading("Lattice settings");
                self.draw_preset_bar(ui, PresetScope::Settings, "Preset");
                ui.separator();

                egui::CollapsingHeader::new("Constants")
                    .default_open(true)
                    .show(ui, |ui| {
                        self.draw_preset_bar(ui, PresetScope::ParameterList, "List");
                        self.draw_parameters(ui);
                    });

                egui::CollapsingHeader::new("Lattice")
                    .default_open(true)
                    .show(ui, |ui| {
                        self.draw_preset_bar(ui, PresetScope::LatticeDefinition, "Definition");
                        self.draw_basis(ui);
                        self.draw_sites(ui);
                    });

                egui::CollapsingHeader::new("Dimensions")
                    .default_open(true)
                    .show(ui, |ui| {
                        self.draw_dimensions(ui);
                    });

                egui::CollapsingHeader::new("Editor")
                    .default_open(true)
                    .show(ui, |ui| {
                        self.draw_code_editor(ui);
                    });

                ui.separator();
                let button = egui::Button::new("Compile and generate lattice");
                if ui
                    .add_sized([ui.available_width(), 28.0], button)
                    .clicked()
                {
                    self.emit(SettingsAction::Compile);
                }
            });
    }

    /// Combo of preset names plus Save, Add and Del buttons.
    fn draw_preset_bar(&mut self, ui: &mut egui::Ui, scope: PresetScope, label: &str) {
        let names = self.presets.names(scope.category());
        let selected = self.selection.get(scope).map(str::to_string);

        ui.horizontal(|ui| {
            ui.label(label);
            egui::ComboBox::from_id_salt(scope.id_salt())
                .selected_text(selected.as_deref().unwrap_or("<none>"))
                .width(160.0)
                .show_ui(ui, |ui| {
                    for name in &names {
                        let is_selected = selected.as_deref() == Some(name.as_str());
                        if ui.selectable_label(is_selected, name.as_str()).clicked() {
                            self.emit(SettingsAction::SelectPreset(scope, name.clone()));
                        }
                    }
                });
            if ui.button("Save").clicked() {
                self.emit(SettingsAction::SavePreset(scope));
            }
            if ui.button("Add").clicked() {
                self.emit(SettingsAction::PromptName(
                    PromptPurpose::AddPreset(scope),
                    selected.clone().unwrap_or_default(),
                ));
            }
            if ui
                .add_enabled(selected.is_some(), egui::Button::new("Del"))
                .clicked()
            {
                self.emit(SettingsAction::DeletePreset(scope));
            }
        });
    }

    fn draw_parameters(&mut self, ui: &mut egui::Ui) {
        let presets = self.presets.names(category::SCALAR_PROPERTY);
        let can_delete = self.settings.parameters.len() > 1;
        let mut actions = Vec::new();

        egui::Grid::new("parameters_grid")
            .num_columns(3)
            .striped(true)
            .show(ui, |ui| {
                for (index, parameter) in self.settings.parameters.iter_mut().enumerate() {
                    ui.add(
                        egui::TextEdit::singleline(&mut parameter.name)
                            .hint_text("name")
                            .desired_width(120.0),
                    );
                    ui.add(
                        egui::TextEdit::singleline(&mut parameter.value)
                            .hint_text("value")
                            .desired_width(120.0),
                    );
                    row_menu(
                        ui,
                        RowKind::Parameter,
                        index,
                        can_delete,
                        &parameter.name,
                        &presets,
                        &mut actions,
                    );
                    ui.end_row();
                }
            });

        self.pending_actions.extend(actions);
    }

    fn draw_basis(&mut self, ui: &mut egui::Ui) {
        let lattice = &mut self.settings.lattice;
        egui::Grid::new("basis_grid").num_columns(3).show(ui, |ui| {
            for (label, vector) in [("v1", &mut lattice.v1), ("v2", &mut lattice.v2)] {
                ui.label(label);
                ui.add(egui::DragValue::new(&mut vector.0).speed(0.01).prefix("x: "));
                ui.add(egui::DragValue::new(&mut vector.1).speed(0.01).prefix("y: "));
                ui.end_row();
            }
        });
    }

    fn draw_sites(&mut self, ui: &mut egui::Ui) {
        let presets = self.presets.names(category::VECTOR_PROPERTY);
        let can_delete = self.settings.lattice.sites.len() > 1;
        let mut actions = Vec::new();

        ui.label("Unit cell");
        egui::Grid::new("sites_grid")
            .num_columns(6)
            .striped(true)
            .show(ui, |ui| {
                for (index, site) in self.settings.lattice.sites.iter_mut().enumerate() {
                    ui.add(egui::TextEdit::singleline(&mut site.name).desired_width(60.0));
                    ui.add(egui::DragValue::new(&mut site.value.0).speed(0.01).prefix("x: "));
                    ui.add(egui::DragValue::new(&mut site.value.1).speed(0.01).prefix("y: "));
                    ui.add(
                        egui::DragValue::new(&mut site.size)
                            .speed(0.01)
                            .range(0.0..=f64::MAX)
                            .prefix("r: "),
                    );
                    let (r, g, b) = site.color;
                    let mut rgb = [r, g, b];
                    if ui.color_edit_button_srgb(&mut rgb).changed() {
                        site.color = (rgb[0], rgb[1], rgb[2]);
                    }
                    row_menu(
                        ui,
                        RowKind::Site,
                        index,
                        can_delete,
                        &site.name,
                        &presets,
                        &mut actions,
                    );
                    ui.end_row();
                }
            });

        self.pending_actions.extend(actions);
    }

    fn draw_dimensions(&mut self, ui: &mut egui::Ui) {
        let window = &mut self.settings.dimensions;
        egui::Grid::new("dimensions_grid").num_columns(3).show(ui, |ui| {
            for (label, corner) in [("min", &mut window.v_min), ("max", &mut window.v_max)] {
                ui.label(label);
                ui.add(egui::DragValue::new(&mut corner.0).speed(0.1).prefix("x: "));
                ui.add(egui::DragValue::new(&mut corner.1).speed(0.1).prefix("y: "));
                ui.end_row();
            }
        });
        if window.v_min.0 > window.v_max.0 || window.v_min.1 > window.v_max.1 {
            ui.colored_label(
                egui::Color32::from_rgb(230, 160, 40),
                "Minimum exceeds maximum: the window is empty.",
            );
        }
    }

    fn draw_code_editor(&mut self, ui: &mut egui::Ui) {
        // At most ~40 visible lines before the editor scrolls
        let row_height = ui.text_style_height(&egui::TextStyle::Monospace).max(12.0);
        let max_height = row_height * 40.0 + 8.0;
        let options = CodeEditOptions::default();
        let mut layouter = rendering::create_fortran_layouter();

        egui::ScrollArea::vertical()
            .id_salt("code_editor_scroll")
            .max_height(max_height)
            .show(ui, |ui| {
                let response = ui.add(
                    egui::TextEdit::multiline(&mut self.settings.code)
                        .desired_rows(16)
                        .desired_width(f32::INFINITY)
                        .font(egui::TextStyle::Monospace)
                        .lock_focus(true)
                        .layouter(&mut layouter),
                );

                handle_code_textedit_keys(ui, &response, &mut self.settings.code, &options);

                let format_shortcut = ui.input(|i| {
                    (i.modifiers.ctrl || i.modifiers.command)
                        && i.modifiers.shift
                        && i.key_pressed(egui::Key::F)
                });
                if response.has_focus() && format_shortcut {
                    self.settings.code = reindent_fortran(&self.settings.code, options.indent);
                }
            });

        let hint = if is_macos_platform() {
            "Tip: Press Cmd+Shift+F to reindent the code."
        } else {
            "Tip: Press Ctrl+Shift+F to reindent the code."
        };
        ui.add(egui::Label::new(egui::RichText::new(hint).small().italics()).wrap());
    }

    fn draw_error_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.error_dialog else {
            return;
        };
        let mut close = false;
        egui::Window::new(dialog.title.as_str())
            .id(egui::Id::new("error_dialog"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(dialog.message.as_str());
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });
        if close {
            self.error_dialog = None;
        }
    }

    fn draw_name_prompt(&mut self, ctx: &egui::Context) {
        let Some(prompt) = self.name_prompt.as_mut() else {
            return;
        };
        let title = match prompt.purpose {
            PromptPurpose::AddPreset(_) => "New preset",
            PromptPurpose::SaveParameter(_) => "Save property as preset",
            PromptPurpose::SaveSite(_) => "Save site as preset",
        };

        let (mut confirmed, mut cancelled) = (false, false);
        egui::Window::new(title)
            .id(egui::Id::new("name_prompt"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Name:");
                let response = ui.text_edit_singleline(&mut prompt.name);
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    confirmed = true;
                }
                let valid = !prompt.name.trim().is_empty();
                ui.horizontal(|ui| {
                    if ui.add_enabled(valid, egui::Button::new("OK")).clicked() {
                        confirmed = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancelled = true;
                    }
                });
            });

        if cancelled {
            self.name_prompt = None;
        } else if confirmed {
            if let Some(prompt) = self.name_prompt.take() {
                self.confirm_name_prompt(prompt);
            }
        }
    }

    /// Emits the action a confirmed name prompt stands for. Blank names are ignored.
    pub(crate) fn confirm_name_prompt(&mut self, prompt: NamePrompt) {
        let name = prompt.name.trim().to_string();
        if name.is_empty() {
            return;
        }
        let action = match prompt.purpose {
            PromptPurpose::AddPreset(scope) => SettingsAction::AddPreset(scope, name),
            PromptPurpose::SaveParameter(index) => {
                SettingsAction::SaveParameterPreset { index, name }
            }
            PromptPurpose::SaveSite(index) => SettingsAction::SaveSitePreset { index, name },
        };
        self.emit(action);
    }
}

/// Row types that share the "…" menu.
#[derive(Clone, Copy)]
enum RowKind {
    Parameter,
    Site,
}

/// The "…" menu of a parameter or site row.
fn row_menu(
    ui: &mut egui::Ui,
    kind: RowKind,
    index: usize,
    can_delete: bool,
    default_name: &str,
    presets: &[String],
    actions: &mut Vec<SettingsAction>,
) {
    ui.push_id((index, kind as u8), |ui| {
        ui.menu_button("…", |ui| {
            if ui.button("Add new").clicked() {
                actions.push(match kind {
                    RowKind::Parameter => SettingsAction::AddParameter,
                    RowKind::Site => SettingsAction::AddSite,
                });
            }
            if ui.add_enabled(can_delete, egui::Button::new("Delete")).clicked() {
                actions.push(match kind {
                    RowKind::Parameter => SettingsAction::RemoveParameter(index),
                    RowKind::Site => SettingsAction::RemoveSite(index),
                });
            }
            if ui.button("Save as preset...").clicked() {
                let purpose = match kind {
                    RowKind::Parameter => PromptPurpose::SaveParameter(index),
                    RowKind::Site => PromptPurpose::SaveSite(index),
                };
                actions.push(SettingsAction::PromptName(purpose, default_name.to_string()));
            }
            ui.menu_button("Load from preset", |ui| {
                if presets.is_empty() {
                    ui.label("No presets");
                }
                for preset in presets {
                    if ui.button(preset.as_str()).clicked() {
                        actions.push(match kind {
                            RowKind::Parameter => SettingsAction::LoadParameterPreset {
                                index,
                                preset: preset.clone(),
                            },
                            RowKind::Site => SettingsAction::LoadSitePreset {
                                index,
                                preset: preset.clone(),
                            },
                        });
                    }
                }
            });
        });
    });
}
