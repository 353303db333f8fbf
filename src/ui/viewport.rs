//! 3D viewport: perspective projection of the sphere scene and camera interaction.
//!
//! Spheres are projected with a simple orbit camera and painted back to front,
//! so no depth buffer is needed.

use super::rendering;
use super::state::{LatticeViewerApp, OrbitCamera};
use crate::constants::*;
use crate::scene::Scene;
use eframe::egui;

/// A sphere mapped to screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedSphere {
    /// Screen position of the centre
    pub center: egui::Pos2,
    /// Screen radius in points
    pub radius: f32,
    /// Distance from the camera along the view axis
    pub depth: f32,
    /// Fill colour
    pub color: egui::Color32,
}

/// Projects every sphere of `scene` into `rect`, sorted far to near.
///
/// The camera orbits the scene centre: yaw turns around the vertical axis, pitch
/// around the horizontal axis. Spheres behind the near plane are dropped.
///
/// # Arguments
///
/// * `scene` - Normalized sphere scene
/// * `camera` - Orbit camera
/// * `rect` - Screen rectangle of the viewport
pub fn project_scene(scene: &Scene, camera: &OrbitCamera, rect: egui::Rect) -> Vec<ProjectedSphere> {
    let target = scene.center();
    let (sin_yaw, cos_yaw) = camera.yaw.sin_cos();
    let (sin_pitch, cos_pitch) = camera.pitch.sin_cos();
    let focal = (rect.height() * 0.5) / (CAMERA_FOV_DEGREES.to_radians() * 0.5).tan();
    let origin = rect.center();

    let mut projected: Vec<ProjectedSphere> = scene
        .spheres
        .iter()
        .filter_map(|sphere| {
            let x = sphere.center[0] - target[0];
            let y = sphere.center[1] - target[1];
            let z = sphere.center[2] - target[2];

            let x1 = x * cos_yaw + z * sin_yaw;
            let z1 = -x * sin_yaw + z * cos_yaw;
            let y2 = y * cos_pitch - z1 * sin_pitch;
            let z2 = y * sin_pitch + z1 * cos_pitch;

            let depth = camera.distance - z2;
            if depth < CAMERA_NEAR_PLANE {
                return None;
            }
            let scale = focal / depth;
            let (r, g, b) = sphere.color;
            Some(ProjectedSphere {
                center: egui::pos2(origin.x + x1 * scale, origin.y - y2 * scale),
                radius: (sphere.radius * scale).max(MIN_SPHERE_SCREEN_RADIUS),
                depth,
                color: egui::Color32::from_rgb(r, g, b),
            })
        })
        .collect();

    projected.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    projected
}

impl LatticeViewerApp {
    /// Draws the viewport and applies camera input.
    ///
    /// Dragging rotates, scrolling zooms and double-clicking resets the view.
    pub fn draw_viewport(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;

        if response.dragged() {
            self.prefs.camera.rotate(response.drag_delta());
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.prefs.camera.zoom(scroll);
            }
        }
        if response.double_clicked() {
            self.prefs.camera.reset();
        }

        let background = if self.prefs.dark_mode {
            egui::Color32::from_gray(24)
        } else {
            egui::Color32::from_gray(236)
        };
        painter.rect_filled(rect, 0.0, background);

        let scene = self.session.scene();
        if scene.is_empty() {
            rendering::draw_empty_hint(&painter, rect, self.prefs.dark_mode);
            return;
        }
        let spheres = project_scene(scene, &self.prefs.camera, rect);
        rendering::paint_spheres(&painter, &spheres);
    }
}
