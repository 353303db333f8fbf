//! Drawing helpers: the code editor layouter and sphere painting.

use super::highlighters;
use super::viewport::ProjectedSphere;
use eframe::egui;

/// Creates a Fortran syntax highlighting layouter for `TextEdit`.
///
/// # Returns
///
/// A closure that can be used as a layouter for egui::TextEdit
pub fn create_fortran_layouter(
) -> impl FnMut(&egui::Ui, &dyn egui::TextBuffer, f32) -> std::sync::Arc<egui::Galley> {
    move |ui: &egui::Ui, text: &dyn egui::TextBuffer, wrap_width: f32| {
        let font_id = egui::TextStyle::Monospace.resolve(ui.style());
        let mut layout_job =
            highlighters::highlight_fortran(text.as_str(), font_id, ui.visuals().dark_mode);
        layout_job.wrap.max_width = wrap_width;
        ui.ctx().fonts_mut(|f| f.layout_job(layout_job))
    }
}

/// Paints projected spheres in the given order as shaded discs.
///
/// # Arguments
///
/// * `painter` - Painter clipped to the viewport
/// * `spheres` - Spheres sorted far to near
pub fn paint_spheres(painter: &egui::Painter, spheres: &[ProjectedSphere]) {
    for sphere in spheres {
        let rim = sphere.color.gamma_multiply(0.55);
        painter.circle_filled(sphere.center, sphere.radius, rim);
        painter.circle_filled(sphere.center, sphere.radius * 0.85, sphere.color);

        // Specular highlight towards the upper left
        if sphere.radius >= 3.0 {
            let offset = egui::vec2(-0.35, -0.35) * sphere.radius;
            let highlight = lighten(sphere.color, 0.6);
            painter.circle_filled(sphere.center + offset, sphere.radius * 0.3, highlight);
        }
    }
}

/// Text shown before anything has been compiled or when the mask rejected every point.
pub fn draw_empty_hint(painter: &egui::Painter, rect: egui::Rect, dark_mode: bool) {
    let color = if dark_mode {
        egui::Color32::from_gray(150)
    } else {
        egui::Color32::from_gray(90)
    };
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        "No lattice points.\nPress \"Compile and generate lattice\" to render.",
        egui::FontId::proportional(16.0),
        color,
    );
}

fn lighten(color: egui::Color32, amount: f32) -> egui::Color32 {
    let mix = |c: u8| (c as f32 + (255.0 - c as f32) * amount).round() as u8;
    egui::Color32::from_rgb(mix(color.r()), mix(color.g()), mix(color.b()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighten() {
        assert_eq!(lighten(egui::Color32::BLACK, 0.5), egui::Color32::from_rgb(128, 128, 128));
        assert_eq!(lighten(egui::Color32::WHITE, 0.5), egui::Color32::WHITE);
        assert_eq!(
            lighten(egui::Color32::from_rgb(0, 100, 255), 0.0),
            egui::Color32::from_rgb(0, 100, 255)
        );
    }
}
