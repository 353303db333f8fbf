//! # Lattice Viewer
//!
//! An interactive editor for 2D point lattices. A lattice is described by two
//! basis vectors, a unit cell of sites and a rectangular window; a small Fortran
//! `mask` subroutine decides which points are kept.
//!
//! Pressing compile turns the settings into a Fortran module, builds it into a
//! shared library with gfortran, loads the mask, enumerates every lattice point
//! inside the window and renders the survivors as spheres.
//!
//! ## Features
//! - Named presets for whole settings, parameter lists, lattice definitions,
//!   single parameters and single sites, stored in one JSON file
//! - Typed constants generated from the parameter table
//! - Fortran editor with syntax highlighting and reindent
//! - Orbit camera viewport
//! - Built-in example lattices

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codegen;
pub mod compiler;
pub mod config;
pub mod constants;
pub mod error;
pub mod examples;
pub mod lattice;
pub mod literal;
pub mod presets;
pub mod scene;
pub mod session;
pub mod types;
pub mod ui;

// Re-export public types and functions
pub use config::AppConfig;
pub use error::{CodegenError, CompileError, LatticeError, PipelineError, PresetError};
pub use lattice::{enumerate_lattice, MaskFunction};
pub use presets::PresetStore;
pub use session::{LatticeSession, PipelineConfig};
pub use types::*;
pub use ui::LatticeViewerApp;

/// Runs the lattice viewer with the given startup configuration.
///
/// This function initializes the egui application window and starts the main event loop.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// use lattice_viewer::{run_app, AppConfig};
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app(AppConfig::default())
/// }
/// ```
pub fn run_app(config: AppConfig) -> Result<(), eframe::Error> {
    log::info!("Starting with presets file {}", config.presets_path.display());
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Lattice Viewer")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Lattice Viewer",
        options,
        Box::new(move |cc| Ok(Box::new(LatticeViewerApp::new(config, cc.storage)))),
    )
}
