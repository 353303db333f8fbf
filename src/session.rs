//! The compile-and-render pipeline behind the compile button.

use std::path::PathBuf;

use crate::codegen::generate_source;
use crate::compiler::{compile_mask, fresh_module_id, CompiledMask, Toolchain};
use crate::constants::DEFAULT_MAX_INDEX_PAIRS;
use crate::error::{CodegenError, PipelineError};
use crate::lattice::enumerate_lattice_within;
use crate::scene::{build_scene, Scene};
use crate::types::LatticeSettings;

/// Limits and locations used by [`LatticeSession::compile_and_render`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Parent directory of per-attempt build directories
    pub build_root: PathBuf,
    /// Largest index range a single enumeration may walk
    pub max_index_pairs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            build_root: std::env::temp_dir().join("lattice-viewer"),
            max_index_pairs: DEFAULT_MAX_INDEX_PAIRS,
        }
    }
}

/// The most recently compiled mask and the scene it produced.
#[derive(Debug, Default)]
pub struct LatticeSession {
    mask: Option<CompiledMask>,
    scene: Scene,
}

impl LatticeSession {
    /// Creates a session with nothing compiled.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current scene; empty until the first successful compile.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The current mask, if any compile has succeeded.
    pub fn mask(&self) -> Option<&CompiledMask> {
        self.mask.as_ref()
    }

    /// Generates, compiles, enumerates and rebuilds the scene.
    ///
    /// The session is only updated when every step succeeds; on failure the
    /// previous mask and scene stay in place.
    ///
    /// # Arguments
    ///
    /// * `preset` - Name of the active preset; compilation requires one
    /// * `settings` - Parameters, lattice, mask code and window
    /// * `toolchain` - Compiler used to build the mask
    /// * `config` - Build location and enumeration limit
    pub fn compile_and_render(
        &mut self,
        preset: &str,
        settings: &LatticeSettings,
        toolchain: &dyn Toolchain,
        config: &PipelineConfig,
    ) -> Result<&Scene, PipelineError> {
        if preset.trim().is_empty() {
            return Err(CodegenError::MissingPresetName.into());
        }

        let module_id = fresh_module_id();
        let source = generate_source(&module_id, settings)?;
        let mask = compile_mask(toolchain, &config.build_root, &source, &module_id, preset)?;

        let points = enumerate_lattice_within(
            &settings.lattice,
            &settings.dimensions,
            &mask,
            config.max_index_pairs,
        )?;
        let scene = build_scene(&points, &settings.lattice.sites);
        log::info!(
            "Preset {preset}: {} points from module {}",
            scene.len(),
            mask.module_id()
        );

        self.mask = Some(mask);
        self.scene = scene;
        Ok(&self.scene)
    }

    /// Drops the mask and the scene.
    pub fn clear(&mut self) {
        self.mask = None;
        self.scene = Scene::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::BuildRequest;
    use crate::error::CompileError;
    use crate::scene::SceneSphere;
    use crate::types::ScalarParameter;
    use std::cell::Cell;

    struct FailingToolchain {
        calls: Cell<usize>,
    }

    impl Toolchain for FailingToolchain {
        fn build(&self, _request: &BuildRequest) -> Result<(), CompileError> {
            self.calls.set(self.calls.get() + 1);
            Err(CompileError::ToolchainFailed {
                code: Some(1),
                stderr: "Error: Symbol 'q' has no IMPLICIT type".into(),
            })
        }
    }

    fn failing() -> FailingToolchain {
        FailingToolchain {
            calls: Cell::new(0),
        }
    }

    fn config(root: &tempfile::TempDir) -> PipelineConfig {
        PipelineConfig {
            build_root: root.path().to_path_buf(),
            max_index_pairs: DEFAULT_MAX_INDEX_PAIRS,
        }
    }

    fn session_with_scene() -> LatticeSession {
        LatticeSession {
            mask: None,
            scene: Scene {
                spheres: vec![SceneSphere {
                    center: [0.0; 3],
                    radius: 0.1,
                    color: (255, 255, 255),
                }],
            },
        }
    }

    #[test]
    fn test_missing_preset_is_a_validation_error() {
        let root = tempfile::tempdir().unwrap();
        let toolchain = failing();
        let mut session = LatticeSession::new();
        let err = session
            .compile_and_render("", &LatticeSettings::default(), &toolchain, &config(&root))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.title(), "No preset");
        assert_eq!(toolchain.calls.get(), 0);
    }

    #[test]
    fn test_invalid_parameter_never_reaches_the_compiler() {
        let root = tempfile::tempdir().unwrap();
        let toolchain = failing();
        let mut session = session_with_scene();
        let mut settings = LatticeSettings::default();
        settings.parameters = vec![ScalarParameter::new("a", "")];

        let err = session
            .compile_and_render("square", &settings, &toolchain, &config(&root))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Codegen(CodegenError::InvalidParameter { position: 1 })
        ));
        assert_eq!(toolchain.calls.get(), 0);
        assert_eq!(session.scene().len(), 1);
    }

    #[test]
    fn test_compile_failure_keeps_previous_state() {
        let root = tempfile::tempdir().unwrap();
        let toolchain = failing();
        let mut session = session_with_scene();
        let before = session.scene().clone();

        let err = session
            .compile_and_render("square", &LatticeSettings::default(), &toolchain, &config(&root))
            .unwrap_err();
        assert_eq!(err.title(), "Cannot compile Fortran code");
        assert!(!err.is_validation());
        assert_eq!(toolchain.calls.get(), 1);
        assert_eq!(session.scene(), &before);
        assert!(session.mask().is_none());
    }

    #[test]
    fn test_clear_resets_scene() {
        let mut session = session_with_scene();
        session.clear();
        assert!(session.scene().is_empty());
        assert!(session.mask().is_none());
    }
}
