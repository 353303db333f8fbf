//! Building generated Fortran into a shared library and loading its mask routine.
//!
//! Every compile attempt gets a fresh module identifier and its own build
//! directory under the build root, so neither module names nor `.mod` files can
//! clash between attempts. The directory is removed when the attempt ends,
//! whether it succeeded or not; the loaded library stays mapped in memory.
//!
//! All unsafe code of the crate lives in this module.
#![allow(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use libloading::Library;
use serde::{Deserialize, Serialize};

use crate::constants::MASK_ROUTINE_NAME;
use crate::error::CompileError;
use crate::lattice::MaskFunction;

/// `subroutine mask(is_in_lattice, x, y, z)` with gfortran's by-reference arguments.
type MaskFn = unsafe extern "C" fn(*mut i32, *const f64, *const f64, *const f64);

/// External compiler invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompilerConfig {
    /// Compiler executable, looked up on `PATH` when not absolute
    pub program: String,
    /// Flags passed before the output and source arguments
    pub flags: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "gfortran".to_string(),
            flags: vec!["-shared".into(), "-fPIC".into(), "-O2".into()],
        }
    }
}

/// Everything a [`Toolchain`] needs for one build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Complete Fortran source
    pub source: String,
    /// Unique module identifier of this attempt
    pub module_id: String,
    /// Where the source file is written, named after the preset
    pub source_path: PathBuf,
    /// Per-attempt directory holding every build product
    pub build_dir: PathBuf,
    /// Shared library the toolchain must produce
    pub artifact: PathBuf,
}

/// The external compiler collaborator.
pub trait Toolchain {
    /// Builds `request.source` into `request.artifact`.
    fn build(&self, request: &BuildRequest) -> Result<(), CompileError>;
}

/// Runs gfortran (or a compatible compiler) as a child process.
#[derive(Debug, Clone, Default)]
pub struct GfortranToolchain {
    config: CompilerConfig,
}

impl GfortranToolchain {
    /// Creates a toolchain with the given program and flags.
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// The invocation settings.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }
}

impl Toolchain for GfortranToolchain {
    fn build(&self, request: &BuildRequest) -> Result<(), CompileError> {
        std::fs::write(&request.source_path, &request.source).map_err(|source| {
            CompileError::BuildDir {
                path: request.source_path.clone(),
                source,
            }
        })?;

        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.flags)
            .arg("-J")
            .arg(&request.build_dir)
            .arg("-o")
            .arg(&request.artifact)
            .arg(&request.source_path)
            .current_dir(&request.build_dir);
        log::info!("Compiling {}: {:?}", request.module_id, command);

        let output = command.output().map_err(|source| CompileError::Launch {
            program: self.config.program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            log::info!("{}: {}", self.config.program, stdout.trim_end());
        }

        if output.status.success() {
            if !stderr.trim().is_empty() {
                log::warn!("{}: {}", self.config.program, stderr.trim_end());
            }
            Ok(())
        } else {
            log::error!("{}: {}", self.config.program, stderr.trim_end());
            Err(CompileError::ToolchainFailed {
                code: output.status.code(),
                stderr: stderr.into_owned(),
            })
        }
    }
}

/// A loaded mask routine. Dropping it unloads the library.
pub struct CompiledMask {
    mask: MaskFn,
    module_id: String,
    // Must outlive `mask`.
    _library: Library,
}

impl std::fmt::Debug for CompiledMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledMask")
            .field("module_id", &self.module_id)
            .finish_non_exhaustive()
    }
}

impl CompiledMask {
    /// Identifier of the module this mask was compiled from.
    pub fn module_id(&self) -> &str {
        &self.module_id
    }
}

impl MaskFunction for CompiledMask {
    fn evaluate(&self, x: f64, y: f64, z: f64) -> i32 {
        let mut is_in_lattice: i32 = 0;
        // SAFETY: the symbol was resolved with the signature gfortran emits for
        // the mask subroutine, and `_library` keeps the code mapped.
        unsafe { (self.mask)(&mut is_in_lattice, &x, &y, &z) };
        is_in_lattice
    }
}

/// Returns a new `module_<hex>` identifier, unique per call.
pub fn fresh_module_id() -> String {
    format!("module_{}", uuid::Uuid::new_v4().simple())
}

/// Symbol gfortran emits for a module procedure.
pub fn mask_symbol(module_id: &str) -> String {
    format!(
        "__{}_MOD_{}",
        module_id.to_ascii_lowercase(),
        MASK_ROUTINE_NAME
    )
}

/// Removes the per-attempt build directory on every exit path.
struct BuildDirGuard(PathBuf);

impl Drop for BuildDirGuard {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.0) {
            log::warn!("Cannot remove build directory {}: {err}", self.0.display());
        }
    }
}

/// Builds `source` and loads its mask routine.
///
/// # Arguments
///
/// * `toolchain` - Compiler to run
/// * `build_root` - Parent of the per-attempt build directories
/// * `source` - Module source, generated with `module_id` as its name
/// * `module_id` - Identifier from [`fresh_module_id`]; also names the build directory
/// * `preset` - Preset name, used for the source file name only
///
/// # Returns
///
/// A handle to the loaded routine. The build directory is gone by the time
/// this returns, whatever the outcome.
pub fn compile_mask(
    toolchain: &dyn Toolchain,
    build_root: &Path,
    source: &str,
    module_id: &str,
    preset: &str,
) -> Result<CompiledMask, CompileError> {
    let build_dir = build_root.join(module_id);
    std::fs::create_dir_all(&build_dir).map_err(|source| CompileError::BuildDir {
        path: build_dir.clone(),
        source,
    })?;
    let _guard = BuildDirGuard(build_dir.clone());

    let request = BuildRequest {
        source: source.to_string(),
        module_id: module_id.to_string(),
        source_path: build_dir.join(format!("mod_{}.f90", file_stem(preset))),
        artifact: build_dir.join(libloading::library_filename(module_id)),
        build_dir,
    };
    toolchain.build(&request)?;

    if !request.artifact.is_file() {
        return Err(CompileError::MissingArtifact(request.artifact));
    }

    let library = unsafe { Library::new(&request.artifact) }.map_err(|source| {
        CompileError::Load {
            path: request.artifact.clone(),
            source,
        }
    })?;

    let symbol = mask_symbol(module_id);
    let mask: MaskFn = unsafe {
        *library
            .get::<MaskFn>(symbol.as_bytes())
            .map_err(|source| CompileError::MissingSymbol {
                symbol: symbol.clone(),
                source,
            })?
    };

    log::info!("Loaded {symbol} from {}", request.artifact.display());
    Ok(CompiledMask {
        mask,
        module_id: module_id.to_string(),
        _library: library,
    })
}

/// Preset names are free text; keep file names portable.
fn file_stem(preset: &str) -> String {
    let stem: String = preset
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "unnamed".to_string()
    } else {
        stem
    }
}
