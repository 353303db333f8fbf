//! Startup configuration: preset file location, compiler and enumeration limits.
//!
//! Defaults can be overridden with environment variables, and the first
//! command-line argument, when given, names the presets file.

use std::path::PathBuf;

use crate::compiler::CompilerConfig;
use crate::session::PipelineConfig;

/// Environment variable naming the presets file.
pub const ENV_PRESETS: &str = "LATTICE_VIEWER_PRESETS";
/// Environment variable naming the Fortran compiler.
pub const ENV_COMPILER: &str = "LATTICE_VIEWER_FC";
/// Environment variable with whitespace-separated compiler flags.
pub const ENV_FLAGS: &str = "LATTICE_VIEWER_FFLAGS";
/// Environment variable naming the build root.
pub const ENV_BUILD_DIR: &str = "LATTICE_VIEWER_BUILD_DIR";
/// Environment variable with the enumeration limit.
pub const ENV_MAX_PAIRS: &str = "LATTICE_VIEWER_MAX_PAIRS";

/// Everything the application needs before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// JSON file holding all presets
    pub presets_path: PathBuf,
    /// Compiler invocation
    pub compiler: CompilerConfig,
    /// Build location and enumeration limit
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            presets_path: PathBuf::from("presets.json"),
            compiler: CompilerConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment and command line.
    pub fn from_env() -> Self {
        let mut config = Self::from_vars(|key| std::env::var(key).ok());
        if let Some(path) = std::env::args_os().nth(1) {
            config.presets_path = PathBuf::from(path);
        }
        config
    }

    /// Applies overrides from `lookup` on top of the defaults.
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty(ENV_PRESETS) {
            config.presets_path = PathBuf::from(path);
        }
        if let Some(program) = non_empty(ENV_COMPILER) {
            config.compiler.program = program.trim().to_string();
        }
        if let Some(flags) = lookup(ENV_FLAGS) {
            config.compiler.flags = flags.split_whitespace().map(str::to_string).collect();
        }
        if let Some(dir) = non_empty(ENV_BUILD_DIR) {
            config.pipeline.build_root = PathBuf::from(dir);
        }
        if let Some(limit) = non_empty(ENV_MAX_PAIRS) {
            match limit.trim().parse::<u64>() {
                Ok(limit) if limit > 0 => config.pipeline.max_index_pairs = limit,
                _ => log::warn!("Ignoring {ENV_MAX_PAIRS}={limit}: expected a positive integer"),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MAX_INDEX_PAIRS;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]);
        assert_eq!(config.presets_path, PathBuf::from("presets.json"));
        assert_eq!(config.compiler.program, "gfortran");
        assert_eq!(config.pipeline.max_index_pairs, DEFAULT_MAX_INDEX_PAIRS);
        assert!(config.pipeline.build_root.ends_with("lattice-viewer"));
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            (ENV_PRESETS, "/tmp/p.json"),
            (ENV_COMPILER, "gfortran-13"),
            (ENV_FLAGS, "-shared  -fPIC -O3"),
            (ENV_BUILD_DIR, "/tmp/build"),
            (ENV_MAX_PAIRS, "1000"),
        ]);
        assert_eq!(config.presets_path, PathBuf::from("/tmp/p.json"));
        assert_eq!(config.compiler.program, "gfortran-13");
        assert_eq!(config.compiler.flags, vec!["-shared", "-fPIC", "-O3"]);
        assert_eq!(config.pipeline.build_root, PathBuf::from("/tmp/build"));
        assert_eq!(config.pipeline.max_index_pairs, 1000);
    }

    #[test]
    fn test_invalid_limit_is_ignored() {
        for bad in ["zero", "0", "-5"] {
            let config = from_map(&[(ENV_MAX_PAIRS, bad)]);
            assert_eq!(config.pipeline.max_index_pairs, DEFAULT_MAX_INDEX_PAIRS);
        }
    }
}
