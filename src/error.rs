//! Error types for every stage of the compile-and-render pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Why a scalar literal could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralErrorKind {
    /// The text was blank
    Empty,
    /// The text does not match any supported literal syntax
    InvalidSyntax,
    /// An integer literal does not fit in 64 bits
    IntegerOverflow,
    /// A floating-point literal evaluated to infinity or NaN
    NonFinite,
}

/// A scalar parameter value that is not a supported literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse `{text}` as a literal: {}", describe(.kind))]
pub struct LiteralError {
    /// The offending text, as typed
    pub text: String,
    /// Reason for the failure
    pub kind: LiteralErrorKind,
}

fn describe(kind: &LiteralErrorKind) -> &'static str {
    match kind {
        LiteralErrorKind::Empty => "value is empty",
        LiteralErrorKind::InvalidSyntax => {
            "expected an integer, float, boolean or complex literal"
        }
        LiteralErrorKind::IntegerOverflow => "integer does not fit in 64 bits",
        LiteralErrorKind::NonFinite => "value is not finite",
    }
}

impl LiteralError {
    pub(crate) fn new(text: &str, kind: LiteralErrorKind) -> Self {
        Self {
            text: text.to_string(),
            kind,
        }
    }
}

/// Source generation failures. All of them are raised before any output is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    /// Compilation was requested without a preset name
    #[error("no preset defined; create a new preset before compiling")]
    MissingPresetName,

    /// A parameter row has only one of name and value
    #[error("missing name or value for property {position}")]
    InvalidParameter {
        /// 1-based row of the offending parameter
        position: usize,
    },

    /// The unit cell is empty
    #[error("lattice has no unit-cell sites")]
    NoSites,

    /// A parameter value is not a literal
    #[error("cannot generate constant `{name}`: {source}")]
    Literal {
        /// Parameter name
        name: String,
        /// Parse failure
        #[source]
        source: LiteralError,
    },
}

impl CodegenError {
    /// True for errors caused by incomplete input rather than bad literal text.
    pub fn is_validation(&self) -> bool {
        !matches!(self, CodegenError::Literal { .. })
    }
}

/// Failures while building or loading a compiled mask.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The per-attempt build directory could not be written
    #[error("cannot prepare build directory {path}: {source}")]
    BuildDir {
        /// Directory or file being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The compiler executable could not be started
    #[error("cannot launch compiler `{program}`: {source}")]
    Launch {
        /// Compiler program name
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The compiler ran and reported failure
    #[error("compiler exited with {}; check the log for output\n{stderr}", exit_label(.code))]
    ToolchainFailed {
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Captured diagnostics
        stderr: String,
    },

    /// The compiler succeeded without producing the shared library
    #[error("compiler reported success but produced no library at {0}")]
    MissingArtifact(PathBuf),

    /// The shared library could not be loaded
    #[error("cannot load compiled library {path}: {source}")]
    Load {
        /// Library path
        path: PathBuf,
        /// Loader error
        #[source]
        source: libloading::Error,
    },

    /// The library does not export the mask routine
    #[error("compiled library has no `{symbol}` entry point: {source}")]
    MissingSymbol {
        /// Mangled symbol that was looked up
        symbol: String,
        /// Loader error
        #[source]
        source: libloading::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Preset file failures.
#[derive(Debug, Error)]
pub enum PresetError {
    /// The file exists but cannot be read
    #[error("cannot read presets file {path}: {source}")]
    Read {
        /// Presets file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file cannot be written
    #[error("cannot write presets file {path}: {source}")]
    Write {
        /// Presets file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON of the expected shape
    #[error("presets file {path} is not valid JSON: {source}")]
    Parse {
        /// Presets file
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// A preset blob does not match the requested type
    #[error("cannot convert preset `{category}/{name}`: {source}")]
    Convert {
        /// Preset category
        category: String,
        /// Preset name
        name: String,
        /// Conversion error
        #[source]
        source: serde_json::Error,
    },
}

/// Enumeration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LatticeError {
    /// The index range exceeds the enumeration budget
    #[error("window spans {pairs} index pairs, more than the limit of {limit}; shrink the window or enlarge the basis vectors")]
    RangeTooLarge {
        /// Index pairs the window would need
        pairs: u64,
        /// Configured maximum
        limit: u64,
    },
}

/// Everything that can go wrong during a compile action.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source generation failed
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// Building or loading failed
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Enumeration refused the window
    #[error(transparent)]
    Lattice(#[from] LatticeError),

    /// Anything else, such as a panic inside the mask
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl PipelineError {
    /// True for missing names, values or presets.
    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Codegen(e) if e.is_validation())
    }

    /// Short dialog title for this class of failure.
    pub fn title(&self) -> &'static str {
        match self {
            PipelineError::Codegen(CodegenError::MissingPresetName) => "No preset",
            PipelineError::Codegen(CodegenError::Literal { .. }) => "Cannot parse source code",
            PipelineError::Codegen(_) => "Invalid property",
            PipelineError::Compile(_) => "Cannot compile Fortran code",
            PipelineError::Lattice(_) => "Cannot generate lattice",
            PipelineError::Unexpected(_) => "Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_error_message_contains_text() {
        let err = LiteralError::new("1+", LiteralErrorKind::InvalidSyntax);
        let msg = err.to_string();
        assert!(msg.contains("`1+`"));
        assert!(msg.contains("expected an integer"));
    }

    #[test]
    fn test_invalid_parameter_message_uses_position() {
        let err = CodegenError::InvalidParameter { position: 3 };
        assert_eq!(err.to_string(), "missing name or value for property 3");
        assert!(err.is_validation());
    }

    #[test]
    fn test_pipeline_error_classification() {
        let validation: PipelineError = CodegenError::MissingPresetName.into();
        assert!(validation.is_validation());
        assert_eq!(validation.title(), "No preset");

        let literal: PipelineError = CodegenError::Literal {
            name: "a".into(),
            source: LiteralError::new("x", LiteralErrorKind::InvalidSyntax),
        }
        .into();
        assert!(!literal.is_validation());
        assert_eq!(literal.title(), "Cannot parse source code");

        let compile: PipelineError = CompileError::ToolchainFailed {
            code: Some(1),
            stderr: "Error: syntax".into(),
        }
        .into();
        assert!(!compile.is_validation());
        assert!(compile.to_string().contains("status 1"));
    }
}
