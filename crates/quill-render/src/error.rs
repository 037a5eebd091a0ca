use std::path::PathBuf;

use thiserror::Error;

/// Shader stage identifier used in compile diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Error taxonomy for the rendering library.
///
/// Operations return a specific error kind and never abort the process;
/// the host application decides whether a given failure is fatal.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Caller-supplied input was null-like or out of range.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A shader stage failed to compile.
    ///
    /// Carries the compiler's rendered diagnostic for the failing stage.
    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    ShaderCompile {
        stage: ShaderStage,
        diagnostic: String,
    },

    /// Stages compiled but do not form a usable program
    /// (missing entry point, interface mismatch, pipeline rejection).
    #[error("shader program link failed: {0}")]
    ShaderLink(String),

    /// A well-known uniform was not found after a successful link.
    #[error("uniform `{name}` not found in shader program")]
    UniformNotFound { name: String },

    /// Texture or buffer setup failed.
    #[error("resource creation failed: {0}")]
    ResourceCreation(String),

    /// The frame arena's fixed capacity was exceeded.
    ///
    /// Emitting more geometry than the configured maximum is a caller
    /// error; it is reported rather than silently corrupting storage.
    #[error("{what} capacity exceeded (maximum {capacity})")]
    BufferOverflow {
        what: &'static str,
        capacity: usize,
    },

    /// A file could not be read.
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
