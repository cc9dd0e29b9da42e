//! Runtime error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

use modseal_codec::ContentKind;

use crate::assets::AssetError;
use crate::config::ConfigError;

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Which I/O step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoPhase {
    /// Opening or stat-ing the origin
    Open,
    /// Streaming a plain source file
    ReadSource,
    /// Streaming a plain compiled file
    ReadCompiled,
    /// Streaming a sealed file
    ReadProtected,
    /// Writing a dump (placeholder or payload)
    Write,
    /// Seeking back to patch the envelope header
    Reopen,
    /// Flushing and closing the dump
    Close,
}

impl IoPhase {
    /// The read phase matching a stream's classification.
    pub fn reading(kind: ContentKind) -> Self {
        match kind {
            ContentKind::PlainSource => IoPhase::ReadSource,
            ContentKind::PlainCompiled => IoPhase::ReadCompiled,
            ContentKind::Protected => IoPhase::ReadProtected,
        }
    }
}

impl fmt::Display for IoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IoPhase::Open => "open",
            IoPhase::ReadSource => "read source file",
            IoPhase::ReadCompiled => "read compiled file",
            IoPhase::ReadProtected => "read protected file",
            IoPhase::Write => "write",
            IoPhase::Reopen => "rewrite header of",
            IoPhase::Close => "close",
        })
    }
}

/// Errors that can occur while compiling, resolving, running or dumping modules.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The file or asset does not exist
    #[error("cannot find {what} '{path}': {reason}")]
    NotFound {
        what: &'static str,
        path: String,
        reason: String,
    },

    /// I/O failure, tagged with the step that failed
    #[error("cannot {phase} '{}': {source}", .path.display())]
    Io {
        phase: IoPhase,
        path: PathBuf,
        source: io::Error,
    },

    /// The engine rejected the decoded bytes
    #[error("{message}")]
    Format { chunk: String, message: String },

    /// Every searcher reported "not found"
    #[error("module '{module}' not found:{}", .attempts.concat())]
    ResolutionExhausted {
        module: String,
        attempts: Vec<String>,
    },

    /// The host resolver reported a failure of its own
    #[error("host failed to provide module '{module}': {message}")]
    HostCallback { module: String, message: String },

    /// A source was found for the module but could not be loaded
    #[error("error loading module '{module}' from {origin}:\n\t{source}")]
    LoadFailed {
        module: String,
        origin: String,
        source: Box<RuntimeError>,
    },

    /// The engine failed while running a compiled unit
    #[error("runtime error: {message}")]
    Invoke { message: String },

    /// Asset store failure other than a missing asset
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Invalid loader configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RuntimeError {
    pub(crate) fn io(phase: IoPhase, path: impl Into<PathBuf>, source: io::Error) -> Self {
        RuntimeError::Io {
            phase,
            path: path.into(),
            source,
        }
    }

    /// Whether this error means "no such origin" rather than a broken one.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound { .. })
    }
}
