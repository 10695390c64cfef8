//! Error types for the engine and the query pipeline.
//!
//! Only recoverable failures live here. Broken engine preconditions, such as
//! an out-of-range vertex id handed to the accumulator, panic instead.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while loading, running or saving a graph computation.
#[derive(Debug, Error)]
pub enum PregelError {
    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An input file contained a line that could not be understood.
    #[error("parse error in {} line {line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The engine was started on a graph that was never finalized.
    #[error("graph must be finalized before it is queried")]
    NotFinalized,

    /// The engine's accumulator was sized for a different graph.
    #[error("engine sized for {expected} vertices but the graph has {actual}")]
    VertexCountMismatch { expected: usize, actual: usize },

    /// A snapshot file is structurally invalid.
    #[error("snapshot error: {reason}")]
    Snapshot { reason: String },
}

impl PregelError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        PregelError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PregelError>;
