//! Error types for synth-definition lowering.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while writing synth definitions.
#[derive(Debug, Error)]
pub enum SynthDefError {
    /// A definition or node name does not fit a one-byte length prefix.
    #[error("name '{0}' is longer than 255 bytes")]
    NameTooLong(String),

    /// A table exceeds what its count field can hold.
    #[error("{what} count {count} exceeds the format limit")]
    TooMany {
        /// What is being counted.
        what: &'static str,
        /// The count.
        count: usize,
    },

    /// Writing the definition file failed.
    #[error("failed to write {path}: {source}")]
    WriteFile {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The output stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthDefError {
    /// Create a file write error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SynthDefError::WriteFile {
            path: path.into(),
            source,
        }
    }
}
