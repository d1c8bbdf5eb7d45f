//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;
use ugenic_core::GraphError;
use ugenic_registry::RegistryError;

/// Errors that can occur while loading, saving or building a graph description.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Two controls or nodes share an id
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// A node argument names an id that is not defined before it
    #[error("node '{node}' references unknown id '{reference}'")]
    UnknownReference {
        /// Node holding the reference.
        node: String,
        /// The id that could not be resolved.
        reference: String,
    },

    /// No registry entry for a node's kind
    #[error("node '{node}' has unknown kind '{kind}'")]
    UnknownKind {
        /// Node id.
        node: String,
        /// Requested kind.
        kind: String,
    },

    /// The registry could not construct a node
    #[error("node '{node}': {source}")]
    Registry {
        /// Node id.
        node: String,
        /// Registry failure.
        #[source]
        source: RegistryError,
    },

    /// A control could not be created
    #[error("control '{control}': {source}")]
    Graph {
        /// Control name.
        control: String,
        /// Why creation failed.
        #[source]
        source: GraphError,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a directory creation error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an unknown reference error.
    pub fn unknown_reference(node: &str, reference: &str) -> Self {
        ConfigError::UnknownReference {
            node: node.to_owned(),
            reference: reference.to_owned(),
        }
    }
}
