//! Error types for persistence operations.

use std::path::PathBuf;
use thiserror::Error;

use matriz_core::RouterError;

/// Errors that can occur while persisting or restoring routing state.
#[derive(Debug, Error)]
pub enum BankError {
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

    /// Failed to encode or decode the opaque state block
    #[error("failed to encode/decode state block: {0}")]
    State(#[from] serde_json::Error),

    /// A stored connection points outside its declared matrix dimensions
    #[error(
        "stored connection ({source_channel}, {destination_channel}) outside \
         declared dimensions {sources}x{destinations}"
    )]
    CellOutOfRange {
        /// Source channel of the corrupt connection.
        source_channel: usize,
        /// Destination channel of the corrupt connection.
        destination_channel: usize,
        /// Declared source count.
        sources: usize,
        /// Declared destination count.
        destinations: usize,
    },

    /// A stored current-program index points outside the stored bank
    #[error("stored current program {index} outside bank of {len} programs")]
    CurrentOutOfRange {
        /// The corrupt index.
        index: usize,
        /// The stored bank length.
        len: usize,
    },

    /// The router rejected the restored state
    #[error("router rejected restored state: {0}")]
    Router(#[from] RouterError),
}

impl BankError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BankError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BankError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BankError::CreateDir {
            path: path.into(),
            source,
        }
    }
}
