//! Error types for library operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing the folder layout.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Failed to list a directory.
    #[error("Failed to list directory: {path}")]
    ListFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move/rename file.
    #[error("Failed to move file from {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to delete a file.
    #[error("Failed to remove file: {path}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path has no file name component.
    #[error("Path has no file name: {path}")]
    NoFileName { path: PathBuf },
}

impl LibraryError {
    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }
}
