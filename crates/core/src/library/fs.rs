//! File moves that survive crossing filesystems.

use std::path::Path;
use tokio::fs;

use super::error::LibraryError;

/// Attempts to move a file atomically (rename).
///
/// Returns `Ok(false)` when the rename crosses devices and a copy is needed.
async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(true),
        Err(e) => {
            // Cross-filesystem moves fail with EXDEV (18 on Linux)
            if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                Ok(false)
            } else {
                Err(e)
            }
        }
    }
}

/// Moves `source` to `destination`, falling back to copy + delete.
pub async fn move_file(source: &Path, destination: &Path) -> Result<(), LibraryError> {
    let moved = try_atomic_move(source, destination)
        .await
        .map_err(|e| LibraryError::move_failed(source.to_path_buf(), destination.to_path_buf(), e))?;
    if moved {
        return Ok(());
    }

    fs::copy(source, destination)
        .await
        .map_err(|e| LibraryError::move_failed(source.to_path_buf(), destination.to_path_buf(), e))?;
    fs::remove_file(source)
        .await
        .map_err(|e| LibraryError::RemoveFailed {
            path: source.to_path_buf(),
            source: e,
        })
}
