//! Library deduplication by content tag.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::descriptor::ContentTag;

use super::error::LibraryError;

/// Read-only view of the library folder.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of all entries currently in the library folder.
    pub async fn file_names(&self) -> Result<Vec<String>, LibraryError> {
        let list_failed = |e| LibraryError::ListFailed {
            path: self.root.clone(),
            source: e,
        };

        let mut entries = fs::read_dir(&self.root).await.map_err(list_failed)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_failed)? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Returns the first library file whose name contains `tag`,
    /// compared case-insensitively.
    pub async fn find_duplicate(&self, tag: &ContentTag) -> Result<Option<String>, LibraryError> {
        let names = self.file_names().await?;
        let found = names.into_iter().find(|name| tag.is_contained_in(name));
        if let Some(ref name) = found {
            debug!(tag = %tag, file = %name, "Tag already present in library");
        }
        Ok(found)
    }
}
