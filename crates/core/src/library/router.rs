//! Classification and routing of finished downloads.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use super::error::LibraryError;
use super::fs::move_file;

/// What happens to a downloaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Recognized format, moved into the library.
    Library,
    /// Anything else, deleted.
    Discard,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Library => "library",
            Disposition::Discard => "discarded",
        }
    }
}

/// Where a routed file ended up.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedFile {
    pub disposition: Disposition,
    /// Final location for library files; `None` when discarded.
    pub path: Option<PathBuf>,
}

/// Moves finished downloads and processed descriptors to their final place.
#[derive(Debug, Clone)]
pub struct FileRouter {
    library: PathBuf,
    complete: PathBuf,
    extensions: Vec<String>,
}

impl FileRouter {
    /// `extensions` are matched case-insensitively, with or without a leading dot.
    pub fn new(library: impl Into<PathBuf>, complete: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            library: library.into(),
            complete: complete.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Decides the disposition of a file by its extension.
    pub fn classify(&self, path: &Path) -> Disposition {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        match extension {
            Some(ext) if self.extensions.iter().any(|known| *known == ext) => Disposition::Library,
            _ => Disposition::Discard,
        }
    }

    /// Moves a downloaded file into the library or deletes it.
    pub async fn route(&self, downloaded: &Path) -> Result<RoutedFile, LibraryError> {
        let file_name = file_name(downloaded)?;

        match self.classify(downloaded) {
            Disposition::Library => {
                let destination = self.library.join(file_name);
                move_file(downloaded, &destination).await?;
                info!(file = %destination.display(), "Moved to library");
                Ok(RoutedFile {
                    disposition: Disposition::Library,
                    path: Some(destination),
                })
            }
            Disposition::Discard => {
                remove(downloaded).await?;
                info!(file = %file_name.to_string_lossy(), "Deleted unrecognized file");
                Ok(RoutedFile {
                    disposition: Disposition::Discard,
                    path: None,
                })
            }
        }
    }

    /// Moves a processed descriptor into the complete folder.
    pub async fn archive_descriptor(&self, descriptor: &Path) -> Result<PathBuf, LibraryError> {
        let destination = self.complete.join(file_name(descriptor)?);
        move_file(descriptor, &destination).await?;
        Ok(destination)
    }

    /// Deletes a descriptor whose content is already in the library.
    pub async fn discard_descriptor(&self, descriptor: &Path) -> Result<(), LibraryError> {
        remove(descriptor).await
    }
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr, LibraryError> {
    path.file_name().ok_or_else(|| LibraryError::NoFileName {
        path: path.to_path_buf(),
    })
}

async fn remove(path: &Path) -> Result<(), LibraryError> {
    fs::remove_file(path)
        .await
        .map_err(|e| LibraryError::RemoveFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Layout {
        _dir: TempDir,
        downloads: PathBuf,
        library: PathBuf,
        complete: PathBuf,
        router: FileRouter,
    }

    fn layout() -> Layout {
        let dir = TempDir::new().unwrap();
        let downloads = dir.path().join("downloads");
        let library = dir.path().join("library");
        let complete = dir.path().join("complete");
        for d in [&downloads, &library, &complete] {
            std::fs::create_dir_all(d).unwrap();
        }
        let extensions: Vec<String> = ["nsp", ".NSZ", "xci", "xcz"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let router = FileRouter::new(&library, &complete, &extensions);
        Layout {
            _dir: dir,
            downloads,
            library,
            complete,
            router,
        }
    }

    #[test]
    fn test_classify() {
        let l = layout();
        assert_eq!(l.router.classify(Path::new("a.nsp")), Disposition::Library);
        assert_eq!(l.router.classify(Path::new("a.NSP")), Disposition::Library);
        assert_eq!(l.router.classify(Path::new("a.nsz")), Disposition::Library);
        assert_eq!(l.router.classify(Path::new("a.zip")), Disposition::Discard);
        assert_eq!(l.router.classify(Path::new("nsp")), Disposition::Discard);
        assert_eq!(l.router.classify(Path::new("a.nsp.txt")), Disposition::Discard);
    }

    #[tokio::test]
    async fn test_route_to_library() {
        let l = layout();
        let file = l.downloads.join("Game [0100ABCDEF123456][v0].nsp");
        std::fs::write(&file, b"rom").unwrap();

        let routed = l.router.route(&file).await.unwrap();

        assert_eq!(routed.disposition, Disposition::Library);
        let dest = l.library.join("Game [0100ABCDEF123456][v0].nsp");
        assert_eq!(routed.path.as_deref(), Some(dest.as_path()));
        assert!(dest.exists());
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_route_discards_unrecognized() {
        let l = layout();
        let file = l.downloads.join("extras.zip");
        std::fs::write(&file, b"zip").unwrap();

        let routed = l.router.route(&file).await.unwrap();

        assert_eq!(routed.disposition, Disposition::Discard);
        assert!(routed.path.is_none());
        assert!(!file.exists());
        assert_eq!(std::fs::read_dir(&l.library).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_archive_descriptor() {
        let l = layout();
        let descriptor = l.downloads.join("game.torrent");
        std::fs::write(&descriptor, b"d4:infodee").unwrap();

        let archived = l.router.archive_descriptor(&descriptor).await.unwrap();

        assert_eq!(archived, l.complete.join("game.torrent"));
        assert!(archived.exists());
        assert!(!descriptor.exists());
    }

    #[tokio::test]
    async fn test_discard_descriptor_missing_file() {
        let l = layout();
        let result = l.router.discard_descriptor(&l.downloads.join("gone.torrent")).await;
        assert!(matches!(result, Err(LibraryError::RemoveFailed { .. })));
    }
}
