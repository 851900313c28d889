use std::path::{Path, PathBuf};
use std::sync::Arc;
use tinfetch_core::{Authenticator, Config, SanitizedConfig};

use crate::download_log::DownloadLog;

/// Shared application state
pub struct AppState {
    config: Arc<Config>,
    authenticator: Arc<dyn Authenticator>,
    download_log: DownloadLog,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        authenticator: Arc<dyn Authenticator>,
        download_log: DownloadLog,
    ) -> Self {
        Self {
            config,
            authenticator,
            download_log,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(self.config.as_ref())
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Folder whose files are served.
    pub fn library_dir(&self) -> &Path {
        &self.config.folders.library
    }

    /// Path of a library entry, if `name` is a plain file name.
    pub fn library_file(&self, name: &str) -> Option<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        plain.then(|| self.library_dir().join(name))
    }

    pub fn download_log(&self) -> &DownloadLog {
        &self.download_log
    }
}
