//! Append-only record of library downloads.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Writes one `[time] ip downloaded name` line per served file.
pub struct DownloadLog {
    path: PathBuf,
    // Serializes appends so lines never interleave
    lock: Mutex<()>,
}

impl DownloadLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, client_ip: &str, file_name: &str) -> std::io::Result<()> {
        let line = format_entry(Local::now(), client_ip, file_name);

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

fn format_entry(at: DateTime<Local>, client_ip: &str, file_name: &str) -> String {
    format!(
        "[{}] {} downloaded {}\n",
        at.format("%Y-%m-%d %H:%M:%S"),
        client_ip,
        file_name
    )
}
