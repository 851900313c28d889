//! Feed polling and descriptor download.

use futures::StreamExt;
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::metrics::FEED_FETCHES;

use super::index::{parse_anchors, Anchor};

/// Field of the anchor text holding the descriptor name.
const NAME_FIELD: usize = 2;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Invalid feed URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Copies matching descriptors from a remote index into the watch folder.
pub struct FeedFetcher {
    client: Client,
    config: FeedConfig,
    base: Url,
    watch: PathBuf,
}

impl FeedFetcher {
    pub fn new(config: FeedConfig, watch: impl Into<PathBuf>) -> Result<Self, FeedError> {
        let base = Url::parse(&config.url).map_err(|e| FeedError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            config,
            base,
            watch: watch.into(),
        })
    }

    /// Polls the index every `interval_secs` until shutdown.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let interval = Duration::from_secs(self.config.interval_secs);
        info!(url = %self.base, "Feed fetcher started");

        loop {
            let tick = async {
                if let Err(e) = self.fetch_once().await {
                    warn!(error = %e, "Remote fetch error");
                }
                tokio::time::sleep(interval).await;
            };

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Feed fetcher received shutdown signal");
                    break;
                }
                _ = tick => {}
            }
        }

        info!("Feed fetcher stopped");
    }

    /// Fetches the index once and downloads every new matching descriptor.
    ///
    /// Returns the paths written. A failed descriptor download is logged and
    /// skipped; only a failure to read the index itself is an error.
    pub async fn fetch_once(&self) -> Result<Vec<PathBuf>, FeedError> {
        let html = self.get(self.base.clone()).await?.text().await?;
        let mut written = Vec::new();

        for anchor in parse_anchors(&html) {
            let Some(file_name) = self.target_name(&anchor) else {
                continue;
            };
            let target = self.watch.join(&file_name);
            if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                continue;
            }

            let url = match self.base.join(&anchor.href) {
                Ok(url) => url,
                Err(e) => {
                    warn!(href = %anchor.href, error = %e, "Skipping unresolvable link");
                    continue;
                }
            };

            match self.download(url, &target).await {
                Ok(()) => {
                    FEED_FETCHES.with_label_values(&["fetched"]).inc();
                    info!(file = %file_name, "Downloaded remote descriptor");
                    written.push(target);
                }
                Err(e) => {
                    FEED_FETCHES.with_label_values(&["failed"]).inc();
                    warn!(file = %file_name, error = %e, "Remote descriptor download failed");
                }
            }
        }

        Ok(written)
    }

    /// Watch-folder name for an anchor, if the anchor is one of ours.
    fn target_name(&self, anchor: &Anchor) -> Option<String> {
        if !anchor.text.contains(&self.config.id) || !anchor.text.contains(&self.config.key) {
            return None;
        }

        let field = anchor.field(&self.config.separator, NAME_FIELD);
        let name = field.map(|f| f.replace(' ', "_"));
        let name = name
            .as_deref()
            .and_then(|n| Path::new(n).file_name())
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        if name.is_none() {
            debug!(text = %anchor.text, "Anchor text has no usable name field");
        }
        name
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, FeedError> {
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.config.username, Some(&self.config.key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Streams `url` to a temporary name next to `target`, then renames it.
    async fn download(&self, url: Url, target: &Path) -> Result<(), FeedError> {
        let response = self.get(url).await?;

        let mut partial = target.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        let result = write_stream(response, &partial).await;
        let result = match result {
            Ok(()) => tokio::fs::rename(&partial, target)
                .await
                .map_err(|source| FeedError::Io {
                    path: target.to_path_buf(),
                    source,
                }),
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&partial).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %partial.display(), error = %e, "Failed to remove partial descriptor");
                }
            }
        }
        result
    }
}

async fn write_stream(response: reqwest::Response, path: &Path) -> Result<(), FeedError> {
    let io_err = |source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await.map_err(io_err)?;
    }
    file.flush().await.map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{Html, IntoResponse};
    use axum::routing::get;
    use axum::Router;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use tempfile::TempDir;

    const KEY: &str = "k3y";

    fn authorized(headers: &HeaderMap) -> bool {
        let expected = format!("Basic {}", STANDARD.encode(format!("user:{}", KEY)));
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == expected)
            .unwrap_or(false)
    }

    async fn index(headers: HeaderMap) -> axum::response::Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Html(format!(
            r#"<html><body>
            <a href="files/one.torrent">7_&amp;&amp;_{key}_&amp;&amp;_Game One [0100ABCDEF123456][v0].torrent</a>
            <a href="files/two.torrent">8_&amp;&amp;_{key}_&amp;&amp;_Other.torrent</a>
            <a href="files/short.torrent">7_&amp;&amp;_{key}</a>
            <a href="files/missing.torrent">7_&amp;&amp;_{key}_&amp;&amp;_Missing.torrent</a>
            </body></html>"#,
            key = KEY
        ))
        .into_response()
    }

    async fn file(headers: HeaderMap) -> axum::response::Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        b"d4:infod6:lengthi1e4:name1:aee".to_vec().into_response()
    }

    async fn spawn() -> String {
        let router = Router::new()
            .route("/", get(index))
            .route("/files/one.torrent", get(file))
            .route("/files/two.torrent", get(file));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn config(url: String, key: &str) -> FeedConfig {
        FeedConfig {
            url,
            username: "user".to_string(),
            key: key.to_string(),
            id: "7".to_string(),
            interval_secs: 30,
            separator: "_&&_".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_matching_descriptors() {
        let url = spawn().await;
        let watch = TempDir::new().unwrap();
        let fetcher = FeedFetcher::new(config(url, KEY), watch.path()).unwrap();

        let written = fetcher.fetch_once().await.unwrap();

        let expected = watch
            .path()
            .join("Game_One_[0100ABCDEF123456][v0].torrent");
        assert_eq!(written, vec![expected.clone()]);
        assert_eq!(
            std::fs::read(&expected).unwrap(),
            b"d4:infod6:lengthi1e4:name1:aee"
        );
        assert!(!watch.path().join("Missing.torrent").exists());
        assert!(!watch.path().join("Missing.torrent.part").exists());
    }

    #[tokio::test]
    async fn test_existing_file_not_refetched() {
        let url = spawn().await;
        let watch = TempDir::new().unwrap();
        let existing = watch.path().join("Game_One_[0100ABCDEF123456][v0].torrent");
        std::fs::write(&existing, b"local").unwrap();
        let fetcher = FeedFetcher::new(config(url, KEY), watch.path()).unwrap();

        let written = fetcher.fetch_once().await.unwrap();

        assert!(written.is_empty());
        assert_eq!(std::fs::read(&existing).unwrap(), b"local");
    }

    #[tokio::test]
    async fn test_bad_credentials_fail_index() {
        let url = spawn().await;
        let watch = TempDir::new().unwrap();
        let fetcher = FeedFetcher::new(config(url, "wrong"), watch.path()).unwrap();

        let err = fetcher.fetch_once().await.unwrap_err();
        assert!(matches!(err, FeedError::HttpStatus { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_failed_rename_removes_partial() {
        let url = spawn().await;
        let watch = TempDir::new().unwrap();
        let fetcher = FeedFetcher::new(config(url, KEY), watch.path()).unwrap();
        let target = watch.path().join("occupied.torrent");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let file_url = fetcher.base.join("files/one.torrent").unwrap();
        let err = fetcher.download(file_url, &target).await.unwrap_err();

        assert!(matches!(err, FeedError::Io { .. }));
        assert!(!watch.path().join("occupied.torrent.part").exists());
        assert!(target.join("keep").exists());
    }

    #[test]
    fn test_invalid_url() {
        let result = FeedFetcher::new(config("not a url".into(), KEY), "/tmp");
        assert!(matches!(result, Err(FeedError::InvalidUrl { .. })));
    }
}
