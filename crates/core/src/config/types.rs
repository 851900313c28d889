use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::debrid::RetryPolicy;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub folders: FoldersConfig,
    pub debrid: DebridConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub library_server: Option<LibraryServerConfig>,
    #[serde(default)]
    pub feed: Option<FeedConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Folder layout shared by the pipeline, the feed fetcher and the library server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoldersConfig {
    /// Incoming descriptors.
    #[serde(default = "default_watch")]
    pub watch: PathBuf,
    /// Archived descriptors.
    #[serde(default = "default_complete")]
    pub complete: PathBuf,
    /// Download staging area.
    #[serde(default = "default_downloads")]
    pub downloads: PathBuf,
    /// Finished content, served by the library server.
    #[serde(default = "default_library")]
    pub library: PathBuf,
}

impl Default for FoldersConfig {
    fn default() -> Self {
        Self {
            watch: default_watch(),
            complete: default_complete(),
            downloads: default_downloads(),
            library: default_library(),
        }
    }
}

impl FoldersConfig {
    /// Builds a layout with the four default folder names under `root`.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            watch: root.join(default_watch()),
            complete: root.join(default_complete()),
            downloads: root.join(default_downloads()),
            library: root.join(default_library()),
        }
    }

    /// All folders, in creation order.
    pub fn all(&self) -> [&PathBuf; 4] {
        [&self.watch, &self.complete, &self.downloads, &self.library]
    }
}

fn default_watch() -> PathBuf {
    PathBuf::from("watch")
}

fn default_complete() -> PathBuf {
    PathBuf::from("complete")
}

fn default_downloads() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_library() -> PathBuf {
    PathBuf::from("library")
}

/// Resolution service (AllDebrid) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridConfig {
    /// AllDebrid API key
    pub api_key: String,
    /// API base URL
    #[serde(default = "default_debrid_url")]
    pub base_url: String,
    /// Client identifier sent as the `agent` query parameter
    #[serde(default = "default_agent")]
    pub agent: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Job status polling policy
    #[serde(default)]
    pub poll: RetryPolicy,
}

impl DebridConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_debrid_url(),
            agent: default_agent(),
            timeout_secs: default_timeout(),
            poll: RetryPolicy::default(),
        }
    }
}

fn default_debrid_url() -> String {
    "https://api.alldebrid.com/v4".to_string()
}

fn default_agent() -> String {
    "tinfetch".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Watch-folder driver configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// How often to rescan the watch folder (milliseconds).
    #[serde(default = "default_scan_interval")]
    pub scan_interval_ms: u64,
    /// Suffix a file must carry to be picked up.
    #[serde(default = "default_descriptor_extension")]
    pub descriptor_extension: String,
    /// Suffix of descriptors that are never reconsidered.
    #[serde(default = "default_processed_marker")]
    pub processed_marker: String,
}

fn default_scan_interval() -> u64 {
    5000 // 5 seconds
}

fn default_descriptor_extension() -> String {
    ".torrent".to_string()
}

fn default_processed_marker() -> String {
    ".processed.torrent".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: default_scan_interval(),
            descriptor_extension: default_descriptor_extension(),
            processed_marker: default_processed_marker(),
        }
    }
}

impl PipelineConfig {
    /// Whether a watch-folder entry is a candidate for processing.
    pub fn is_candidate(&self, file_name: &str) -> bool {
        file_name.ends_with(&self.descriptor_extension)
            && !file_name.ends_with(&self.processed_marker)
    }
}

/// Downloader and classifier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    /// Write buffer size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Maximum concurrent downloads per job (0 = one per link).
    #[serde(default)]
    pub max_concurrent: usize,
    /// File extensions routed to the library; everything else is deleted.
    #[serde(default = "default_library_extensions")]
    pub library_extensions: Vec<String>,
    /// Overall timeout for one transfer in seconds (0 = none).
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_chunk_size() -> usize {
    8192
}

fn default_library_extensions() -> Vec<String> {
    ["nsp", "nsz", "xci", "xcz"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_concurrent: 0,
            library_extensions: default_library_extensions(),
            timeout_secs: 0,
        }
    }
}

/// Library file server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Append-only log of served files.
    #[serde(default = "default_download_log")]
    pub download_log: PathBuf,
}

impl Default for LibraryServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth: AuthConfig::default(),
            download_log: default_download_log(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    9000
}

fn default_download_log() -> PathBuf {
    PathBuf::from("download.log")
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub method: AuthMethod,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    None,
    Basic,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Basic => "basic",
        }
    }
}

/// Remote feed fetcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// URL of the HTML index listing descriptors.
    pub url: String,
    /// Basic auth user name.
    #[serde(default = "default_feed_user")]
    pub username: String,
    /// Basic auth password; anchors must also contain it.
    pub key: String,
    /// Identifier anchors must contain.
    pub id: String,
    #[serde(default = "default_feed_interval")]
    pub interval_secs: u64,
    /// Field separator inside anchor text.
    #[serde(default = "default_feed_separator")]
    pub separator: String,
}

fn default_feed_user() -> String {
    "user".to_string()
}

fn default_feed_interval() -> u64 {
    30
}

fn default_feed_separator() -> String {
    "_&&_".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Optional file that receives a copy of every log line.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            file: None,
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub folders: FoldersConfig,
    pub debrid: SanitizedDebridConfig,
    pub pipeline: PipelineConfig,
    pub downloader: DownloaderConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_server: Option<SanitizedLibraryServerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<SanitizedFeedConfig>,
}

/// Sanitized debrid config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDebridConfig {
    pub base_url: String,
    pub agent: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub poll: RetryPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLibraryServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub auth_method: String,
    pub download_log: PathBuf,
}

/// Sanitized feed config (key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedFeedConfig {
    pub url: String,
    pub key_configured: bool,
    pub interval_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            folders: config.folders.clone(),
            debrid: SanitizedDebridConfig {
                base_url: config.debrid.base_url.clone(),
                agent: config.debrid.agent.clone(),
                api_key_configured: !config.debrid.api_key.is_empty(),
                timeout_secs: config.debrid.timeout_secs,
                poll: config.debrid.poll.clone(),
            },
            pipeline: config.pipeline.clone(),
            downloader: config.downloader.clone(),
            library_server: config
                .library_server
                .as_ref()
                .map(|s| SanitizedLibraryServerConfig {
                    host: s.host,
                    port: s.port,
                    auth_method: s.auth.method.as_str().to_string(),
                    download_log: s.download_log.clone(),
                }),
            feed: config.feed.as_ref().map(|f| SanitizedFeedConfig {
                url: f.url.clone(),
                key_configured: !f.key.is_empty(),
                interval_secs: f.interval_secs,
            }),
        }
    }
}
