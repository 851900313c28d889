pub mod auth;
pub mod config;
pub mod debrid;
pub mod descriptor;
pub mod downloader;
pub mod feed;
pub mod library;
pub mod metrics;
pub mod pipeline;
pub mod testing;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, BasicAuthenticator, Identity,
    NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, DebridConfig, DownloaderConfig, FeedConfig, FoldersConfig, LibraryServerConfig,
    LoggingConfig, PipelineConfig, SanitizedConfig,
};
pub use debrid::{
    poll_until_ready, AllDebridClient, DebridError, JobId, JobStatus, LinkEntry, PollOutcome,
    ResolutionClient, ResolvedDownload, RetryPolicy,
};
pub use descriptor::{parse_descriptor, ContentTag, Descriptor, DescriptorError, MagnetReference};
pub use downloader::{DownloadError, DownloadedFile, Downloader, HttpDownloader};
pub use feed::{FeedError, FeedFetcher};
pub use library::{Disposition, FileRouter, Library, LibraryError};
pub use pipeline::{DescriptorReport, DescriptorState, LinkOutcome, PipelineDriver, PipelineError};
