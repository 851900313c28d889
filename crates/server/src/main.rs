use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tinfetch_core::{
    create_authenticator, load_config, validate_config, AllDebridClient, Authenticator,
    Downloader, FeedFetcher, HttpDownloader, LoggingConfig, PipelineDriver, ResolutionClient,
    SanitizedConfig,
};

use tinfetch_server::api::create_router;
use tinfetch_server::download_log::DownloadLog;
use tinfetch_server::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("tinfetch: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::var("TINFETCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("tinfetch.toml"));

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    init_logging(&config.logging)?;

    let config_json = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config = %config_path.display(),
        config_hash = &config_hash[..16],
        "Starting tinfetch"
    );

    for dir in config.folders.all() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(path = %dir.display(), error = %e, "Failed to create folder");
        }
    }

    let config = Arc::new(config);

    let resolver: Arc<dyn ResolutionClient> = Arc::new(
        AllDebridClient::new(&config.debrid).context("Failed to create AllDebrid client")?,
    );
    let downloader: Arc<dyn Downloader> = Arc::new(
        HttpDownloader::new(&config.downloader).context("Failed to create downloader")?,
    );
    info!(
        watch = %config.folders.watch.display(),
        library = %config.folders.library.display(),
        downloader = downloader.name(),
        "Pipeline configured"
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut tasks = Vec::new();

    let driver = PipelineDriver::new(Arc::clone(&config), resolver, downloader);
    let driver_shutdown = shutdown_tx.subscribe();
    tasks.push(tokio::spawn(async move { driver.run(driver_shutdown).await }));

    if let Some(feed_config) = &config.feed {
        let fetcher = FeedFetcher::new(feed_config.clone(), config.folders.watch.clone())
            .context("Failed to create feed fetcher")?;
        info!(url = %feed_config.url, interval_secs = feed_config.interval_secs, "Feed fetcher enabled");
        let feed_shutdown = shutdown_tx.subscribe();
        tasks.push(tokio::spawn(async move { fetcher.run(feed_shutdown).await }));
    }

    match &config.library_server {
        Some(server_config) => {
            let authenticator: Arc<dyn Authenticator> = Arc::from(
                create_authenticator(&server_config.auth)
                    .context("Failed to create authenticator")?,
            );
            info!(method = authenticator.method_name(), "Library server authentication");

            let state = Arc::new(AppState::new(
                Arc::clone(&config),
                authenticator,
                DownloadLog::new(server_config.download_log.clone()),
            ));
            let app = create_router(state);

            let addr = SocketAddr::new(server_config.host, server_config.port);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind to {}", addr))?;
            info!(%addr, "Library server listening");

            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;
        }
        None => {
            info!("Library server disabled");
            shutdown_signal().await;
        }
    }

    info!("Shutting down");
    let _ = shutdown_tx.send(());
    // In-flight polling and downloads are abandoned, not drained
    for task in &tasks {
        task.abort();
    }
    for task in tasks {
        match task.await {
            Err(e) if e.is_panic() => warn!(error = %e, "Background task panicked"),
            _ => {}
        }
    }
    info!("Stopped");

    Ok(())
}

/// Console output plus an optional append-only log file.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
