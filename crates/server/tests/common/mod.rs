//! In-process library server fixture.
//!
//! Builds the router over a temporary library folder and drives it with
//! `oneshot`, so no socket is bound.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use base64::Engine;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use tinfetch_core::{
    create_authenticator, AuthConfig, AuthMethod, Authenticator, Config, DebridConfig,
    FoldersConfig, LibraryServerConfig,
};
use tinfetch_server::{api::create_router, download_log::DownloadLog, state::AppState};

pub const USER: &str = "tinfoil";
pub const PASSWORD: &str = "roms123";

pub struct TestFixture {
    pub router: Router,
    pub temp_dir: TempDir,
    pub config: Arc<Config>,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response is not JSON")
    }
}

impl TestFixture {
    /// Server without authentication.
    pub fn new() -> Self {
        Self::with_auth(AuthConfig::default())
    }

    /// Server protected by basic auth with [`USER`] / [`PASSWORD`].
    pub fn with_basic_auth() -> Self {
        Self::with_auth(AuthConfig {
            method: AuthMethod::Basic,
            username: Some(USER.to_string()),
            password: Some(PASSWORD.to_string()),
        })
    }

    pub fn with_auth(auth: AuthConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let folders = FoldersConfig::under(temp_dir.path());
        for dir in folders.all() {
            std::fs::create_dir_all(dir).expect("Failed to create folder");
        }

        let server = LibraryServerConfig {
            auth: auth.clone(),
            download_log: temp_dir.path().join("download.log"),
            ..Default::default()
        };
        let config = Arc::new(Config {
            folders,
            debrid: DebridConfig::new("secret-debrid-key"),
            pipeline: Default::default(),
            downloader: Default::default(),
            library_server: Some(server.clone()),
            feed: None,
            logging: Default::default(),
        });

        let authenticator: Arc<dyn Authenticator> =
            Arc::from(create_authenticator(&auth).expect("Failed to create authenticator"));
        let state = Arc::new(AppState::new(
            Arc::clone(&config),
            authenticator,
            DownloadLog::new(server.download_log),
        ));

        Self {
            router: create_router(state),
            temp_dir,
            config,
        }
    }

    pub fn library(&self) -> &Path {
        &self.config.folders.library
    }

    pub fn add_library_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.library().join(name);
        std::fs::write(&path, content).expect("Failed to write library file");
        path
    }

    pub fn download_log(&self) -> String {
        std::fs::read_to_string(self.temp_dir.path().join("download.log")).unwrap_or_default()
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::builder().uri(path)).await
    }

    pub async fn get_as(&self, path: &str, user: &str, password: &str) -> TestResponse {
        self.send(
            Request::builder()
                .uri(path)
                .header(header::AUTHORIZATION, basic_header(user, password)),
        )
        .await
    }

    pub async fn send(&self, builder: axum::http::request::Builder) -> TestResponse {
        let request = builder.body(Body::empty()).expect("Failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub fn basic_header(user: &str, password: &str) -> String {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
    format!("Basic {token}")
}
