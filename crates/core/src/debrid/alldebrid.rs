//! AllDebrid HTTP client.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DebridConfig;
use crate::descriptor::MagnetReference;
use crate::metrics::DEBRID_CALLS;

use super::types::{DebridError, JobId, JobStatus, LinkEntry, ResolutionClient, ResolvedDownload};

/// `ResolutionClient` backed by the AllDebrid v4 API.
pub struct AllDebridClient {
    client: Client,
    base_url: String,
    api_key: String,
    agent: String,
}

impl AllDebridClient {
    /// Builds a client from configuration.
    pub fn new(config: &DebridConfig) -> Result<Self, DebridError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .build()
            .map_err(|e| DebridError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            agent: config.agent.clone(),
        })
    }

    fn build_url(&self, endpoint: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}/{}?agent={}&apikey={}",
            self.base_url,
            endpoint,
            urlencoding::encode(&self.agent),
            urlencoding::encode(&self.api_key)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Issues a GET and unwraps the `{status, data, error}` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, DebridError> {
        let result = self.call_inner(endpoint, params).await;
        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        DEBRID_CALLS.with_label_values(&[operation, label]).inc();
        result
    }

    async fn call_inner<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, DebridError> {
        let url = self.build_url(endpoint, params);
        debug!(endpoint = endpoint, "Calling AllDebrid");

        let response = self.client.get(&url).send().await?;
        let http_status = response.status();
        let body = response.text().await?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if http_status.is_success() => {
                return Err(DebridError::InvalidResponse(format!(
                    "Failed to parse response: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(DebridError::Transport(format!(
                    "HTTP {}: {}",
                    http_status,
                    body.chars().take(200).collect::<String>()
                )))
            }
        };

        if envelope.status != "success" {
            let error = envelope.error.unwrap_or_default();
            return Err(DebridError::Rejected {
                code: error.code,
                message: error.message,
            });
        }

        envelope
            .data
            .ok_or_else(|| DebridError::InvalidResponse("Missing data field".to_string()))
    }
}

#[async_trait]
impl ResolutionClient for AllDebridClient {
    fn name(&self) -> &str {
        "alldebrid"
    }

    async fn submit(&self, magnet: &MagnetReference) -> Result<JobId, DebridError> {
        let uri = magnet.uri();
        let data: UploadData = self
            .call("submit", "magnet/upload", &[("magnets[]", &uri)])
            .await?;

        let entry = data
            .magnets
            .into_first()
            .ok_or_else(|| DebridError::InvalidResponse("No magnet in upload response".into()))?;

        if let Some(error) = entry.error {
            warn!(magnet = %magnet.display_name(), code = %error.code, "Magnet rejected");
            return Err(DebridError::Rejected {
                code: error.code,
                message: error.message,
            });
        }

        let id = entry
            .id
            .ok_or_else(|| DebridError::InvalidResponse("Upload response has no id".into()))?;
        let job = JobId::new(id.into_string());
        info!(job_id = %job, name = %magnet.display_name(), "Magnet submitted");
        Ok(job)
    }

    async fn status(&self, job: &JobId) -> Result<JobStatus, DebridError> {
        let data: StatusData = self
            .call("status", "magnet/status", &[("id", job.as_str())])
            .await?;

        let magnet = data
            .magnets
            .into_first()
            .ok_or_else(|| DebridError::InvalidResponse("No magnet in status response".into()))?;

        Ok(JobStatus {
            status: magnet.status,
            links: magnet.links,
        })
    }

    async fn unlock(&self, link: &LinkEntry) -> Result<ResolvedDownload, DebridError> {
        let data: UnlockData = self
            .call("unlock", "link/unlock", &[("link", &link.link)])
            .await?;

        let filename = data
            .filename
            .or_else(|| link.filename.clone())
            .ok_or_else(|| DebridError::InvalidResponse("Unlock response has no filename".into()))?;

        Ok(ResolvedDownload {
            url: data.link,
            filename,
            size: data.filesize.filter(|s| *s > 0).unwrap_or(1),
        })
    }
}

// Wire types

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// The service returns either a list or a single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::Many(items) => items.into_iter().next(),
            OneOrMany::One(item) => Some(item),
        }
    }
}

/// Job ids arrive as numbers but are treated as opaque strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadData {
    magnets: OneOrMany<UploadedMagnet>,
}

#[derive(Debug, Deserialize)]
struct UploadedMagnet {
    id: Option<RawId>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    magnets: OneOrMany<MagnetStatus>,
}

#[derive(Debug, Deserialize)]
struct MagnetStatus {
    status: String,
    #[serde(default)]
    links: Vec<LinkEntry>,
}

#[derive(Debug, Deserialize)]
struct UnlockData {
    link: String,
    filename: Option<String>,
    filesize: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: &str) -> AllDebridClient {
        let mut config = DebridConfig::new("secret-key");
        config.base_url = base_url.to_string();
        AllDebridClient::new(&config).unwrap()
    }

    fn magnet() -> MagnetReference {
        let bytes = fixtures::single_file_descriptor("Game [0100ABCD00000000][v0].nsp", 1024);
        crate::descriptor::parse_descriptor("game.torrent", &bytes)
            .unwrap()
            .magnet()
            .unwrap()
    }

    #[test]
    fn test_build_url_encodes_params() {
        let client = client_for("https://api.example.com/v4/");
        let url = client.build_url("link/unlock", &[("link", "https://a.b/c?d=e")]);
        assert_eq!(
            url,
            "https://api.example.com/v4/link/unlock?agent=tinfetch&apikey=secret-key\
             &link=https%3A%2F%2Fa.b%2Fc%3Fd%3De"
        );
    }

    #[tokio::test]
    async fn test_submit_list_form() {
        let router = Router::new().route(
            "/magnet/upload",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("apikey").map(String::as_str), Some("secret-key"));
                assert!(params["magnets[]"].starts_with("magnet:?xt=urn:btih:"));
                Json(json!({"status": "success", "data": {"magnets": [{"id": 4242, "ready": false}]}}))
            }),
        );
        let client = client_for(&spawn(router).await);

        let job = client.submit(&magnet()).await.unwrap();
        assert_eq!(job.as_str(), "4242");
    }

    #[tokio::test]
    async fn test_submit_single_object_form() {
        let router = Router::new().route(
            "/magnet/upload",
            get(|| async { Json(json!({"status": "success", "data": {"magnets": {"id": "77"}}})) }),
        );
        let client = client_for(&spawn(router).await);

        assert_eq!(client.submit(&magnet()).await.unwrap().as_str(), "77");
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let router = Router::new().route(
            "/magnet/upload",
            get(|| async {
                Json(json!({"status": "error", "error": {"code": "AUTH_BAD_APIKEY", "message": "The auth apikey is invalid"}}))
            }),
        );
        let client = client_for(&spawn(router).await);

        let err = client.submit(&magnet()).await.unwrap_err();
        assert!(matches!(err, DebridError::Rejected { ref code, .. } if code == "AUTH_BAD_APIKEY"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_status_ready_with_links() {
        let router = Router::new().route(
            "/magnet/status",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("id").map(String::as_str), Some("4242"));
                Json(json!({
                    "status": "success",
                    "data": {"magnets": {
                        "id": 4242,
                        "status": "Ready",
                        "links": [{"link": "https://share/1", "filename": "Game.nsp", "size": 1024}]
                    }}
                }))
            }),
        );
        let client = client_for(&spawn(router).await);

        let status = client.status(&JobId::new("4242")).await.unwrap();
        assert!(status.is_ready());
        assert_eq!(status.links.len(), 1);
        assert_eq!(status.links[0].filename.as_deref(), Some("Game.nsp"));
    }

    #[tokio::test]
    async fn test_unlock_defaults_size() {
        let router = Router::new().route(
            "/link/unlock",
            get(|| async {
                Json(json!({"status": "success", "data": {"link": "https://dl/Game.nsp", "filename": "Game.nsp"}}))
            }),
        );
        let client = client_for(&spawn(router).await);

        let resolved = client.unlock(&LinkEntry::new("https://share/1")).await.unwrap();
        assert_eq!(resolved.url, "https://dl/Game.nsp");
        assert_eq!(resolved.filename, "Game.nsp");
        assert_eq!(resolved.size, 1);
    }

    #[tokio::test]
    async fn test_non_json_response_is_retryable() {
        let router = Router::new().route(
            "/magnet/status",
            get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let client = client_for(&spawn(router).await);

        let err = client.status(&JobId::new("1")).await.unwrap_err();
        assert!(matches!(err, DebridError::Transport(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let router = Router::new().route(
            "/magnet/status",
            get(|| async { Json(json!({"unexpected": Value::Null})) }),
        );
        let client = client_for(&spawn(router).await);

        let err = client.status(&JobId::new("1")).await.unwrap_err();
        assert!(matches!(err, DebridError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_configured_timeout_applies() {
        let router = Router::new().route(
            "/magnet/status",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"status": "success"}))
            }),
        );
        let mut config = DebridConfig::new("secret-key");
        config.base_url = spawn(router).await;
        config.timeout_secs = 1;
        let client = AllDebridClient::new(&config).unwrap();

        let err = client.status(&JobId::new("1")).await.unwrap_err();
        assert!(matches!(err, DebridError::Timeout));
        assert!(err.is_retryable());
    }
}
