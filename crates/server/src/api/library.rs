//! Library listing and file download handlers.

use axum::{
    body::Body,
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{info, warn};

use crate::metrics::LIBRARY_DOWNLOADS_TOTAL;
use crate::state::AppState;

/// HTML index of the regular files in the library.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, StatusCode> {
    let mut entries = tokio::fs::read_dir(state.library_dir()).await.map_err(|e| {
        warn!(error = %e, "Failed to list library");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    Ok(Html(render_index(&names)))
}

fn render_index(names: &[String]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Library</title></head>\n<body>\n<h1>Library</h1>\n<ul>\n",
    );
    for name in names {
        html.push_str(&format!(
            "<li><a href=\"/files/{}\">{}</a></li>\n",
            urlencoding::encode(name),
            escape_html(name)
        ));
    }
    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Streams one library file as an attachment and records the download.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    request: Request<Body>,
) -> Response {
    let Some(path) = state.library_file(&name) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return StatusCode::NOT_FOUND.into_response();
    }

    let client_ip = client_ip(&request);

    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };
    if !response.status().is_success() {
        return response;
    }

    if let Ok(value) = HeaderValue::from_str(&format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&name)
    )) {
        response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }

    LIBRARY_DOWNLOADS_TOTAL.inc();
    info!(file = %name, client = %client_ip, "Serving library file");
    if let Err(e) = state.download_log().record(&client_ip, &name).await {
        warn!(path = %state.download_log().path().display(), error = %e, "Failed to write download log");
    }

    response
}

/// First `X-Forwarded-For` hop, else the peer address.
fn client_ip(request: &Request<Body>) -> String {
    forwarded_for(request.headers())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_index_escapes() {
        let html = render_index(&["a<b>.nsp".to_string(), "Game [v0].nsp".to_string()]);
        assert!(html.contains("<a href=\"/files/a%3Cb%3E.nsp\">a&lt;b&gt;.nsp</a>"));
        assert!(html.contains("href=\"/files/Game%20%5Bv0%5D.nsp\""));
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(forwarded_for(&headers).as_deref(), Some("203.0.113.7"));

        assert_eq!(forwarded_for(&HeaderMap::new()), None);
    }
}
