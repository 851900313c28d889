//! Library server behavior over an in-process router.

mod common;

use axum::http::{header, Request, StatusCode};
use common::{basic_header, TestFixture, PASSWORD, USER};

#[tokio::test]
async fn test_index_lists_library_files_sorted() {
    let fixture = TestFixture::new();
    fixture.add_library_file("Zelda [0100000000010000][v0].nsp", b"z");
    fixture.add_library_file("Animal <Crossing>.xci", b"a");
    std::fs::create_dir(fixture.library().join("subdir")).unwrap();

    let response = fixture.get("/").await;
    assert_eq!(response.status, StatusCode::OK);

    let html = response.text();
    let animal = html.find("Animal &lt;Crossing&gt;.xci").expect("escaped name");
    let zelda = html.find("Zelda [0100000000010000][v0].nsp").expect("zelda");
    assert!(animal < zelda);
    assert!(html.contains("href=\"/files/Zelda%20%5B0100000000010000%5D%5Bv0%5D.nsp\""));
    assert!(!html.contains("subdir"));
}

#[tokio::test]
async fn test_download_serves_attachment_and_logs() {
    let fixture = TestFixture::new();
    fixture.add_library_file("Game One.nsp", b"nsp payload");

    let response = fixture
        .send(
            Request::builder()
                .uri("/files/Game%20One.nsp")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"nsp payload");
    assert_eq!(
        response.headers.get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename*=UTF-8''Game%20One.nsp"
    );

    let log = fixture.download_log();
    assert_eq!(log.lines().count(), 1);
    assert!(log.trim_end().ends_with("] 203.0.113.9 downloaded Game One.nsp"));
}

#[tokio::test]
async fn test_download_without_peer_address_logs_unknown() {
    let fixture = TestFixture::new();
    fixture.add_library_file("a.nsp", b"a");

    let response = fixture.get("/files/a.nsp").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(fixture.download_log().contains("] unknown downloaded a.nsp"));
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let fixture = TestFixture::new();

    let response = fixture.get("/files/missing.nsp").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(fixture.download_log().is_empty());
}

#[tokio::test]
async fn test_traversal_is_not_found() {
    let fixture = TestFixture::new();
    std::fs::write(fixture.temp_dir.path().join("secret.txt"), b"secret").unwrap();

    for path in ["/files/..%2Fsecret.txt", "/files/..", "/files/%2E%2E"] {
        let response = fixture.get(path).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{path}");
    }
    assert!(fixture.download_log().is_empty());
}

#[tokio::test]
async fn test_directory_is_not_served() {
    let fixture = TestFixture::new();
    std::fs::create_dir(fixture.library().join("folder")).unwrap();

    let response = fixture.get("/files/folder").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_basic_auth_required() {
    let fixture = TestFixture::with_basic_auth();
    fixture.add_library_file("a.nsp", b"a");

    for path in ["/", "/files/a.nsp", "/config", "/metrics"] {
        let response = fixture.get(path).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(
            response.headers.get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"tinfetch library\""
        );
    }

    let response = fixture.get_as("/files/a.nsp", USER, "wrong").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(fixture.download_log().is_empty());
}

#[tokio::test]
async fn test_basic_auth_accepts_credentials() {
    let fixture = TestFixture::with_basic_auth();
    fixture.add_library_file("a.nsp", b"payload");

    let response = fixture.get_as("/files/a.nsp", USER, PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"payload");

    let response = fixture
        .send(
            Request::builder()
                .uri("/")
                .header(header::AUTHORIZATION, basic_header(USER, PASSWORD)),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_skips_auth() {
    let fixture = TestFixture::with_basic_auth();

    let response = fixture.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::with_basic_auth();

    let response = fixture.get_as("/config", USER, PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);

    let text = response.text();
    assert!(!text.contains("secret-debrid-key"));
    assert!(!text.contains(PASSWORD));

    let json = response.json();
    assert_eq!(json["debrid"]["api_key_configured"], true);
    assert_eq!(json["library_server"]["auth_method"], "basic");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.add_library_file("a.nsp", b"a");
    fixture.get("/files/a.nsp").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);

    let text = response.text();
    assert!(text.contains("tinfetch_http_requests_in_flight"));
    assert!(text.contains("tinfetch_library_downloads_total"));
}
