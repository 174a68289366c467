use adlens::{build_app, AppState, Config};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use clap::Parser;
use serde_json::Value;
use std::{path::Path, sync::Arc, time::Duration};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<html><head>
    <title>Weekend Reading</title>
    <meta name="description" content="Long form essays">
    </head><body>
    <article><p>This article explores trending games and the social side of play.</p></article>
    <p>Another paragraph that is comfortably longer than twenty characters.</p>
    </body></html>"#;

fn app_with(exports: &Path, extra: &[&str]) -> Router {
    let mut args = vec![
        "adlens".to_string(),
        "--gemini-api-key=".to_string(),
        "--fetch-timeout".to_string(),
        "3".to_string(),
        "--exports-dir".to_string(),
        exports.display().to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));

    let config = Config::parse_from(args);
    build_app(Arc::new(AppState::from_config(config).unwrap()))
}

fn app(exports: &Path) -> Router {
    app_with(exports, &[])
}

async fn call(app: &Router, uri: &str) -> (StatusCode, String, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, content_type, body)
}

async fn call_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = call(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn with_url(endpoint: &str, target: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("{}?url={}", endpoint, encoded)
}

async fn page_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blog/weekend"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_invalid_url_answers_200_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = call_json(&app, &with_url("/scrape", "not a url")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);
    assert_eq!(body["error"], "Invalid URL provided");
    assert_eq!(body["metrics"]["impressions"], 0);
    assert_eq!(body["serverStatus"], "online");
}

#[tokio::test]
async fn test_missing_url_answers_200_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = call_json(&app, "/scrape").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Please provide a URL to analyze");
}

#[tokio::test]
async fn test_unreachable_page_still_returns_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = call_json(&app, &with_url("/scrape", "http://127.0.0.1:1/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);
    assert!(body["error"].is_string());
    assert!(!body["data"][0].as_str().unwrap().is_empty());
    assert!(body["metrics"]["impressions"].as_u64().unwrap() > 0);
    assert_eq!(body["cached"], false);
}

#[tokio::test]
async fn test_repeat_scrape_is_cached_and_identical() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());
    let server = page_server().await;
    let target = format!("{}/blog/weekend", server.uri());

    let (_, first) = call_json(&app, &with_url("/scrape", &target)).await;
    let (_, second) = call_json(&app, &with_url("/scrape", &target)).await;

    assert_eq!(first["cached"], false);
    assert_eq!(second["cached"], true);
    assert_eq!(first["metrics"], second["metrics"]);
    assert_eq!(first["analytics"], second["analytics"]);
    assert_eq!(first["analytics"]["category"], "blog");

    let (_, status) = call_json(&app, "/status").await;
    assert_eq!(status["cacheEntries"], 1);
}

#[tokio::test]
async fn test_scrape_over_deadline_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(dir.path(), &["--request-timeout", "1"]);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (status, body) = call_json(&app, &with_url("/scrape", &server.uri())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().contains("Analysis timed out"));
    assert!(!body["data"][0].as_str().unwrap().is_empty());
    assert!(body["metrics"]["impressions"].as_u64().unwrap() > 0);
    assert!(body["metrics"]["ctr"].as_f64().unwrap() > 0.0);
    assert_eq!(body["cached"], false);

    let (_, status) = call_json(&app, "/status").await;
    assert_eq!(status["cacheEntries"], 0);
}

#[tokio::test]
async fn test_csv_export_appends_one_matching_row() {
    let dir = tempfile::tempdir().unwrap();
    let exports = dir.path().join("exports");
    let app = app(&exports);
    let server = page_server().await;
    let target = format!("{}/blog/weekend", server.uri());

    let (status, content_type, body) = call(&app, &with_url("/export-csv", &target)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/csv"));

    let log = std::fs::read_to_string(exports.join("analytics_log.csv")).unwrap();
    let log_lines: Vec<&str> = log.lines().collect();
    assert_eq!(log_lines.len(), 2);
    assert!(log_lines[0].starts_with("timestamp,url,impressions"));

    let body = String::from_utf8(body).unwrap();
    let body_lines: Vec<&str> = body.lines().collect();
    assert_eq!(body_lines, log_lines);
    assert!(body_lines[1].contains(&target));
}

#[tokio::test]
async fn test_pdf_report_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());
    let server = page_server().await;
    let target = format!("{}/blog/weekend", server.uri());

    let (status, content_type, body) = call(&app, &with_url("/generate-report", &target)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/pdf");
    assert!(body.starts_with(b"%PDF"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_export_without_url_is_an_error_payload() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = call_json(&app, "/generate-report").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Please provide a URL to analyze");
}

#[tokio::test]
async fn test_unknown_route_reports_server_running() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = call_json(&app, "/definitely/not/here").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "Server is running");
}

#[tokio::test]
async fn test_status_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (_, status) = call_json(&app, "/status").await;
    assert_eq!(status["status"], "online");
    assert_eq!(status["geminiAPI"], false);
    assert_eq!(status["cacheEntries"], 0);
    assert_eq!(status["cacheTtlSecs"], 3600);
    assert_eq!(status["endpoints"]["scrape"], "/scrape");

    let (_, health) = call_json(&app, "/health").await;
    assert_eq!(health["status"], "online");
    assert!(health["timestamp"].is_string());

    let (_, apis) = call_json(&app, "/api-status").await;
    assert_eq!(apis["apis"]["gemini"], false);
    assert!(apis["apis"]["youtube"].is_boolean());
}
