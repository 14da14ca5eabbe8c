//! Router integration tests
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use sectio_core::{Metadata, Pipeline, RawDocument, SectionsConfig, StaticSource};
use sectio_server::{MOBILE_SECTIONS_CONTENT_TYPE, create_router};
use serde_json::Value;
use tower::ServiceExt;

const TID: &str = "c3421381-7109-11e5-ac43-8c7f067c3520";

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("../../tests/fixtures/{}", name)).unwrap()
}

fn document(name: &str, revision: u64) -> RawDocument {
    RawDocument { html: read_fixture(name), revision: Some(revision), tid: Some(TID.to_string()) }
}

fn metadata(name: &str) -> Metadata {
    serde_json::from_str(&read_fixture(name)).unwrap()
}

fn create_test_app() -> Router {
    let source = StaticSource::new()
        .with_document("Foobar", document("foobar.html", 123456), metadata("foobar.json"))
        .with_document("Alliterative_verse", document("history.html", 654321), metadata("history.json"))
        .with_document(
            "User:Alice/Sandbox",
            RawDocument::new("<body><p>Sandbox.</p></body>"),
            Metadata { ns: 2, ..Default::default() },
        )
        .with_document(
            "User:Bob",
            RawDocument::new("<body><p>Bob.</p></body>"),
            Metadata { ns: 2, ..Default::default() },
        )
        .with_failure("Flaky", 503)
        .with_api_failure("guiuser", "Bob", 503);
    let pipeline = Pipeline::new(Arc::new(source), SectionsConfig::default());
    create_router(pipeline, Duration::from_secs(5))
}

async fn get(uri: &str) -> (StatusCode, header::HeaderMap, Value) {
    let response = create_test_app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get("/_health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_mobile_sections() {
    let (status, headers, body) = get("/en.wikipedia.org/v1/page/mobile-sections/Alliterative_verse").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], MOBILE_SECTIONS_CONTENT_TYPE);
    assert_eq!(headers[header::ETAG], format!("\"654321/{TID}\"").as_str());
    assert_eq!(body["lead"]["revision"], "654321");
    assert_eq!(body["remaining"]["sections"].as_array().unwrap().len(), 5);
    assert!(body["lead"]["sections"].is_array());
}

#[tokio::test]
async fn test_mobile_sections_lead() {
    let (status, _, body) = get("/en.wikipedia.org/v1/page/mobile-sections-lead/Foobar").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["normalizedtitle"], "Foobar");
    assert_eq!(body["wikibase_item"], "Q1085");
    assert!(body.get("remaining").is_none());
}

#[tokio::test]
async fn test_mobile_sections_remaining() {
    let (status, headers, body) = get("/en.wikipedia.org/v1/page/mobile-sections-remaining/Alliterative_verse").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key(header::ETAG));
    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections[0]["id"], 1);
    assert_eq!(sections[2]["isReferenceSection"], true);
    assert!(sections[0].get("isReferenceSection").is_none());
}

#[tokio::test]
async fn test_mobile_sections_references() {
    let (status, _, body) = get("/en.wikipedia.org/v1/page/mobile-sections-references/Alliterative_verse").await;
    assert_eq!(status, StatusCode::OK);
    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["line"], "References");
}

#[tokio::test]
async fn test_formatted_lead() {
    let (status, _, body) = get("/en.wikipedia.org/v1/page/formatted-lead/Alliterative_verse").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["intro"].as_str().unwrap().starts_with("<p>In prosody"));
    assert!(body["infobox"].as_str().unwrap().contains("Anglo-Saxon"));
    assert!(body.get("sections").is_none());
}

#[tokio::test]
async fn test_formatted() {
    let (status, _, body) = get("/en.wikipedia.org/v1/page/formatted/Alliterative_verse").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["lead"]["intro"].is_string());
    assert_eq!(body["remaining"]["sections"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_revision_and_tid_paths() {
    let (status, _, _) = get("/en.wikipedia.org/v1/page/mobile-sections-lead/Foobar/123456").await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/en.wikipedia.org/v1/page/mobile-sections-lead/Foobar/123456/{TID}");
    let (status, _, _) = get(&uri).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = get("/en.wikipedia.org/v1/page/mobile-sections-lead/Foobar/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["type"].as_str().unwrap().ends_with("not_found"));
}

#[tokio::test]
async fn test_encoded_subpage_title() {
    let (status, _, body) = get("/en.wikipedia.org/v1/page/mobile-sections-lead/User:Alice%2FSandbox").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["normalizedtitle"], "User:Alice/Sandbox");
    assert!(body.get("userinfo").is_none());
}

#[tokio::test]
async fn test_missing_title() {
    let (status, _, body) = get("/test.wikipedia.org/v1/page/mobile-sections/weoiuyrxcmxn").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["title"], "Not found.");
    assert!(body["detail"].as_str().unwrap().contains("weoiuyrxcmxn"));
}

#[tokio::test]
async fn test_upstream_status_passes_through() {
    let (status, _, body) = get("/en.wikipedia.org/v1/page/mobile-sections/Flaky").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["type"].as_str().unwrap().ends_with("upstream_error"));
}

#[tokio::test]
async fn test_userinfo_failure_fails_lead() {
    let (status, _, body) = get("/en.wikipedia.org/v1/page/mobile-sections-lead/User:Bob").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["type"].as_str().unwrap().ends_with("upstream_error"));
    assert!(body.get("lead").is_none());
}

#[tokio::test]
async fn test_invalid_revision() {
    let (status, _, body) = get("/en.wikipedia.org/v1/page/mobile-sections/Foobar/latest").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("latest"));
}
