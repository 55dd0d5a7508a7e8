mod common;

use axum::{body::Body, http::Request};
use common::*;
use http::StatusCode;
use mycoscan_backend::types::UploadConfig;
use pretty_assertions::assert_eq;
use serde_json::json;

// Happy path tests

#[tokio::test]
async fn test_file_scan_happy_path() {
    let setup = TestSetup::new();

    let response = setup
        .send(scan_request(&[
            Part::text("patient_name", "Maria Santos"),
            Part::text("notes", "yellowing on left hallux"),
            Part::file("image", "hallux.png", "image/png", b"\x89PNG"),
        ]))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["message"], "Scan saved for Maria Santos");

    let scans = setup.scan_store.records().await;
    assert_eq!(scans.len(), 1);
    assert_eq!(body["scan_id"], json!(scans[0].id));
    assert_eq!(scans[0].patient_name, "Maria Santos");
    assert_eq!(scans[0].notes.as_deref(), Some("yellowing on left hallux"));
    assert_eq!(scans[0].image_filename, "hallux.png");
    assert_eq!(scans[0].data, b"\x89PNG".to_vec());
    assert_eq!(scans[0].content_type, "image/png");
    assert!(!scans[0].analyzed);

    // Scans never land in the images table
    assert!(setup.image_store.is_empty().await);
}

#[tokio::test]
async fn test_file_scan_without_notes() {
    let setup = TestSetup::new();

    let response = setup
        .send(scan_request(&[
            Part::file("image", "scan.jpg", "image/jpeg", b"jpg"),
            Part::text("patient_name", "Ana Cruz"),
        ]))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(setup.scan_store.records().await[0].notes, None);
}

#[tokio::test]
async fn test_file_scan_first_field_wins() {
    let setup = TestSetup::new();

    let response = setup
        .send(scan_request(&[
            Part::text("patient_name", "First"),
            Part::text("patient_name", "Second"),
            Part::file("image", "a.png", "image/png", b"a"),
            Part::file("image", "b.png", "image/png", b"b"),
            Part::file("attachment", "c.png", "image/png", b"c"),
        ]))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let scans = setup.scan_store.records().await;
    assert_eq!(scans[0].patient_name, "First");
    assert_eq!(scans[0].data, b"a".to_vec());
}

// Failure tests

#[tokio::test]
async fn test_file_scan_requires_patient_name() {
    let setup = TestSetup::new();

    for parts in [
        vec![Part::file("image", "scan.png", "image/png", b"abc")],
        vec![
            Part::text("patient_name", ""),
            Part::file("image", "scan.png", "image/png", b"abc"),
        ],
    ] {
        let response = setup.send(scan_request(&parts)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_response_body(response).await;
        assert_eq!(body, json!({ "error": "Missing patient name or image" }));
    }

    assert!(setup.scan_store.is_empty().await);
}

#[tokio::test]
async fn test_file_scan_requires_image() {
    let setup = TestSetup::new();

    for parts in [
        vec![Part::text("patient_name", "Maria Santos")],
        vec![
            Part::text("patient_name", "Maria Santos"),
            Part::text("image", "not a file"),
        ],
        vec![
            Part::text("patient_name", "Maria Santos"),
            Part::file("image", "", "image/png", b"abc"),
        ],
    ] {
        let response = setup.send(scan_request(&parts)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    assert!(setup.scan_store.is_empty().await);
}

#[tokio::test]
async fn test_file_scan_with_json_body_fails() {
    let setup = TestSetup::new();

    let request = Request::builder()
        .uri("/api/scans")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"patient_name":"Maria Santos"}"#))
        .unwrap();
    let response = setup.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(setup.scan_store.is_empty().await);
}

#[tokio::test]
async fn test_file_scan_when_storage_fails() {
    let setup = TestSetup::new();
    setup.scan_store.set_failing(true).await;

    let response = setup
        .send(scan_request(&[
            Part::text("patient_name", "Maria Santos"),
            Part::file("image", "scan.png", "image/png", b"abc"),
        ]))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body, json!({ "error": "Failed to save scan." }));
    assert!(setup.scan_store.is_empty().await);
}

#[tokio::test]
async fn test_file_scan_over_limit_is_rejected() {
    let setup = TestSetup::with_upload_config(UploadConfig {
        max_upload_bytes: 16,
    });

    let response = setup
        .send(scan_request(&[
            Part::text("patient_name", "Maria Santos"),
            Part::file("image", "scan.png", "image/png", &[0; 17]),
        ]))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(setup.scan_store.is_empty().await);
}
