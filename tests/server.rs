//! HTTP boundary tests: the axum router driven in-process with `oneshot`.

#![cfg(feature = "server")]

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::*;
use docconv::server::router;
use docconv::Converter;
use serde_json::Value;
use std::path::Path;
use tower::ServiceExt;

const BOUNDARY: &str = "docconv-test-boundary";

fn multipart(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(route: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(route)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn app(root: &Path) -> Router {
    router(Converter::new(config_in(root).build().unwrap()))
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn json_body(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let root = tempfile::tempdir().unwrap();
    let resp = app(root.path())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"ok");
}

#[tokio::test]
async fn xlsx_to_csv_returns_attachment() {
    let root = tempfile::tempdir().unwrap();
    let resp = app(root.path())
        .oneshot(upload(
            "/convert/xlsx-to-csv",
            multipart("file", "report.xlsx", &xlsx(&REPORT_ROWS)),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.csv\""
    );
    let text = String::from_utf8(body_bytes(resp).await).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert_eq!(text.lines().next(), Some("name,score"));
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn empty_pdf_is_400_validation_error() {
    let root = tempfile::tempdir().unwrap();
    let resp = app(root.path())
        .oneshot(upload("/convert/pdf-to-docx", multipart("file", "empty.pdf", b"")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["message"], "no file");
}

#[tokio::test]
async fn missing_file_field_is_400() {
    let root = tempfile::tempdir().unwrap();
    let resp = app(root.path())
        .oneshot(upload(
            "/convert/xlsx-to-csv",
            multipart("attachment", "report.xlsx", &xlsx(&REPORT_ROWS)),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["message"], "no file");
}

#[tokio::test]
async fn disallowed_type_is_400() {
    let root = tempfile::tempdir().unwrap();
    let resp = app(root.path())
        .oneshot(upload(
            "/convert/pptx-to-pdf",
            multipart("file", "script.sh", b"#!/bin/sh\n"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["message"], "disallowed type");
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn missing_engine_is_500_environment_error() {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path())
        .engine_program("/nonexistent/docconv-soffice")
        .build()
        .unwrap();
    let resp = router(Converter::new(config))
        .oneshot(upload(
            "/convert/pptx-to-pdf",
            multipart("file", "deck.pptx", b"PK\x03\x04"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "EnvironmentError");
    assert_eq!(body["message"], "conversion engine unavailable");
    assert_eq!(entries(root.path()), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn engine_route_returns_pdf() {
    let root = tempfile::tempdir().unwrap();
    let resp = router(Converter::new(sh_engine(root.path(), FAKE_PDF_ENGINE, 10)))
        .oneshot(upload(
            "/convert/docx-to-pdf",
            multipart("file", "letter.docx", b"PK\x03\x04"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"letter.pdf\""
    );
    assert!(body_bytes(resp).await.starts_with(b"%PDF"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let root = tempfile::tempdir().unwrap();
    let resp = app(root.path())
        .oneshot(upload("/convert/png-to-gif", multipart("file", "a.png", b"x")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
