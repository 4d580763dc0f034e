//! Integration tests for the upload server's request orchestration.
//!
//! These drive the axum router directly with `tower::ServiceExt::oneshot`
//! — no socket, no OCR engine, no LLM. Every request here is expected to
//! stop at form parsing or validation, so the tests are fully
//! deterministic and run offline.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use image::{DynamicImage, Rgba, RgbaImage};
use img2sum::{router, AppConfig};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "img2sum-test-boundary";

// ── Test helpers ─────────────────────────────────────────────────────────

fn test_router(upload_dir: &std::path::Path) -> axum::Router {
    let config = AppConfig::builder()
        .upload_dir(upload_dir)
        .build()
        .expect("test config should build");
    router(Arc::new(config))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([120, 80, 200, 255]),
    ));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode should succeed");
    buf
}

struct UploadForm<'a> {
    file: Option<(&'a str, &'a str, &'a [u8])>,
    category: Option<&'a str>,
    language: Option<&'a str>,
}

fn multipart_request(form: UploadForm<'_>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();

    if let Some((filename, content_type, bytes)) = form.file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in [("category", form.category), ("language", form.language)] {
        if let Some(value) = value {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                     name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request should build")
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

// ── GET routes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_form_renders() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_router(dir.path())
        .oneshot(Request::get("/upload").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("<form"), "got: {html}");
    assert!(html.contains("name=\"image\""));
    assert!(html.contains("name=\"category\""));
}

#[tokio::test]
async fn upload_page_alias_serves_the_same_form() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_router(dir.path())
        .oneshot(Request::get("/upload-page").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("name=\"image\""));
}

#[tokio::test]
async fn summary_view_shows_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_router(dir.path())
        .oneshot(Request::get("/summary").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("No summary yet"));
}

#[tokio::test]
async fn health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_router(dir.path())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

// ── POST /upload failure paths ───────────────────────────────────────────

#[tokio::test]
async fn post_without_file_rerenders_form_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let request = multipart_request(UploadForm {
        file: None,
        category: Some("nature"),
        language: None,
    });
    let response = test_router(dir.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_string(response).await;
    assert!(html.contains("Select an image to upload."), "got: {html}");
    assert!(html.contains("<form"), "form must be re-rendered");
}

#[tokio::test]
async fn post_disallowed_format_reports_the_allowed_list() {
    let dir = tempfile::tempdir().unwrap();
    let png = png_bytes(500, 500);
    let request = multipart_request(UploadForm {
        file: Some(("photo.bmp", "image/bmp", &png)),
        category: None,
        language: None,
    });
    let response = test_router(dir.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_string(response).await;
    assert!(html.contains("jpeg, png, gif"), "got: {html}");
    // The rejected upload must never reach disk.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn post_undecodable_bytes_is_a_field_error() {
    let dir = tempfile::tempdir().unwrap();
    let request = multipart_request(UploadForm {
        file: Some(("junk.png", "image/png", b"not really a png")),
        category: None,
        language: None,
    });
    let response = test_router(dir.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_string(response).await;
    assert!(html.contains("could not be read as an image"), "got: {html}");
}

#[tokio::test]
async fn post_bad_aspect_ratio_names_the_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let png = png_bytes(600, 150);
    let request = multipart_request(UploadForm {
        file: Some(("wide.png", "image/png", &png)),
        category: None,
        language: None,
    });
    let response = test_router(dir.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_string(response).await;
    assert!(html.contains("aspect ratio"), "got: {html}");
    assert!(html.contains("0.5") && html.contains('2'), "got: {html}");
}

#[tokio::test]
async fn post_disallowed_category_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let png = png_bytes(500, 500);
    let request = multipart_request(UploadForm {
        file: Some(("cat.png", "image/png", &png)),
        category: Some("cars"),
        language: None,
    });
    let response = test_router(dir.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_string(response).await;
    assert!(html.contains("cars"), "got: {html}");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn post_tiny_resolution_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let png = png_bytes(99, 99);
    let request = multipart_request(UploadForm {
        file: Some(("tiny.png", "image/png", &png)),
        category: None,
        language: Some("en"),
    });
    let response = test_router(dir.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_string(response).await.contains("resolution"));
}
