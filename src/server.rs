//! HTTP upload server: the request orchestrator around the pipeline.
//!
//! Routes:
//! - `GET /upload`       — render the upload form
//! - `POST /upload`      — validate → store → OCR → summarize → render
//! - `GET /upload-page`  — the bare form (alias kept for old links)
//! - `GET /summary`      — the summary view in its empty state
//! - `GET /health`       — liveness probe
//!
//! One request is handled start to finish by its handler task; the only
//! state shared between requests is the immutable [`AppConfig`] and the
//! upload directory on disk. Failure handling follows the error taxonomy:
//! validation failures re-render the form with the field error, storage
//! failures re-render it with a non-field error, and OCR/LLM failures
//! render the error page — nothing is process-fatal.

use crate::config::{AppConfig, Language};
use crate::error::Img2SumError;
use crate::output::SummaryOutput;
use crate::pipeline::validate::UploadedImage;
use crate::process;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared handler state: the immutable application config.
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
}

/// Build the application router.
///
/// The body limit is the configured upload limit plus 1 MiB of multipart
/// framing overhead, so an upload at exactly the limit still parses and
/// the validator — not the HTTP layer — produces the user-facing message.
pub fn router(config: Arc<AppConfig>) -> Router {
    let body_limit = config.bounds.max_file_size_bytes() as usize + 1024 * 1024;
    Router::new()
        .route("/upload", get(upload_form).post(handle_upload))
        .route("/upload-page", get(upload_form))
        .route("/summary", get(summary_view))
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AppState { config })
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, config: AppConfig) -> Result<(), Img2SumError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Img2SumError::Internal(format!("failed to bind {addr}: {e}")))?;

    let actual = listener
        .local_addr()
        .map_err(|e| Img2SumError::Internal(e.to_string()))?;
    info!(addr = %actual, upload_dir = %config.upload_dir.display(), "upload server started");

    axum::serve(listener, router(Arc::new(config)))
        .await
        .map_err(|e| Img2SumError::Internal(format!("server error: {e}")))
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn upload_form(State(state): State<AppState>) -> Html<String> {
    Html(render_form(&[], &state.config.bounds.allowed_categories))
}

async fn summary_view() -> Html<String> {
    Html(render_summary(None))
}

async fn handle_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut category: Option<String> = None;
    let mut language: Option<Language> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or("").to_string();
                match name.as_str() {
                    "image" => {
                        let filename = field.file_name().unwrap_or("image").to_string();
                        let content_type = field
                            .content_type()
                            .unwrap_or("application/octet-stream")
                            .to_string();
                        match field.bytes().await {
                            Ok(bytes) => file = Some((filename, content_type, bytes.to_vec())),
                            Err(e) => {
                                warn!("failed to read upload body: {e}");
                                return form_error_response(
                                    &state,
                                    StatusCode::BAD_REQUEST,
                                    "The file could not be read. Please try again.",
                                );
                            }
                        }
                    }
                    "category" => {
                        category = field.text().await.ok().filter(|s| !s.trim().is_empty());
                    }
                    "language" => {
                        language = field.text().await.ok().map(|t| Language::from_tag(&t));
                    }
                    _ => {}
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("malformed multipart request: {e}");
                return form_error_response(
                    &state,
                    StatusCode::BAD_REQUEST,
                    "The upload request was malformed. Please try again.",
                );
            }
        }
    }

    let Some((filename, content_type, bytes)) = file else {
        return form_error_response(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Select an image to upload.",
        );
    };

    let image = UploadedImage {
        filename,
        content_type,
        bytes,
        category,
    };

    match process::summarize_upload(image, language, &state.config).await {
        Ok(output) => Html(render_summary(Some(&output))).into_response(),
        Err(Img2SumError::Invalid(v)) => {
            form_error_response(&state, StatusCode::UNPROCESSABLE_ENTITY, &v.to_string())
        }
        Err(e @ Img2SumError::StorageFailed { .. }) => form_error_response(
            &state,
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("An error occurred while saving the image: {e}"),
        ),
        Err(e) => {
            warn!("pipeline failed: {e}");
            let status = status_for(&e);
            (status, Html(render_error(&e.to_string()))).into_response()
        }
    }
}

fn form_error_response(state: &AppState, status: StatusCode, message: &str) -> Response {
    let categories = &state.config.bounds.allowed_categories;
    (
        status,
        Html(render_form(&[message.to_string()], categories)),
    )
        .into_response()
}

/// Map a pipeline failure to an HTTP status.
fn status_for(err: &Img2SumError) -> StatusCode {
    match err {
        Img2SumError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Img2SumError::NoTextDetected => StatusCode::UNPROCESSABLE_ENTITY,
        Img2SumError::OcrEngineMissing | Img2SumError::ProviderNotConfigured { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        Img2SumError::LlmApiError { .. } | Img2SumError::LlmRetriesExhausted { .. } => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ── HTML rendering (self-contained, no external resources) ───────────────

const STYLE: &str = "\
* { box-sizing: border-box; margin: 0; padding: 0; }\n\
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;\n\
  background: #f6f6f4; color: #1f2421; max-width: 560px; margin: 0 auto; padding: 32px 20px; }\n\
h1 { font-size: 22px; margin-bottom: 6px; }\n\
p.hint { color: #6b7069; font-size: 14px; margin-bottom: 20px; }\n\
form { display: flex; flex-direction: column; gap: 14px; }\n\
label { font-size: 14px; font-weight: 600; }\n\
input[type=file], select { display: block; margin-top: 6px; font-size: 14px; }\n\
button { padding: 12px; border: none; border-radius: 10px; background: #35604a;\n\
  color: white; font-size: 15px; font-weight: 600; cursor: pointer; }\n\
ul.errors { background: #fbe9e7; border: 1px solid #e5b5ad; border-radius: 10px;\n\
  padding: 12px 12px 12px 28px; color: #8c2f24; font-size: 14px; }\n\
.summary { background: white; border: 1px solid #ddd; border-radius: 10px;\n\
  padding: 18px; font-size: 15px; line-height: 1.6; white-space: pre-wrap; }\n\
.empty { color: #6b7069; font-style: italic; }\n\
a { color: #35604a; }\n";

/// Minimal HTML escaping for text interpolated into the pages.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    let mut html = String::with_capacity(body.len() + STYLE.len() + 256);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>");
    html.push_str(&escape_html(title));
    html.push_str("</title>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(body);
    html.push_str("\n</body>\n</html>\n");
    html
}

fn render_form(errors: &[String], categories: &[String]) -> String {
    let mut body = String::new();
    body.push_str("<h1>Summarize an image</h1>\n");
    body.push_str("<p class=\"hint\">Upload a picture of a document or sign; the text inside it is extracted and summarized.</p>\n");

    if !errors.is_empty() {
        body.push_str("<ul class=\"errors\">\n");
        for e in errors {
            body.push_str("<li>");
            body.push_str(&escape_html(e));
            body.push_str("</li>\n");
        }
        body.push_str("</ul>\n");
    }

    body.push_str(
        "<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n\
         <label>Image\n  <input type=\"file\" name=\"image\" accept=\"image/*\" required>\n</label>\n\
         <label>Category (optional)\n  <select name=\"category\">\n    <option value=\"\">—</option>\n",
    );
    for category in categories {
        body.push_str("    <option>");
        body.push_str(&escape_html(category));
        body.push_str("</option>\n");
    }
    body.push_str(
        "  </select>\n</label>\n\
         <label>Language\n  <select name=\"language\">\n    <option value=\"en\">English</option>\n    \
         <option value=\"ja\">日本語</option>\n  </select>\n</label>\n\
         <button type=\"submit\">Upload and summarize</button>\n</form>\n",
    );

    page("Summarize an image", &body)
}

fn render_summary(output: Option<&SummaryOutput>) -> String {
    let mut body = String::new();
    body.push_str("<h1>Summary</h1>\n");
    match output {
        Some(out) => {
            body.push_str("<div class=\"summary\">");
            body.push_str(&escape_html(&out.summary));
            body.push_str("</div>\n");
            body.push_str(&format!(
                "<p class=\"hint\">OCR {} ms · LLM {} ms · {} tokens in / {} tokens out</p>\n",
                out.stats.ocr_duration_ms,
                out.stats.llm_duration_ms,
                out.stats.input_tokens,
                out.stats.output_tokens,
            ));
        }
        None => {
            body.push_str("<p class=\"summary empty\">No summary yet. Upload an image first.</p>\n");
        }
    }
    body.push_str("<p><a href=\"/upload\">Upload another image</a></p>\n");
    page("Summary", &body)
}

fn render_error(message: &str) -> String {
    let mut body = String::new();
    body.push_str("<h1>Something went wrong</h1>\n");
    body.push_str("<ul class=\"errors\"><li>");
    body.push_str(&escape_html(message));
    body.push_str("</li></ul>\n");
    body.push_str("<p><a href=\"/upload\">Back to the upload form</a></p>\n");
    page("Error", &body)
}
