//! Error types for the img2sum library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Img2SumError`] — the request cannot produce a summary (storage
//!   failure, OCR engine missing, LLM provider unavailable). Returned as
//!   `Err(Img2SumError)` from the top-level pipeline functions. None of
//!   these are process-fatal: the server reports them and keeps serving.
//!
//! * [`ValidationError`] — the uploaded image itself is unacceptable
//!   (wrong format, too large, bad aspect ratio). These are user-facing
//!   field errors: the upload form is re-rendered with the message and the
//!   user can try again. Every message names the violated bound and its
//!   configured threshold so it can be shown verbatim.
//!
//! A `ValidationError` is also reachable through
//! [`Img2SumError::Invalid`], so callers that don't care about the
//! distinction get a single error channel with one `Display` surface.

use std::path::PathBuf;
use thiserror::Error;

/// All pipeline errors returned by the img2sum library.
///
/// Input-validation failures use [`ValidationError`] and are wrapped in
/// [`Img2SumError::Invalid`] when they cross the pipeline boundary.
#[derive(Debug, Error)]
pub enum Img2SumError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but its magic bytes are not an image's.
    #[error("file is not a supported image: '{path}'\nFirst bytes: {magic:02X?}")]
    NotAnImage { path: PathBuf, magic: [u8; 4] },

    /// Image bytes could not be decoded into pixels.
    #[error("could not decode image '{filename}': {detail}")]
    DecodeFailed { filename: String, detail: String },

    // ── Validation ────────────────────────────────────────────────────────
    /// The upload failed one of the configured validation bounds.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    // ── Storage errors ────────────────────────────────────────────────────
    /// Could not create the upload directory or write the file.
    #[error("failed to store upload '{filename}': {source}")]
    StorageFailed {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The `tesseract` binary is not on PATH.
    #[error(
        "tesseract binary not found on PATH.\n\
         Install it with your package manager, e.g.:\n\
           • Debian/Ubuntu: apt install tesseract-ocr tesseract-ocr-jpn\n\
           • macOS: brew install tesseract tesseract-lang"
    )]
    OcrEngineMissing,

    /// Tesseract ran but exited unsuccessfully.
    #[error("OCR failed for '{path}': {detail}")]
    OcrFailed { path: PathBuf, detail: String },

    /// OCR succeeded but produced no usable text after normalization.
    #[error("no readable text was found in the image")]
    NoTextDetected,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned a non-retryable error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// Every retry attempt failed.
    #[error("summarization failed after {retries} retries: {detail}")]
    LlmRetriesExhausted { retries: u32, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A recoverable, user-facing rejection of an uploaded image.
///
/// Produced by [`crate::pipeline::validate::validate`]. Checks run in a
/// fixed order and the first violation wins; errors are never accumulated.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum ValidationError {
    /// Content type had no "main/sub" shape at all.
    #[error("'{content_type}' is not a recognisable content type")]
    ContentType { content_type: String },

    /// MIME main part was not "image", or the subtype is not allowed.
    #[error("please use an image in one of these formats: {allowed}")]
    Format { allowed: String },

    /// Byte size exceeds the configured megabyte limit.
    #[error("file size must be {max_mb} MB or less (got {got_mb:.1} MB)")]
    TooLarge { max_mb: u64, got_mb: f64 },

    /// The image bytes could not be decoded to obtain pixel dimensions.
    #[error("the file could not be read as an image")]
    Undecodable,

    /// Width ÷ height fell outside the configured range.
    #[error("image aspect ratio must be between {min} and {max} (got {actual:.2})")]
    AspectRatio { min: f64, max: f64, actual: f64 },

    /// Width × height fell outside the configured range.
    #[error("image resolution must be between {min} and {max} pixels (got {actual})")]
    Resolution { min: u64, max: u64, actual: u64 },

    /// The supplied category is not on the allow-list.
    #[error("images in the '{category}' category cannot be uploaded")]
    Category { category: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_display_names_the_limit() {
        let e = ValidationError::TooLarge {
            max_mb: 10,
            got_mb: 12.3,
        };
        let msg = e.to_string();
        assert!(msg.contains("10 MB"), "got: {msg}");
        assert!(msg.contains("12.3"), "got: {msg}");
    }

    #[test]
    fn aspect_ratio_display_names_both_bounds() {
        let e = ValidationError::AspectRatio {
            min: 0.5,
            max: 2.0,
            actual: 3.25,
        };
        let msg = e.to_string();
        assert!(msg.contains("0.5") && msg.contains('2'), "got: {msg}");
        assert!(msg.contains("3.25"), "got: {msg}");
    }

    #[test]
    fn validation_error_wraps_transparently() {
        let e: Img2SumError = ValidationError::Category {
            category: "cars".into(),
        }
        .into();
        assert!(e.to_string().contains("cars"));
    }

    #[test]
    fn provider_not_configured_display() {
        let e = Img2SumError::ProviderNotConfigured {
            provider: "openai".into(),
            hint: "Set OPENAI_API_KEY".into(),
        };
        assert!(e.to_string().contains("openai"));
        assert!(e.to_string().contains("OPENAI_API_KEY"));
    }
}
