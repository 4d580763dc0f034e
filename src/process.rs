//! End-to-end pipeline entry points.
//!
//! One upload is handled start to finish by one task: validate → store →
//! OCR → normalize → summarize → post-process. Each stage's failure is a
//! typed [`Img2SumError`] scoped to the request; nothing here retries a
//! whole run or touches state shared between requests beyond the upload
//! directory itself.

use crate::config::{AppConfig, Language};
use crate::error::Img2SumError;
use crate::output::{SummaryOutput, SummaryStats};
use crate::pipeline::{input, ocr, store, summarize, validate};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Validate, store, and summarize one uploaded image.
///
/// This is the primary entry point for the library. The request language
/// falls back to `config.language` when `language` is `None`.
///
/// # Errors
/// - [`Img2SumError::Invalid`] — the image failed a validation bound;
///   re-render the form with the inner message
/// - [`Img2SumError::StorageFailed`] — the upload could not be written
/// - [`Img2SumError::OcrEngineMissing`] / [`Img2SumError::OcrFailed`] /
///   [`Img2SumError::NoTextDetected`] — text extraction failed
/// - [`Img2SumError::ProviderNotConfigured`] /
///   [`Img2SumError::LlmRetriesExhausted`] — summarization failed
pub async fn summarize_upload(
    image: validate::UploadedImage,
    language: Option<Language>,
    config: &AppConfig,
) -> Result<SummaryOutput, Img2SumError> {
    let total_start = Instant::now();
    let language = language.unwrap_or(config.language);
    info!(filename = %image.filename, %language, "processing upload");

    // ── Step 1: Validate ─────────────────────────────────────────────────
    validate::validate(&image, &config.bounds)?;

    // ── Step 2: Conform (explicit opt-in) ────────────────────────────────
    let image = if config.conform_uploads {
        validate::conform(image, &config.bounds)?
    } else {
        image
    };

    // ── Step 3: Store ────────────────────────────────────────────────────
    let stored_path = store::store_upload(&config.upload_dir, &image.filename, &image.bytes).await?;

    // ── Step 4: OCR + normalize ──────────────────────────────────────────
    let ocr_start = Instant::now();
    let extracted_text = ocr::extract_keywords(&stored_path, language).await?;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
    if extracted_text.is_empty() {
        return Err(Img2SumError::NoTextDetected);
    }
    debug!(chars = extracted_text.len(), "text extracted");

    // ── Step 5: Summarize ────────────────────────────────────────────────
    let provider = resolve_provider(config)?;
    let reply = summarize::request_summary(&provider, &extracted_text, language, config).await?;
    let summary = summarize::postprocess_reply(&reply.content, language);

    let stats = SummaryStats {
        ocr_duration_ms,
        llm_duration_ms: reply.duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
        retries: reply.retries,
    };

    info!(
        path = %stored_path.display(),
        total_ms = stats.total_duration_ms,
        "summary produced"
    );

    Ok(SummaryOutput {
        summary,
        stored_path,
        extracted_text,
        stats,
    })
}

/// Summarize an image given as a local path or HTTP(S) URL.
///
/// Used by the CLI one-shot mode. The file is read into memory, its
/// content type sniffed from magic bytes, and the result fed through
/// [`summarize_upload`] — so CLI inputs face exactly the same validation
/// as HTTP uploads.
pub async fn summarize_file(
    input_str: impl AsRef<str>,
    config: &AppConfig,
) -> Result<SummaryOutput, Img2SumError> {
    let input_str = input_str.as_ref();
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let path = resolved.path();

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Img2SumError::Internal(format!("failed to read '{}': {e}", path.display())))?;

    let subtype = input::sniff_subtype(&bytes).unwrap_or("octet-stream");
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();

    let image = validate::UploadedImage {
        filename,
        content_type: format!("image/{subtype}"),
        bytes,
        category: None,
    };

    summarize_upload(image, None, config).await
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and configured the provider entirely; we use it as-is. Useful in
///    tests or when the caller needs custom middleware.
///
/// 2. **Named provider + model** (`config.provider_name`) — the factory
///    reads the corresponding API key from the environment.
///
/// 3. **`OPENAI_API_KEY`** — the default provider when a key is present.
///
/// Anything else is [`Img2SumError::ProviderNotConfigured`]. This check
/// happens before any network I/O, so a missing credential is reported
/// instantly and never burns a request.
pub fn resolve_provider(config: &AppConfig) -> Result<Arc<dyn LLMProvider>, Img2SumError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_provider(name, model);
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
            return create_provider("openai", model);
        }
    }

    Err(Img2SumError::ProviderNotConfigured {
        provider: "openai".to_string(),
        hint: "Set the OPENAI_API_KEY environment variable, or pass --provider/--model."
            .to_string(),
    })
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Img2SumError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Img2SumError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
