//! OCR: extract text from a stored image via the Tesseract subprocess.
//!
//! ## Why a subprocess?
//!
//! Tesseract is a C++ engine with its own model files and lifecycle.
//! Shelling out to the `tesseract` binary keeps the crate pure Rust, makes
//! the engine swappable at deploy time, and isolates engine crashes from
//! the server process. `tokio::process` keeps the worker threads free
//! while the engine runs — OCR on a large image can take seconds.
//!
//! The engine writes recognised text to stdout with `stdout` as the output
//! argument; language models are selected with `-l <code>` using the
//! traineddata codes from [`Language::tesseract_code`].

use crate::config::Language;
use crate::error::Img2SumError;
use crate::pipeline::normalize::normalize;
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

/// Run OCR against the image at `path` and return the raw engine output.
///
/// Fails with [`Img2SumError::FileNotFound`] before launching the engine
/// if the path does not exist, with [`Img2SumError::OcrEngineMissing`] if
/// the `tesseract` binary is not installed, and with
/// [`Img2SumError::OcrFailed`] when the engine exits unsuccessfully.
pub async fn extract_text(path: &Path, language: Language) -> Result<String, Img2SumError> {
    if !path.exists() {
        return Err(Img2SumError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let start = Instant::now();
    let output = Command::new("tesseract")
        .arg(path)
        .arg("stdout")
        .arg("-l")
        .arg(language.tesseract_code())
        .arg("--psm")
        .arg("3")
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Img2SumError::OcrEngineMissing,
            _ => Img2SumError::OcrFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(path = %path.display(), "tesseract exited with failure");
        return Err(Img2SumError::OcrFailed {
            path: path.to_path_buf(),
            detail: stderr.trim().to_string(),
        });
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!(
        path = %path.display(),
        chars = text.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "OCR complete"
    );
    Ok(text)
}

/// Extract text from a stored image and normalize it for the given language.
///
/// This is the keyword-extraction entry point used by the pipeline:
/// OCR followed by [`normalize`], in one call.
pub async fn extract_keywords(path: &Path, language: Language) -> Result<String, Img2SumError> {
    let raw = extract_text(path, language).await?;
    Ok(normalize(&raw, language))
}
