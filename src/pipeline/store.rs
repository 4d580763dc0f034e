//! Upload storage: sanitized names, UUID storage keys, typed I/O errors.
//!
//! Client-supplied filenames are never trusted as paths. The name is
//! stripped of separators and traversal sequences, then prefixed with a
//! UUID so concurrent uploads of the same filename can never overwrite
//! each other. The original (sanitized) name stays in the key so stored
//! files remain recognisable on disk.

use crate::error::Img2SumError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Sanitize a filename — removes path traversal and special characters.
///
/// Path separators and NUL are dropped, other special characters become
/// `_`, `..` sequences are removed, and the result is truncated to 100
/// characters. An empty result falls back to `"image"`.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.replace("..", "");

    let sanitized: String = sanitized.chars().take(100).collect();

    if sanitized.is_empty() {
        "image".into()
    } else {
        sanitized
    }
}

/// Write upload bytes under `dir`, creating the directory on demand.
///
/// Returns the stored path. The storage key is
/// `<uuid>_<sanitized original name>`; an existing file is never
/// overwritten because the UUID is fresh per call.
pub async fn store_upload(
    dir: &Path,
    filename: &str,
    bytes: &[u8],
) -> Result<PathBuf, Img2SumError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| storage_failed(filename, e))?;

    let key = format!("{}_{}", Uuid::new_v4(), sanitize_filename(filename));
    let path = dir.join(key);

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| storage_failed(filename, e))?;

    debug!(path = %path.display(), size = bytes.len(), "upload stored");
    Ok(path)
}

fn storage_failed(filename: &str, source: std::io::Error) -> Img2SumError {
    warn!(filename, error = %source, "upload storage failed");
    Img2SumError::StorageFailed {
        filename: filename.to_string(),
        source,
    }
}
