//! Pipeline stages for image-to-summary processing.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch OCR backend) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ validate ──▶ store ──▶ ocr ──▶ normalize ──▶ summarize
//! (upload/   (bounds)    (disk)   (tesseract) (fold+strip)  (LLM)
//!  path/URL)
//! ```
//!
//! 1. [`input`]     — canonicalise a CLI-supplied path or URL to a local file
//! 2. [`validate`]  — check MIME/size/aspect/resolution/category bounds;
//!    the optional `conform` transform lives here too, but is never applied
//!    implicitly
//! 3. [`store`]     — sanitize the client filename and write the upload
//!    under a UUID storage key
//! 4. [`ocr`]       — run the Tesseract subprocess; the only stage that
//!    shells out
//! 5. [`normalize`] — deterministic text cleanup (folding, stop-words,
//!    tag/bracket stripping); pure and idempotent
//! 6. [`summarize`] — drive the LLM call with retry/backoff; the only
//!    stage with network I/O

pub mod input;
pub mod normalize;
pub mod ocr;
pub mod store;
pub mod summarize;
pub mod validate;
