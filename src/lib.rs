//! # img2sum
//!
//! Summarize the text inside an image: OCR + LLM, behind a small upload
//! server or a one-shot CLI.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image (upload / path / URL)
//!  │
//!  ├─ 1. Validate   MIME, size, aspect ratio, resolution, category bounds
//!  ├─ 2. Store      sanitized name under a UUID storage key
//!  ├─ 3. OCR        tesseract subprocess → raw text
//!  ├─ 4. Normalize  folding, stop-words, tag/bracket stripping
//!  ├─ 5. Summarize  LLM chat call with retry/backoff
//!  └─ 6. Polish     normalize reply, trim, `...` → `…`
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2sum::{summarize_file, AppConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider selected from OPENAI_API_KEY unless configured explicitly
//!     let config = AppConfig::default();
//!     let output = summarize_file("receipt.png", &config).await?;
//!     println!("{}", output.summary);
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.input_tokens,
//!         output.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! Or run the upload server and POST a multipart form to `/upload`:
//!
//! ```rust,no_run
//! use img2sum::{serve, AppConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! serve("127.0.0.1:8008".parse()?, AppConfig::default()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2sum` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! img2sum = { version = "0.3", default-features = false }
//! ```
//!
//! ## External requirements
//!
//! OCR shells out to the `tesseract` binary (`apt install tesseract-ocr`,
//! plus `tesseract-ocr-jpn` for Japanese). Summarization needs an LLM API
//! credential, typically `OPENAI_API_KEY`; its absence is reported per
//! request, never at startup.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AppConfig, AppConfigBuilder, Language, ValidationBounds};
pub use error::{Img2SumError, ValidationError};
pub use output::{SummaryOutput, SummaryStats};
pub use pipeline::validate::{conform, validate, UploadedImage};
pub use process::{summarize_file, summarize_upload};
pub use server::{router, serve};
