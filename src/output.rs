//! Output types: the summary plus everything a caller may want to show
//! about how it was produced.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of summarizing one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    /// The post-processed summary, ready for display.
    pub summary: String,

    /// Where the upload was stored (UUID-prefixed, sanitized filename).
    pub stored_path: PathBuf,

    /// Normalized OCR text that was sent to the LLM.
    pub extracted_text: String,

    /// Timing and token accounting for the run.
    pub stats: SummaryStats,
}

/// Per-run statistics.
///
/// Durations are wall-clock per stage; token counts come from the LLM
/// provider's usage report.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Time spent in the OCR subprocess, in milliseconds.
    pub ocr_duration_ms: u64,

    /// Time spent in the LLM call (including retries), in milliseconds.
    pub llm_duration_ms: u64,

    /// End-to-end time from validation to post-processed summary.
    pub total_duration_ms: u64,

    /// Prompt tokens reported by the provider.
    pub input_tokens: u64,

    /// Completion tokens reported by the provider.
    pub output_tokens: u64,

    /// How many retries the LLM call needed (0 = first attempt succeeded).
    pub retries: u32,
}
