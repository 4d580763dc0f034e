//! LLM interaction: build the chat request and post-process the reply.
//!
//! This module is intentionally thin — prompt text lives in
//! [`crate::prompts`] and provider resolution in [`crate::process`], so
//! retry and error-handling logic here stays independent of both.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent.
//! Exponential backoff (`retry_backoff_ms * 2^attempt`) avoids hammering a
//! recovering endpoint: with 500 ms base and 3 retries the wait sequence
//! is 500 ms → 1 s → 2 s, totalling < 4 s of back-off per request.

use crate::config::{AppConfig, Language};
use crate::error::Img2SumError;
use crate::pipeline::normalize::normalize;
use crate::prompts;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// The LLM's reply plus usage accounting.
#[derive(Debug, Clone)]
pub struct LlmReply {
    /// Raw reply content, before post-processing.
    pub content: String,
    /// Prompt tokens reported by the provider.
    pub input_tokens: u64,
    /// Completion tokens reported by the provider.
    pub output_tokens: u64,
    /// Retries needed before success.
    pub retries: u32,
    /// Wall-clock time including backoff.
    pub duration_ms: u64,
}

/// Send normalized text to the LLM and return the reply.
///
/// ## Message Layout
///
/// 1. **System message** — the per-language summary prompt (or the
///    caller's override)
/// 2. **User message** — the normalized OCR text
///
/// Transient failures are retried up to `config.max_retries` times with
/// exponential backoff; after that the last error surfaces as
/// [`Img2SumError::LlmRetriesExhausted`].
pub async fn request_summary(
    provider: &Arc<dyn LLMProvider>,
    text: &str,
    language: Language,
    config: &AppConfig,
) -> Result<LlmReply, Img2SumError> {
    let start = Instant::now();
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or_else(|| prompts::system_prompt(language));

    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(text),
    ];

    let options = build_options(config);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "summary retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                let duration = start.elapsed();
                debug!(
                    "summary: {} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens, response.completion_tokens, duration
                );

                return Ok(LlmReply {
                    content: response.content,
                    input_tokens: response.prompt_tokens as u64,
                    output_tokens: response.completion_tokens as u64,
                    retries: attempt,
                    duration_ms: duration.as_millis() as u64,
                });
            }
            Err(e) => {
                let err_msg = format!("{}", e);
                warn!("summary attempt {} failed — {}", attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    Err(Img2SumError::LlmRetriesExhausted {
        retries: config.max_retries,
        detail: last_err.unwrap_or_else(|| "unknown error".to_string()),
    })
}

/// Post-process the model's reply for display.
///
/// The reply goes through the same normalizer as the OCR text, then
/// leading/trailing whitespace is trimmed and a literal `...` becomes a
/// single ellipsis character.
pub fn postprocess_reply(reply: &str, language: Language) -> String {
    normalize(reply, language).trim().replace("...", "…")
}

/// Build `CompletionOptions` from the app config.
fn build_options(config: &AppConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
