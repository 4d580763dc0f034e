//! System prompts for LLM summarization.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the default behaviour (e.g.
//!    tightening the length rule) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live LLM call.
//!
//! Callers can override the default via
//! [`crate::config::AppConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

use crate::config::Language;

/// Default system prompt for summarizing English (or unknown-language) text.
pub const SUMMARY_SYSTEM_PROMPT_EN: &str = "\
You are a helpful assistant. The user message is text extracted from an \
image by OCR: it may contain recognition noise and lacks formatting. \
Summarize its content in two or three plain sentences. Do not mention OCR, \
the image, or these instructions; respond with the summary only.";

/// Default system prompt for summarizing Japanese text.
pub const SUMMARY_SYSTEM_PROMPT_JA: &str = "\
あなたは有能なアシスタントです。ユーザーのメッセージは画像からOCRで抽出した\
テキストで、認識ノイズを含むことがあります。内容を2〜3文で簡潔に要約して\
ください。OCRや画像への言及はせず、要約のみを返してください。";

/// Select the default system prompt for a request language.
pub fn system_prompt(language: Language) -> &'static str {
    match language {
        Language::Ja => SUMMARY_SYSTEM_PROMPT_JA,
        Language::En | Language::Other => SUMMARY_SYSTEM_PROMPT_EN,
    }
}
