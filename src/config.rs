//! Configuration types for the image-summarization pipeline.
//!
//! All behaviour is controlled through [`AppConfig`], built via its
//! [`AppConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share the config across handler tasks, serialise the bounds for
//! logging, and diff two runs to understand why their outputs differ.
//!
//! Nothing here reads the environment. API keys are looked up at exactly
//! one documented point (provider resolution in [`crate::process`]), so a
//! missing credential is a per-request condition rather than a startup
//! failure.

use crate::error::Img2SumError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Language tag for OCR and text normalization.
///
/// `Other` covers any tag outside the two supported languages: folding and
/// stop-word removal become no-ops, and the OCR engine falls back to its
/// English model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English: case-folding, English stop-words. (default)
    #[default]
    En,
    /// Japanese: NFKC width/kana canonicalization, Japanese stop-words.
    Ja,
    /// Anything else: no folding, no stop-word filtering.
    Other,
}

impl Language {
    /// Parse a language tag. Unknown tags map to [`Language::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "en" => Language::En,
            "ja" => Language::Ja,
            _ => Language::Other,
        }
    }

    /// The Tesseract traineddata code for this language.
    pub fn tesseract_code(self) -> &'static str {
        match self {
            Language::En => "eng",
            Language::Ja => "jpn",
            // The engine default; there is no model to map an unknown tag to.
            Language::Other => "eng",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Ja => write!(f, "ja"),
            Language::Other => write!(f, "other"),
        }
    }
}

/// Bounds an uploaded image must satisfy.
///
/// Immutable once built. [`ValidationBounds::default`] carries the lenient
/// variant (10 MB, aspect 0.5–2.0); [`ValidationBounds::strict`] the tight
/// one (5 MB, aspect 1.0–2.0). Both are configuration points, not separate
/// code paths — one validator reads whichever bounds it is handed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationBounds {
    /// Allowed MIME subtypes, lower-case, under the "image/" main type.
    pub allowed_formats: Vec<String>,

    /// Maximum upload size in megabytes.
    pub max_file_size_mb: u64,

    /// Minimum width ÷ height, inclusive.
    pub min_aspect_ratio: f64,

    /// Maximum width ÷ height, inclusive.
    pub max_aspect_ratio: f64,

    /// Minimum width × height in pixels, inclusive.
    pub min_resolution: u64,

    /// Maximum width × height in pixels, inclusive.
    pub max_resolution: u64,

    /// Categories an upload may declare. Matching is case-insensitive;
    /// an absent category is always accepted.
    pub allowed_categories: Vec<String>,
}

impl Default for ValidationBounds {
    fn default() -> Self {
        Self {
            allowed_formats: vec!["jpeg".into(), "png".into(), "gif".into()],
            max_file_size_mb: 10,
            min_aspect_ratio: 0.5,
            max_aspect_ratio: 2.0,
            min_resolution: 100 * 100,
            max_resolution: 2000 * 2000,
            allowed_categories: vec!["nature".into(), "people".into(), "architecture".into()],
        }
    }
}

impl ValidationBounds {
    /// The tight bound variant: 5 MB limit and aspect ratio 1.0–2.0.
    pub fn strict() -> Self {
        Self {
            max_file_size_mb: 5,
            min_aspect_ratio: 1.0,
            ..Self::default()
        }
    }

    /// Maximum upload size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Per-side pixel clamp derived from the resolution bounds, used by the
    /// explicit [`crate::pipeline::validate::conform`] transform. A square
    /// at `min_resolution` has side `√min`, so clamping each side into
    /// `[√min, √max]` keeps the resolution invariant satisfiable.
    pub fn side_bounds(&self) -> (u32, u32) {
        let lo = (self.min_resolution as f64).sqrt().floor() as u32;
        let hi = (self.max_resolution as f64).sqrt().floor() as u32;
        (lo.max(1), hi.max(1))
    }
}

/// Configuration for the image-summarization pipeline.
///
/// Built via [`AppConfig::builder()`] or [`AppConfig::default()`].
///
/// # Example
/// ```rust
/// use img2sum::{AppConfig, Language};
///
/// let config = AppConfig::builder()
///     .upload_dir("uploaded_images")
///     .language(Language::En)
///     .model("gpt-4.1-nano")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AppConfig {
    /// Directory uploads are written to, created on demand. Default: `uploaded_images`.
    pub upload_dir: PathBuf,

    /// Language used for OCR and normalization. Default: [`Language::En`].
    ///
    /// A per-request `language` form field overrides this for that request.
    pub language: Language,

    /// Bounds an upload must satisfy. Default: [`ValidationBounds::default`].
    pub bounds: ValidationBounds,

    /// Resize and re-encode uploads whose dimensions exceed the bounds
    /// instead of storing them verbatim. Default: false.
    ///
    /// This is an explicit opt-in: validation itself never mutates the
    /// image it checks.
    pub conform_uploads: bool,

    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses the
    /// provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai"). If None, the `OPENAI_API_KEY`
    /// environment variable selects the OpenAI provider.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the summary completion. Default: 0.3.
    ///
    /// Low temperature keeps the summary faithful to the extracted text;
    /// higher values introduce paraphrase the OCR input doesn't support.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate for the summary. Default: 512.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient LLM API failure. Default: 3.
    ///
    /// Permanent errors (bad API key, 400) surface immediately; 5xx and
    /// timeout errors are retried with exponential backoff.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Custom system prompt. If None, uses the built-in default for the
    /// request language.
    pub system_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploaded_images"),
            language: Language::default(),
            bounds: ValidationBounds::default(),
            conform_uploads: false,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            max_tokens: 512,
            max_retries: 3,
            retry_backoff_ms: 500,
            system_prompt: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("upload_dir", &self.upload_dir)
            .field("language", &self.language)
            .field("bounds", &self.bounds)
            .field("conform_uploads", &self.conform_uploads)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl AppConfig {
    /// Create a new builder for `AppConfig`.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AppConfig`].
#[derive(Debug)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn bounds(mut self, bounds: ValidationBounds) -> Self {
        self.config.bounds = bounds;
        self
    }

    pub fn conform_uploads(mut self, v: bool) -> Self {
        self.config.conform_uploads = v;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AppConfig, Img2SumError> {
        let b = &self.config.bounds;
        if b.max_file_size_mb == 0 {
            return Err(Img2SumError::InvalidConfig(
                "max_file_size_mb must be ≥ 1".into(),
            ));
        }
        if b.min_aspect_ratio <= 0.0 || b.min_aspect_ratio > b.max_aspect_ratio {
            return Err(Img2SumError::InvalidConfig(format!(
                "aspect ratio bounds must satisfy 0 < min ≤ max, got {}–{}",
                b.min_aspect_ratio, b.max_aspect_ratio
            )));
        }
        if b.min_resolution == 0 || b.min_resolution > b.max_resolution {
            return Err(Img2SumError::InvalidConfig(format!(
                "resolution bounds must satisfy 0 < min ≤ max, got {}–{}",
                b.min_resolution, b.max_resolution
            )));
        }
        if b.allowed_formats.is_empty() {
            return Err(Img2SumError::InvalidConfig(
                "allowed_formats must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
