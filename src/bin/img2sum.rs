//! CLI binary for img2sum.
//!
//! A thin shim over the library crate that maps CLI flags to `AppConfig`.
//! With an input argument it summarizes one image and prints the result;
//! without one it runs the upload server.

use anyhow::{Context, Result};
use clap::Parser;
use img2sum::{serve, summarize_file, AppConfig, Language, ValidationBounds};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "img2sum",
    version,
    about = "Summarize the text inside an image using OCR and an LLM",
    after_help = "EXAMPLES:\n  \
        img2sum receipt.png\n  \
        img2sum https://example.com/scan.jpg --language ja\n  \
        img2sum --listen 0.0.0.0:8008 --upload-dir /var/lib/img2sum"
)]
struct Cli {
    /// Image file or URL to summarize. Omit to run the upload server.
    input: Option<String>,

    /// Address for the upload server.
    #[arg(long, default_value = "127.0.0.1:8008")]
    listen: SocketAddr,

    /// Directory uploads are stored in (created on demand).
    #[arg(long, default_value = "uploaded_images")]
    upload_dir: PathBuf,

    /// OCR / normalization language: en or ja.
    #[arg(long, default_value = "en")]
    language: String,

    /// LLM model identifier (defaults to the provider's default).
    #[arg(long, env = "IMG2SUM_MODEL")]
    model: Option<String>,

    /// LLM provider name (defaults to OpenAI via OPENAI_API_KEY).
    #[arg(long)]
    provider: Option<String>,

    /// Override the maximum upload size in megabytes.
    #[arg(long)]
    max_file_size_mb: Option<u64>,

    /// Use the tight validation bounds (5 MB, aspect ratio 1.0–2.0).
    #[arg(long)]
    strict_bounds: bool,

    /// Resize and re-encode out-of-bounds uploads instead of storing them
    /// verbatim.
    #[arg(long)]
    conform: bool,

    /// Maximum retries for transient LLM failures.
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Download timeout for URL inputs, in seconds.
    #[arg(long, default_value_t = 120)]
    download_timeout: u64,

    /// One-shot mode: print the full result as JSON instead of just the
    /// summary.
    #[arg(long)]
    json: bool,
}

fn build_config(cli: &Cli) -> Result<AppConfig> {
    let mut bounds = if cli.strict_bounds {
        ValidationBounds::strict()
    } else {
        ValidationBounds::default()
    };
    if let Some(mb) = cli.max_file_size_mb {
        bounds.max_file_size_mb = mb;
    }

    let mut builder = AppConfig::builder()
        .upload_dir(&cli.upload_dir)
        .language(Language::from_tag(&cli.language))
        .bounds(bounds)
        .conform_uploads(cli.conform)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.as_str());
    }

    builder.build().context("invalid configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    match cli.input {
        Some(ref input) => {
            let output = summarize_file(input, &config)
                .await
                .with_context(|| format!("failed to summarize '{input}'"))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", output.summary);
                eprintln!(
                    "stored: {}  ·  ocr {} ms  ·  llm {} ms  ·  {} tokens in / {} out",
                    output.stored_path.display(),
                    output.stats.ocr_duration_ms,
                    output.stats.llm_duration_ms,
                    output.stats.input_tokens,
                    output.stats.output_tokens,
                );
            }
        }
        None => {
            serve(cli.listen, config).await.context("server failed")?;
        }
    }

    Ok(())
}
