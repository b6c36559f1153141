//! CLI binary for arc-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, builds the backend once with the supplied
//! credential, and prints the results.

use anyhow::{Context, Result};
use arc_extract::report::{render_card, render_side};
use arc_extract::{
    extract_card, CardImages, ExtractionClient, ExtractionConfig, ExtractionProgressCallback,
    OpenAiBackend, ProgressCallback, ProviderBackend, Side, VisionBackend,
};
use clap::Parser;
use edgequake_llm::ProviderFactory;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while a side's request is in flight.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_sides: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_sides} side(s)…"))
        ));
    }

    fn on_side_start(&self, side: Side) {
        self.bar.set_message(format!("{side} side"));
    }

    fn on_side_complete(&self, side: Side, duration_ms: u64) {
        self.bar.println(format!(
            "  {} {:<5}  {:.1}s",
            green("✓"),
            side,
            duration_ms as f64 / 1000.0
        ));
    }

    fn on_side_error(&self, side: Side, error: String) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error
        };
        self.bar
            .println(format!("  {} {:<5}  {}", red("✗"), side, red(&msg)));
    }

    fn on_extraction_complete(&self, _total_sides: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Both sides of the card
  arcx --front front.jpg --back back.jpg

  # Front only, JSON output
  arcx --front front.png --json

  # One photo showing both faces
  arcx --combined card.jpg

  # Run the two sides concurrently
  arcx --front front.jpg --back back.jpg --parallel

  # Another provider via edgequake-llm (reads its own API key variable)
  arcx --provider anthropic --model claude-sonnet-4-20250514 --front front.jpg

PRICING:
  The cost estimate uses --input-price / --output-price (USD per 1K tokens).
  Defaults are the gpt-4o list prices: $0.0025 in, $0.01 out.
  The local-currency figure uses --exchange-rate (default 1447 ₩/USD) and is
  an approximation for display only.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY      API key for the default OpenAI backend
  ARCX_MODEL          Override model ID
  ARCX_API_BASE       OpenAI-compatible base URL (e.g. a local proxy)
"#;

/// Extract Alien Registration Card fields from photos using a Vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "arcx",
    version,
    about = "Extract Alien Registration Card fields from photos using a Vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Photo of the card front (JPEG or PNG).
    #[arg(long, conflicts_with = "combined")]
    front: Option<PathBuf>,

    /// Photo of the card back (JPEG or PNG).
    #[arg(long, conflicts_with = "combined")]
    back: Option<PathBuf>,

    /// One photo showing both faces; extracted with both schemas.
    #[arg(long)]
    combined: Option<PathBuf>,

    /// API key for the OpenAI backend.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Provider: openai (default) or any edgequake-llm provider name.
    #[arg(long, env = "ARCX_PROVIDER", default_value = "openai")]
    provider: String,

    /// Model ID.
    #[arg(long, env = "ARCX_MODEL", default_value = arc_extract::config::DEFAULT_MODEL)]
    model: String,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "ARCX_API_BASE", default_value = arc_extract::config::DEFAULT_API_BASE)]
    api_base: String,

    /// LLM temperature (0.0–2.0). Provider default when unset.
    #[arg(long, env = "ARCX_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max output tokens per side. Provider default when unset.
    #[arg(long, env = "ARCX_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Per-call timeout in seconds.
    #[arg(long, env = "ARCX_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// USD per 1K input tokens.
    #[arg(long, env = "ARCX_INPUT_PRICE", default_value_t = 0.0025)]
    input_price: f64,

    /// USD per 1K output tokens.
    #[arg(long, env = "ARCX_OUTPUT_PRICE", default_value_t = 0.01)]
    output_price: f64,

    /// Local currency units per USD, display only.
    #[arg(long, env = "ARCX_EXCHANGE_RATE", default_value_t = 1447.0)]
    exchange_rate: f64,

    /// Local currency symbol.
    #[arg(long, env = "ARCX_CURRENCY_SYMBOL", default_value = "₩")]
    currency_symbol: String,

    /// Process the front and back concurrently.
    #[arg(long, env = "ARCX_PARALLEL")]
    parallel: bool,

    /// Output the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ARCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let backend = build_backend(&cli, &config)?;
    let client = ExtractionClient::new(backend, config.pricing);

    let images = match cli.combined {
        Some(ref path) => CardImages::from_combined_path(path).await,
        None => CardImages::from_paths(cli.front.as_deref(), cli.back.as_deref()).await,
    }
    .context("Failed to load card images")?;

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };

    let report = extract_card(&client, images, &config, progress.as_ref())
        .await
        .context("Extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if report.sides.len() == 1 {
        print!("{}", render_side(&report.sides[0], &config.currency));
    } else {
        print!("{}", render_card(&report, &config.currency));
    }

    if report.all_failed() {
        anyhow::bail!("All {} side(s) failed", report.sides.len());
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(&cli.model)
        .api_base(&cli.api_base)
        .api_timeout_secs(cli.api_timeout)
        .input_per_1k(cli.input_price)
        .output_per_1k(cli.output_price)
        .exchange_rate(cli.exchange_rate)
        .currency_symbol(&cli.currency_symbol)
        .parallel_sides(cli.parallel);

    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    builder.build().context("Invalid configuration")
}

/// Construct the backend once, with the credential resolved at startup.
fn build_backend(cli: &Cli, config: &ExtractionConfig) -> Result<Arc<dyn VisionBackend>> {
    if cli.provider.eq_ignore_ascii_case("openai") {
        let key = cli.api_key.clone().unwrap_or_default();
        let backend = OpenAiBackend::new(key, config).context("Failed to set up OpenAI backend")?;
        return Ok(Arc::new(backend));
    }

    let provider = ProviderFactory::create_llm_provider(&cli.provider, &config.model)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("LLM provider '{}' is not configured", cli.provider))?;
    Ok(Arc::new(ProviderBackend::new(provider, cli.provider.clone(), config)))
}
