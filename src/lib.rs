//! # arc-extract
//!
//! Extract the printed fields of a Korean Alien Registration Card (ARC) from
//! photos using a Vision Language Model, and estimate what each call cost.
//!
//! ## Pipeline Overview
//!
//! ```text
//! front.jpg / back.png
//!  │
//!  ├─ 1. Input    read file, check JPEG/PNG magic bytes
//!  ├─ 2. Encode   decode → PNG → base64 data-URI
//!  ├─ 3. VLM      one chat-completions call per side, JSON response mode
//!  ├─ 4. Parse    JSON object → FrontFields / BackFields
//!  └─ 5. Price    token counters × per-1k rates, summed across sides
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arc_extract::{extract_card, CardImages, ExtractionClient, ExtractionConfig, OpenAiBackend};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let api_key = std::env::var("OPENAI_API_KEY")?;
//!     let backend = OpenAiBackend::new(api_key, &config)?;
//!     let client = ExtractionClient::new(Arc::new(backend), config.pricing);
//!
//!     let images = CardImages::from_paths(Some(Path::new("front.jpg")), Some(Path::new("back.jpg"))).await?;
//!     let report = extract_card(&client, images, &config, None).await?;
//!     for side in &report.sides {
//!         println!("{}: {:?}", side.side, side.result);
//!     }
//!     eprintln!("total: ${:.4}", report.total.total_cost);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `arcx` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod cost;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::ExtractionClient;
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use cost::{CurrencyDisplay, Pricing, TokenUsage, UsageCost};
pub use error::{ArcExtractError, ExtractError, TransportKind};
pub use extract::{extract_card, CardImages, CardReport, SideReport};
pub use pipeline::encode::{encode_image, encode_payload, EncodedImage, ImagePayload};
pub use pipeline::llm::{BackendReply, OpenAiBackend, ProviderBackend, VisionBackend, VisionRequest};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use schema::{
    BackFields, ExtractionResult, FrontFields, Side, StayPeriod, StayTable, MASKED,
};
