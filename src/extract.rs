//! Orchestration: encode → extract → price for each supplied card side.
//!
//! The two sides are independent. Sequential mode (the default) finishes the
//! front, network round-trip included, before the back starts; parallel mode
//! runs both at once. Either way the reports come back front first and the
//! session total is the sum of the successful sides.

use crate::client::ExtractionClient;
use crate::config::ExtractionConfig;
use crate::cost::UsageCost;
use crate::error::{ArcExtractError, ExtractError};
use crate::pipeline::encode::{encode_payload, ImagePayload};
use crate::pipeline::input;
use crate::progress::ProgressCallback;
use crate::schema::{ExtractionResult, Side};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// The images supplied for one extraction pass.
#[derive(Debug, Clone)]
pub enum CardImages {
    /// Separate photos of the front and/or the back.
    Sides {
        front: Option<ImagePayload>,
        back: Option<ImagePayload>,
    },
    /// One photo showing both faces; sent once with each schema.
    Combined(ImagePayload),
}

impl CardImages {
    pub fn front(payload: ImagePayload) -> Self {
        CardImages::Sides {
            front: Some(payload),
            back: None,
        }
    }

    pub fn back(payload: ImagePayload) -> Self {
        CardImages::Sides {
            front: None,
            back: Some(payload),
        }
    }

    pub fn both(front: ImagePayload, back: ImagePayload) -> Self {
        CardImages::Sides {
            front: Some(front),
            back: Some(back),
        }
    }

    /// Load front and back images from disk.
    pub async fn from_paths(
        front: Option<&Path>,
        back: Option<&Path>,
    ) -> Result<Self, ArcExtractError> {
        let front = match front {
            Some(p) => Some(input::load_image(p).await?),
            None => None,
        };
        let back = match back {
            Some(p) => Some(input::load_image(p).await?),
            None => None,
        };
        if front.is_none() && back.is_none() {
            return Err(ArcExtractError::NoInput);
        }
        Ok(CardImages::Sides { front, back })
    }

    /// Load a single image showing both faces.
    pub async fn from_combined_path(path: &Path) -> Result<Self, ArcExtractError> {
        Ok(CardImages::Combined(input::load_image(path).await?))
    }

    /// Sides that will be processed, in display order.
    pub fn sides(&self) -> Vec<Side> {
        match self {
            CardImages::Sides { front, back } => {
                let mut sides = Vec::with_capacity(2);
                if front.is_some() {
                    sides.push(Side::Front);
                }
                if back.is_some() {
                    sides.push(Side::Back);
                }
                sides
            }
            CardImages::Combined(_) => Side::ALL.to_vec(),
        }
    }

    fn into_jobs(self) -> Vec<(Side, Arc<ImagePayload>)> {
        match self {
            CardImages::Sides { front, back } => front
                .map(|p| (Side::Front, Arc::new(p)))
                .into_iter()
                .chain(back.map(|p| (Side::Back, Arc::new(p))))
                .collect(),
            CardImages::Combined(payload) => {
                let shared = Arc::new(payload);
                Side::ALL
                    .iter()
                    .map(|&side| (side, Arc::clone(&shared)))
                    .collect()
            }
        }
    }
}

/// Outcome of one side.
///
/// Exactly one of `result` / `error` is set; `cost` accompanies `result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideReport {
    pub side: Side,
    pub result: Option<ExtractionResult>,
    pub cost: Option<UsageCost>,
    /// Wall-clock time for encode + call + parse.
    pub duration_ms: u64,
    pub error: Option<ExtractError>,
}

impl SideReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole pass over the supplied images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardReport {
    /// One entry per processed side, front first.
    pub sides: Vec<SideReport>,
    /// Sum over successful sides.
    pub total: UsageCost,
    pub total_duration_ms: u64,
}

impl CardReport {
    pub fn side(&self, side: Side) -> Option<&SideReport> {
        self.sides.iter().find(|r| r.side == side)
    }

    pub fn succeeded(&self) -> usize {
        self.sides.iter().filter(|r| r.is_success()).count()
    }

    pub fn all_failed(&self) -> bool {
        self.succeeded() == 0
    }
}

/// Run one extraction pass over the supplied card images.
///
/// # Errors
/// Only [`ArcExtractError::NoInput`] is fatal. Per-side failures are stored
/// in [`SideReport::error`] and never hide the other side's result.
pub async fn extract_card(
    client: &ExtractionClient,
    images: CardImages,
    config: &ExtractionConfig,
    progress: Option<&ProgressCallback>,
) -> Result<CardReport, ArcExtractError> {
    let total_start = Instant::now();
    let jobs = images.into_jobs();
    if jobs.is_empty() {
        return Err(ArcExtractError::NoInput);
    }

    info!(
        "Extracting {} side(s) via {} ({})",
        jobs.len(),
        client.backend_name(),
        if config.parallel_sides { "parallel" } else { "sequential" }
    );
    if let Some(cb) = progress {
        cb.on_extraction_start(jobs.len());
    }

    let sides = if config.parallel_sides {
        join_all(
            jobs.into_iter()
                .map(|(side, payload)| process_side(client, side, payload, progress)),
        )
        .await
    } else {
        let mut reports = Vec::with_capacity(jobs.len());
        for (side, payload) in jobs {
            reports.push(process_side(client, side, payload, progress).await);
        }
        reports
    };

    let total: UsageCost = sides.iter().filter_map(|r| r.cost.as_ref()).sum();
    let report = CardReport {
        sides,
        total,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {}/{} sides, ${:.4} total, {}ms",
        report.succeeded(),
        report.sides.len(),
        report.total.total_cost,
        report.total_duration_ms
    );
    if let Some(cb) = progress {
        cb.on_extraction_complete(report.sides.len(), report.succeeded());
    }

    Ok(report)
}

async fn process_side(
    client: &ExtractionClient,
    side: Side,
    payload: Arc<ImagePayload>,
    progress: Option<&ProgressCallback>,
) -> SideReport {
    if let Some(cb) = progress {
        cb.on_side_start(side);
    }
    let start = Instant::now();
    let outcome = run_side(client, side, payload).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok((result, cost)) => {
            if let Some(cb) = progress {
                cb.on_side_complete(side, duration_ms);
            }
            SideReport {
                side,
                result: Some(result),
                cost: Some(cost),
                duration_ms,
                error: None,
            }
        }
        Err(e) => {
            warn!("{} failed after {}ms: {}", side, duration_ms, e);
            if let Some(cb) = progress {
                cb.on_side_error(side, e.to_string());
            }
            SideReport {
                side,
                result: None,
                cost: None,
                duration_ms,
                error: Some(e),
            }
        }
    }
}

async fn run_side(
    client: &ExtractionClient,
    side: Side,
    payload: Arc<ImagePayload>,
) -> Result<(ExtractionResult, UsageCost), ExtractError> {
    // Decoding a full-resolution phone photo is CPU-bound.
    let encoded = tokio::task::spawn_blocking(move || encode_payload(&payload, side))
        .await
        .map_err(|e| ExtractError::Decode {
            side,
            detail: format!("encode task failed: {e}"),
        })??;

    client.extract(side, &encoded).await
}
