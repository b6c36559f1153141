//! Progress-callback trait for per-side extraction events.
//!
//! Pass an [`Arc<dyn ExtractionProgressCallback>`] to
//! [`crate::extract::extract_card`] to hear when each side starts and
//! finishes. The CLI uses it to drive a spinner; a GUI could forward the
//! events to its own widgets.
//!
//! # Example
//!
//! ```rust
//! use arc_extract::{ExtractionProgressCallback, Side};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_side_complete(&self, side: Side, duration_ms: u64) {
//!         let n = self.done.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{side} done in {duration_ms}ms ({n} so far)");
//!     }
//! }
//! ```

use crate::schema::Side;
use std::sync::Arc;

/// Called by the orchestrator as it processes each side.
///
/// All methods default to no-ops. With
/// [`crate::ExtractionConfig::parallel_sides`] enabled, events for the two
/// sides may interleave.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any side is processed.
    fn on_extraction_start(&self, total_sides: usize) {
        let _ = total_sides;
    }

    /// Called just before a side is encoded and sent.
    fn on_side_start(&self, side: Side) {
        let _ = side;
    }

    /// Called when a side was extracted and parsed.
    fn on_side_complete(&self, side: Side, duration_ms: u64) {
        let _ = (side, duration_ms);
    }

    /// Called when a side failed.
    fn on_side_error(&self, side: Side, error: String) {
        let _ = (side, error);
    }

    /// Called once after every side finished.
    fn on_extraction_complete(&self, total_sides: usize, success_count: usize) {
        let _ = (total_sides, success_count);
    }
}

/// Callback that ignores every event.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Shared handle type used by the orchestrator.
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
