//! The extraction client: one call per card side.

use crate::cost::{Pricing, UsageCost};
use crate::error::ExtractError;
use crate::pipeline::encode::EncodedImage;
use crate::pipeline::llm::{VisionBackend, VisionRequest};
use crate::pipeline::parse::parse_response;
use crate::prompts;
use crate::schema::{ExtractionResult, Side};
use std::sync::Arc;
use tracing::debug;

/// Sends side-specific requests through a [`VisionBackend`] and prices the
/// reported token usage.
///
/// Construct once at startup and share; it holds no per-call state.
#[derive(Clone)]
pub struct ExtractionClient {
    backend: Arc<dyn VisionBackend>,
    pricing: Pricing,
}

impl ExtractionClient {
    pub fn new(backend: Arc<dyn VisionBackend>, pricing: Pricing) -> Self {
        Self { backend, pricing }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn pricing(&self) -> Pricing {
        self.pricing
    }

    /// Extract one side of the card.
    ///
    /// The side selects both the instruction text and the schema the answer
    /// is parsed against.
    pub async fn extract(
        &self,
        side: Side,
        image: &EncodedImage,
    ) -> Result<(ExtractionResult, UsageCost), ExtractError> {
        let request = VisionRequest {
            side,
            system_prompt: prompts::system_prompt(side),
            user_prompt: prompts::user_prompt(side),
            image,
        };

        let reply = self.backend.complete(request).await?;
        let result = parse_response(side, &reply.content)?;
        let cost = self.pricing.estimate_usage(reply.usage);

        debug!(
            "{}: parsed via {}, {} masked value(s), ${:.4}",
            side,
            self.backend.name(),
            result.masked_count(),
            cost.total_cost
        );
        Ok((result, cost))
    }
}

impl std::fmt::Debug for ExtractionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionClient")
            .field("backend", &self.backend.name())
            .field("pricing", &self.pricing)
            .finish()
    }
}
