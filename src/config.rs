//! Configuration types for card extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Credentials are deliberately not part
//! of the config: the caller passes the key straight to
//! [`crate::pipeline::llm::OpenAiBackend::new`] once at startup.

use crate::cost::{CurrencyDisplay, Pricing};
use crate::error::ArcExtractError;
use serde::{Deserialize, Serialize};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default base URL of the OpenAI-compatible chat-completions API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Configuration for one extraction session.
///
/// # Example
/// ```rust
/// use arc_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4o-mini")
///     .input_per_1k(0.00015)
///     .output_per_1k(0.0006)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gpt-4o-mini");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Model identifier sent with every request. Default: `gpt-4o`.
    pub model: String,

    /// Base URL of the chat-completions API, without the `/chat/completions`
    /// suffix. Default: `https://api.openai.com/v1`.
    pub api_base: String,

    /// Sampling temperature. `None` leaves the provider default.
    pub temperature: Option<f32>,

    /// Upper bound on generated tokens. `None` leaves the provider default.
    pub max_tokens: Option<usize>,

    /// Per-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Token prices used for the cost estimate.
    pub pricing: Pricing,

    /// Local-currency conversion shown next to USD totals.
    pub currency: CurrencyDisplay,

    /// Run the front and back calls concurrently. Default: false.
    ///
    /// The two sides share no state, so the only visible difference is
    /// wall-clock time. Reports are always ordered front, then back.
    pub parallel_sides: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            temperature: None,
            max_tokens: None,
            api_timeout_secs: 60,
            pricing: Pricing::default(),
            currency: CurrencyDisplay::default(),
            parallel_sides: false,
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full chat-completions endpoint URL.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = url.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn pricing(mut self, pricing: Pricing) -> Self {
        self.config.pricing = pricing;
        self
    }

    pub fn input_per_1k(mut self, usd: f64) -> Self {
        self.config.pricing.input_per_1k = usd;
        self
    }

    pub fn output_per_1k(mut self, usd: f64) -> Self {
        self.config.pricing.output_per_1k = usd;
        self
    }

    pub fn exchange_rate(mut self, rate: f64) -> Self {
        self.config.currency.rate = rate;
        self
    }

    pub fn currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.config.currency.symbol = symbol.into();
        self
    }

    pub fn parallel_sides(mut self, v: bool) -> Self {
        self.config.parallel_sides = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ArcExtractError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ArcExtractError::InvalidConfig(
                "model must not be empty".into(),
            ));
        }
        if !(c.api_base.starts_with("http://") || c.api_base.starts_with("https://")) {
            return Err(ArcExtractError::InvalidConfig(format!(
                "api base must be an HTTP/HTTPS URL, got '{}'",
                c.api_base
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(ArcExtractError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        let rates = [
            ("input price", c.pricing.input_per_1k),
            ("output price", c.pricing.output_per_1k),
            ("exchange rate", c.currency.rate),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(ArcExtractError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_gpt4o_pricing() {
        let c = ExtractionConfig::default();
        assert_eq!(c.model, "gpt-4o");
        assert_eq!(c.pricing.input_per_1k, 0.0025);
        assert_eq!(c.pricing.output_per_1k, 0.01);
        assert_eq!(c.currency.rate, 1447.0);
        assert!(!c.parallel_sides);
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let c = ExtractionConfig::builder()
            .api_base("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(c.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn rejects_negative_rate() {
        let err = ExtractionConfig::builder()
            .output_per_1k(-1.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("output price"), "got: {err}");
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(ExtractionConfig::builder()
            .api_base("ftp://example.com")
            .build()
            .is_err());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ExtractionConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, Some(2.0));
    }
}
