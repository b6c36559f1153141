//! Error types for the arc-extract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ArcExtractError`] (fatal): nothing can be extracted at all (file
//!   missing, not an image, provider not configured). Returned as
//!   `Err(ArcExtractError)` from the loaders and constructors.
//!
//! * [`ExtractError`] (per side): the front or the back failed (decode,
//!   transport, parse) but the other side may still be fine. Stored inside
//!   [`crate::extract::SideReport`] so one bad side never hides a good one.

use crate::schema::Side;
use edgequake_llm::LlmError;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the arc-extract library.
#[derive(Debug, Error)]
pub enum ArcExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is neither JPEG nor PNG.
    #[error("File is not a JPEG or PNG image: '{path}'\nFirst bytes: {magic:02X?}")]
    UnsupportedImage { path: PathBuf, magic: Vec<u8> },

    /// Neither a front, a back, nor a combined image was supplied.
    #[error("No card image supplied.\nProvide --front and/or --back, or --combined.")]
    NoInput,

    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured provider could not be initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The HTTP client could not be built (TLS backend, bad timeout).
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification of a failed call to the extraction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TransportKind {
    /// Connection refused, DNS failure, TLS error.
    Network,
    /// The call exceeded the configured API timeout.
    Timeout,
    /// HTTP 401/403.
    Auth,
    /// HTTP 429.
    RateLimited,
    /// Any other non-success HTTP status.
    Service(u16),
    /// A provider-layer failure with no HTTP status attached (bad request,
    /// unknown model, unsupported feature).
    Provider,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Network => f.write_str("network error"),
            TransportKind::Timeout => f.write_str("timeout"),
            TransportKind::Auth => f.write_str("authentication error"),
            TransportKind::RateLimited => f.write_str("rate limit exceeded"),
            TransportKind::Service(status) => write!(f, "HTTP {status}"),
            TransportKind::Provider => f.write_str("provider error"),
        }
    }
}

impl TransportKind {
    /// Map an HTTP status code to a transport kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => TransportKind::Auth,
            429 => TransportKind::RateLimited,
            other => TransportKind::Service(other),
        }
    }

    /// Classify an `edgequake-llm` provider error.
    pub fn from_llm_error(err: &LlmError) -> Self {
        match err {
            LlmError::AuthError(_) => TransportKind::Auth,
            LlmError::RateLimited(_) => TransportKind::RateLimited,
            LlmError::Timeout => TransportKind::Timeout,
            LlmError::NetworkError(_) => TransportKind::Network,
            _ => TransportKind::Provider,
        }
    }
}

/// A non-fatal error for a single card side.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractError {
    /// Image bytes could not be decoded or re-encoded as PNG.
    #[error("{side}: image decoding failed: {detail}")]
    Decode { side: Side, detail: String },

    /// The call to the extraction service failed. Not retried.
    #[error("{side}: extraction service call failed ({kind}): {detail}")]
    Transport {
        side: Side,
        kind: TransportKind,
        detail: String,
    },

    /// The service answered, but not with the declared JSON object.
    #[error("{side}: response is not a valid {side} result: {detail}")]
    Parse {
        side: Side,
        detail: String,
        /// The unmodified response body.
        raw: String,
    },
}

impl ExtractError {
    /// The card side this error belongs to.
    pub fn side(&self) -> Side {
        match self {
            ExtractError::Decode { side, .. }
            | ExtractError::Transport { side, .. }
            | ExtractError::Parse { side, .. } => *side,
        }
    }
}
