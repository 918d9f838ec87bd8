use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::kind::ResourceKind;

/// Status line and body of a response the transport refused to decode.
///
/// Kept verbatim so callers can inspect what the remote side said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub method: String,
    pub url: String,
    pub body: String,
}

impl fmt::Display for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> HTTP {}", self.method, self.url, self.status)?;
        if !self.body.is_empty() {
            write!(f, ": {}", preview(&self.body))?;
        }
        Ok(())
    }
}

/// First 200 characters of a body, for log lines and error messages.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Top-level error type for the `threescale-api` crate.
///
/// Transport and extraction errors propagate unchanged through the manager
/// and resource layers; nothing in this crate downgrades them.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Missing or unusable credential at construction time.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Remote answered 404.
    #[error("Resource not found: {0}")]
    NotFound(RawResponse),

    /// Remote answered 403.
    #[error("Access forbidden: {0}")]
    Forbidden(RawResponse),

    /// Any status other than 2xx, 403, 404 or 422.
    #[error("Unhandled response: {0}")]
    UnhandledResponse(RawResponse),

    // ── Data ────────────────────────────────────────────────────────
    /// Body could not be decoded, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request body could not be encoded.
    #[error("Encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Body shape is neither a sequence, a mapping, nor null.
    #[error("Unrecognized response: {message}")]
    UnrecognizedResponse { message: String },

    /// A collection envelope was expected but its key is absent.
    #[error("Response has no '{key}' collection")]
    MissingCollection { key: String },

    /// Remote validation payload (`error` / `errors` attribute).
    #[error("API error: {message}")]
    Api { message: String, payload: Value },

    // ── Caller contract ─────────────────────────────────────────────
    /// Operation needs an id that neither the handle nor the attributes carry.
    #[error("{kind} has no id")]
    MissingId { kind: ResourceKind },

    /// A scoped manager was built without one of its ancestor ids.
    #[error("{kind} manager requires a {parent} in scope")]
    MissingScope {
        kind: ResourceKind,
        parent: ResourceKind,
    },

    /// Client-side lookup matched nothing.
    #[error("No {kind} matching '{key}'")]
    Missing { kind: ResourceKind, key: String },
}

impl Error {
    /// Returns `true` for a remote 404 or a client-side lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Missing { .. })
    }

    /// Returns `true` for a remote 403.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Nothing in this crate retries; the flag exists for callers that wrap
    /// calls in their own backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::UnhandledResponse(raw) => matches!(raw.status, 429 | 502..=504),
            _ => false,
        }
    }

    /// The raw response behind a status-classified error, if any.
    pub fn raw_response(&self) -> Option<&RawResponse> {
        match self {
            Self::NotFound(raw) | Self::Forbidden(raw) | Self::UnhandledResponse(raw) => Some(raw),
            _ => None,
        }
    }
}
