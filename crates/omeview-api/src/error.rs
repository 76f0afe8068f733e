use thiserror::Error;

/// Top-level error type for the `omeview-api` crate.
///
/// Covers every failure mode across the request engine: transport, session
/// establishment, decoding, and the ROI write surface. Collection-returning
/// operations swallow these internally (logged, empty result); single-value
/// operations surface them so `omeview-core` can map them into domain
/// diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The server answered with a non-200 status.
    #[error("Request to {url} failed with HTTP {status}")]
    Status { status: u16, url: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The response bytes could not be decoded as a raster image.
    #[error("Image decoding failed: {0}")]
    ImageDecode(String),

    // ── Session establishment ───────────────────────────────────────
    /// Endpoint discovery, server lookup, or token fetch failed.
    /// Fatal to the session; the caller must create a new one.
    #[error("Session initialization failed: {message}")]
    SessionInit { message: String },

    /// The discovered endpoint map is missing a required key.
    #[error("Endpoint map has no entry for {key}")]
    MissingEndpoint { key: &'static str },
}

impl Error {
    /// Returns `true` if this error is fatal to the whole session
    /// (the caller must discard the client and reconnect).
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::SessionInit { .. } | Self::MissingEndpoint { .. })
    }
}
