// ── Core error types ──
//
// User-facing errors from omeview-core. Consumers never see raw HTTP
// status codes or JSON parse failures; the `From<omeview_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// Endpoint discovery, server lookup, or token fetch failed. The
    /// session cannot be used; reconnect from scratch.
    #[error("Session could not be established: {message}")]
    SessionFailed { message: String },

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("API error: {message}")]
    Api { message: String },
}

impl From<omeview_api::Error> for CoreError {
    fn from(err: omeview_api::Error) -> Self {
        if err.is_session_fatal() {
            Self::SessionFailed {
                message: err.to_string(),
            }
        } else {
            Self::Api {
                message: err.to_string(),
            }
        }
    }
}
