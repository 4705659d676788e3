// crates/client/src/error.rs
use thiserror::Error;

/// Errors produced by the HTTP adapter.
///
/// Only [`ApiError::Api`] carries anything a user should ever see; the
/// transport and decode variants are recovered from locally (fallback
/// polling) or logged by the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to initialize HTTP client: {source}")]
    Init {
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response, with the service's `detail` body already
    /// normalized into one human-readable message.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    pub fn decode(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// True for failures the synchronization layer recovers from by
    /// falling back to polling.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
