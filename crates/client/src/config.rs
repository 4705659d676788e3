// crates/client/src/config.rs
use std::time::Duration;

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote job service, without a trailing slash.
    /// `MEDIAMILL_API_URL` env var overrides the default.
    pub base_url: String,
    /// Per-request timeout for plain request/response calls. Never applied
    /// to the progress stream, which is long-lived by design.
    pub request_timeout: Duration,
}

/// Default service address when no override is configured.
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("MEDIAMILL_API_URL")
                .ok()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_url() {
        let config = ClientConfig::with_base_url("http://media.internal:9000");
        assert_eq!(config.base_url, "http://media.internal:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
