// crates/sync/src/config.rs
use std::time::Duration;

/// Timing knobs for job subscriptions.
///
/// The defaults match the remote service's observed cadence. They are
/// global, not per job type; tests shorten them.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How long the progress channel may stay silent of terminal news
    /// before the fallback poller starts alongside it.
    pub channel_grace: Duration,
    /// Fixed interval between fallback polls.
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channel_grace: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.channel_grace, Duration::from_secs(2));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }
}
