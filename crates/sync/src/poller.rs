// crates/sync/src/poller.rs
//! Pull-based fallback for a silent or broken progress channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use mediamill_client::ApiClient;
use mediamill_types::JobRecord;

use crate::store::JobStore;

/// Periodically reads one job's full record and feeds it through the
/// store's lifecycle-checked merge path.
///
/// Poll failures are logged and polling continues; the poller stops when
/// it observes a terminal record or the shared `active` flag (owned by
/// the parent subscription) is cleared.
pub struct FallbackPoller {
    client: ApiClient,
    store: Arc<JobStore>,
    job_id: String,
    ticker: Interval,
    active: Arc<AtomicBool>,
}

impl FallbackPoller {
    /// The first poll fires immediately; subsequent polls at `every`.
    ///
    /// `active` is checked before every store mutation; the parent
    /// subscription clears it on cancellation.
    pub fn start(
        client: ApiClient,
        store: Arc<JobStore>,
        job_id: impl Into<String>,
        every: Duration,
        active: Arc<AtomicBool>,
    ) -> Self {
        let job_id = job_id.into();
        debug!(%job_id, interval_ms = every.as_millis() as u64, "fallback poller started");
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            client,
            store,
            job_id,
            ticker,
            active,
        }
    }

    /// Wait for the next tick, then poll and apply once.
    ///
    /// Returns the polled record when it is terminal, `None` otherwise
    /// (including on poll errors, which are best-effort retried next
    /// tick, and after deactivation, which skips the store entirely).
    pub async fn poll_next(&mut self) -> Option<JobRecord> {
        self.ticker.tick().await;
        if !self.active.load(Ordering::SeqCst) {
            return None;
        }
        match self.client.get_job(&self.job_id).await {
            Ok(record) => {
                if !self.active.load(Ordering::SeqCst) {
                    return None;
                }
                self.store.upsert(record.clone());
                record.is_terminal().then_some(record)
            }
            Err(e) => {
                warn!(job_id = %self.job_id, error = %e, "poll failed; will retry");
                None
            }
        }
    }

    /// Poll until a terminal record is observed or the poller is
    /// deactivated.
    pub async fn run(mut self) -> Option<JobRecord> {
        loop {
            if let Some(record) = self.poll_next().await {
                return Some(record);
            }
            if !self.active.load(Ordering::SeqCst) {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediamill_types::{JobStatus, JobType};

    fn job_json(status: &str, progress: u8) -> String {
        serde_json::json!({
            "job_id": "j-1",
            "job_type": "video_convert",
            "status": status,
            "progress": progress,
            "created_at": "2026-02-05T12:00:00Z",
            "updated_at": "2026-02-05T12:00:05Z"
        })
        .to_string()
    }

    fn live_flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    #[tokio::test]
    async fn test_poller_applies_and_stops_on_terminal() {
        use std::sync::atomic::AtomicUsize;

        let mut server = mockito::Server::new_async().await;
        // First poll sees the job in flight, the second sees it done.
        let polls = AtomicUsize::new(0);
        let _mock = server
            .mock("GET", "/api/jobs/j-1")
            .with_status(200)
            .with_body_from_request(move |_| {
                if polls.fetch_add(1, Ordering::SeqCst) == 0 {
                    job_json("processing", 70).into_bytes()
                } else {
                    job_json("completed", 100).into_bytes()
                }
            })
            .create_async()
            .await;

        let client = ApiClient::with_base_url(server.url()).unwrap();
        let store = Arc::new(JobStore::new());
        let mut poller = FallbackPoller::start(
            client,
            Arc::clone(&store),
            "j-1",
            Duration::from_millis(10),
            live_flag(),
        );

        assert!(poller.poll_next().await.is_none());
        assert_eq!(store.get("j-1").unwrap().status, JobStatus::Processing);

        let record = poller.poll_next().await.expect("terminal on second poll");
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(store.get("j-1").unwrap().progress, 100);
    }

    #[tokio::test]
    async fn test_poller_continues_past_errors() {
        use std::sync::atomic::AtomicUsize;

        let mut server = mockito::Server::new_async().await;
        // First poll gets garbage (decode failure), the second a terminal
        // record: best-effort continuation must survive the first.
        let polls = AtomicUsize::new(0);
        let _mock = server
            .mock("GET", "/api/jobs/j-1")
            .with_status(200)
            .with_body_from_request(move |_| {
                if polls.fetch_add(1, Ordering::SeqCst) == 0 {
                    b"not json at all".to_vec()
                } else {
                    job_json("cancelled", 40).into_bytes()
                }
            })
            .create_async()
            .await;

        let client = ApiClient::with_base_url(server.url()).unwrap();
        let store = Arc::new(JobStore::new());
        store.insert(JobRecord::submitted("j-1", JobType::VideoConvert));

        let poller = FallbackPoller::start(
            client,
            Arc::clone(&store),
            "j-1",
            Duration::from_millis(10),
            live_flag(),
        );
        let record = poller.run().await.expect("terminal record");

        assert_eq!(record.status, JobStatus::Cancelled);
        assert_eq!(store.get("j-1").unwrap().status, JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_deactivated_poller_leaves_store_alone() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/jobs/j-1")
            .with_status(200)
            .with_body(job_json("completed", 100))
            .create_async()
            .await;

        let client = ApiClient::with_base_url(server.url()).unwrap();
        let store = Arc::new(JobStore::new());
        let active = live_flag();
        let mut poller = FallbackPoller::start(
            client,
            Arc::clone(&store),
            "j-1",
            Duration::from_millis(10),
            Arc::clone(&active),
        );

        active.store(false, Ordering::SeqCst);
        assert!(poller.poll_next().await.is_none());
        assert!(store.is_empty());
    }
}
