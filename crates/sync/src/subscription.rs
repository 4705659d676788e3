// crates/sync/src/subscription.rs
//! Subscription manager: composes the push channel and the fallback
//! poller into one cancelable subscription per job id.
//!
//! The manager holds no job state of its own — every inbound update goes
//! through the store's lifecycle-checked merge path. Its job is
//! orchestration: when to fall back, when the subscription is over, and
//! making sure the terminal callback fires exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use mediamill_client::{open_progress_channel, ApiClient, ApiError, ChannelEvent};
use mediamill_types::{
    JobListPage, JobRecord, JobRequest, JobStatus, JobSubmission, JobUpdate,
};

use crate::config::SyncConfig;
use crate::poller::FallbackPoller;
use crate::store::JobStore;

/// Fired exactly once per subscription with the final update fields,
/// whichever source produced them.
pub type TerminalCallback = Box<dyn FnOnce(JobUpdate) + Send + 'static>;

/// Fired at most once, only when the job ends in `failed`, with the
/// record's error text.
pub type ErrorCallback = Box<dyn FnOnce(String) + Send + 'static>;

type Registry = Arc<Mutex<HashMap<String, Arc<SubscriptionInner>>>>;

struct SubscriptionInner {
    job_id: String,
    /// Cleared by `cancel()` and checked before every effect. Also cleared
    /// when the subscription finishes on its own. Shared with the fallback
    /// poller so a cancelled subscription's in-flight poll cannot touch
    /// the store.
    active: Arc<AtomicBool>,
    /// Once-latch for the terminal callback.
    terminal_fired: AtomicBool,
    on_terminal: Mutex<Option<TerminalCallback>>,
    on_error: Mutex<Option<ErrorCallback>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriptionInner {
    fn new(
        job_id: String,
        on_terminal: Option<TerminalCallback>,
        on_error: Option<ErrorCallback>,
    ) -> Self {
        Self {
            job_id,
            active: Arc::new(AtomicBool::new(true)),
            terminal_fired: AtomicBool::new(false),
            on_terminal: Mutex::new(on_terminal),
            on_error: Mutex::new(on_error),
            driver: Mutex::new(None),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Idempotent. Synchronously detaches the driver (channel + poller)
    /// and drops both callbacks, so nothing attributable to this
    /// subscription runs afterwards.
    fn cancel(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        match self.driver.lock() {
            Ok(mut driver) => {
                if let Some(task) = driver.take() {
                    task.abort();
                }
            }
            Err(e) => tracing::error!("Mutex poisoned taking driver handle: {e}"),
        }
        if let Ok(mut cb) = self.on_terminal.lock() {
            cb.take();
        }
        if let Ok(mut cb) = self.on_error.lock() {
            cb.take();
        }
        debug!(job_id = %self.job_id, "subscription cancelled");
    }
}

/// Handle to one live subscription. Dropping the handle does NOT cancel —
/// tracking continues in the background until terminal; call
/// [`Subscription::cancel`] to stop it.
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
    registry: Registry,
}

impl Subscription {
    pub fn job_id(&self) -> &str {
        &self.inner.job_id
    }

    /// False once cancelled or finished.
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    /// Stop tracking this job. Idempotent; no callbacks fire after this
    /// returns.
    pub fn cancel(&self) {
        self.inner.cancel();
        if let Ok(mut registry) = self.registry.lock() {
            let ours = registry
                .get(&self.inner.job_id)
                .is_some_and(|current| Arc::ptr_eq(current, &self.inner));
            if ours {
                registry.remove(&self.inner.job_id);
            }
        }
    }
}

/// Owns all live subscriptions: one progress channel and at most one
/// fallback poller per job id.
pub struct SubscriptionManager {
    client: ApiClient,
    store: Arc<JobStore>,
    config: SyncConfig,
    registry: Registry,
}

impl SubscriptionManager {
    pub fn new(client: ApiClient, store: Arc<JobStore>, config: SyncConfig) -> Self {
        Self {
            client,
            store,
            config,
            registry: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Track a job without callbacks; the store's change feed is the way
    /// to observe it.
    pub fn subscribe(&self, job_id: &str) -> Subscription {
        self.subscribe_with(job_id, None, None)
    }

    /// Track a job. Subscribing to an id that is already tracked cancels
    /// and replaces the previous subscription, keeping at most one per id.
    pub fn subscribe_with(
        &self,
        job_id: &str,
        on_terminal: Option<TerminalCallback>,
        on_error: Option<ErrorCallback>,
    ) -> Subscription {
        let inner = Arc::new(SubscriptionInner::new(
            job_id.to_string(),
            on_terminal,
            on_error,
        ));

        let previous = match self.registry.lock() {
            Ok(mut registry) => registry.insert(job_id.to_string(), Arc::clone(&inner)),
            Err(e) => {
                tracing::error!("Mutex poisoned registering subscription: {e}");
                None
            }
        };
        if let Some(previous) = previous {
            warn!(%job_id, "replacing existing subscription for job");
            previous.cancel();
        }

        let driver = tokio::spawn(drive(
            self.client.clone(),
            Arc::clone(&self.store),
            self.config.clone(),
            Arc::clone(&inner),
            Arc::clone(&self.registry),
        ));
        match inner.driver.lock() {
            Ok(mut slot) => *slot = Some(driver),
            Err(e) => tracing::error!("Mutex poisoned storing driver handle: {e}"),
        }

        Subscription {
            inner,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Submit a job, insert its pending record into the store, and start
    /// tracking it.
    pub async fn submit(
        &self,
        request: &JobRequest,
    ) -> Result<(JobRecord, Subscription), ApiError> {
        self.submit_with(request, None, None).await
    }

    pub async fn submit_with(
        &self,
        request: &JobRequest,
        on_terminal: Option<TerminalCallback>,
        on_error: Option<ErrorCallback>,
    ) -> Result<(JobRecord, Subscription), ApiError> {
        let submission = self.client.submit(request).await?;

        let mut record = JobRecord::submitted(&submission.job_id, request.job_type());
        record.status = submission.status;
        record.progress = submission.progress;
        record.message = submission.message;
        self.store.insert(record.clone());

        let subscription = self.subscribe_with(&submission.job_id, on_terminal, on_error);
        Ok((record, subscription))
    }

    /// Pull one page of job history from the service and merge it into the
    /// store.
    pub async fn refresh(&self, page: u32, page_size: u32) -> Result<JobListPage, ApiError> {
        let listing = self.client.list_jobs(page, page_size).await?;
        self.store.sync_from(listing.jobs.clone());
        Ok(listing)
    }

    /// Ask the service to cancel a job, applying the acknowledged status
    /// through the normal update path. Any live subscription for the id
    /// observes the `cancelled` terminal state through its own sources.
    pub async fn cancel_job(&self, job_id: &str) -> Result<JobSubmission, ApiError> {
        let ack = self.client.cancel_job(job_id).await?;
        self.store.apply_update(
            job_id,
            JobUpdate {
                status: Some(ack.status),
                progress: Some(i64::from(ack.progress)),
                message: ack.message.clone(),
                ..JobUpdate::default()
            },
        );
        Ok(ack)
    }

    /// Whether a live subscription exists for this id.
    pub fn is_subscribed(&self, job_id: &str) -> bool {
        match self.registry.lock() {
            Ok(registry) => registry.contains_key(job_id),
            Err(e) => {
                tracing::error!("Mutex poisoned reading registry: {e}");
                false
            }
        }
    }

    pub fn subscription_count(&self) -> usize {
        match self.registry.lock() {
            Ok(registry) => registry.len(),
            Err(e) => {
                tracing::error!("Mutex poisoned reading registry: {e}");
                0
            }
        }
    }
}

// ── Driver ──────────────────────────────────────────────────────────────

/// Next terminal poll result, or never if the poller hasn't started.
async fn next_poll(poller: &mut Option<FallbackPoller>) -> Option<JobRecord> {
    match poller.as_mut() {
        Some(poller) => poller.poll_next().await,
        None => std::future::pending().await,
    }
}

/// One task per subscription: consume the progress channel, start the
/// fallback poller on grace expiry or channel failure, stop on the first
/// terminal update from either source.
async fn drive(
    client: ApiClient,
    store: Arc<JobStore>,
    config: SyncConfig,
    sub: Arc<SubscriptionInner>,
    registry: Registry,
) {
    let job_id = sub.job_id.clone();

    let channel = open_progress_channel(&client, &job_id);
    futures_util::pin_mut!(channel);

    let grace = tokio::time::sleep(config.channel_grace);
    tokio::pin!(grace);

    let mut channel_open = true;
    let mut grace_elapsed = false;
    let mut poller: Option<FallbackPoller> = None;
    let start_poller = || {
        FallbackPoller::start(
            client.clone(),
            Arc::clone(&store),
            job_id.clone(),
            config.poll_interval,
            Arc::clone(&sub.active),
        )
    };

    let terminal: JobUpdate = loop {
        tokio::select! {
            event = channel.next(), if channel_open => match event {
                Some(ChannelEvent::Update(update)) => {
                    let is_terminal = update.status.is_some_and(|s| s.is_terminal());
                    if sub.is_active() {
                        store.apply_update(&job_id, update.clone());
                    }
                    if is_terminal {
                        break update;
                    }
                }
                Some(ChannelEvent::Error(e)) => {
                    warn!(%job_id, error = %e,
                          "progress channel failed; falling back to polling");
                    channel_open = false;
                    if poller.is_none() {
                        poller = Some(start_poller());
                    }
                }
                Some(ChannelEvent::Closed) | None => {
                    debug!(%job_id,
                           "progress channel closed before terminal status; falling back to polling");
                    channel_open = false;
                    if poller.is_none() {
                        poller = Some(start_poller());
                    }
                }
            },
            _ = &mut grace, if !grace_elapsed => {
                grace_elapsed = true;
                if poller.is_none() {
                    debug!(%job_id, "no terminal status within grace period; starting fallback poller");
                    poller = Some(start_poller());
                }
            },
            record = next_poll(&mut poller) => {
                if let Some(record) = record {
                    break JobUpdate::from(record);
                }
            },
        }
    };

    finish(&sub, &registry, terminal);
}

/// Deliver the terminal callbacks (once) and retire the subscription.
fn finish(sub: &Arc<SubscriptionInner>, registry: &Registry, terminal: JobUpdate) {
    // Leave the registry slot alone if a replacement already took it.
    if let Ok(mut registry) = registry.lock() {
        let ours = registry
            .get(&sub.job_id)
            .is_some_and(|current| Arc::ptr_eq(current, sub));
        if ours {
            registry.remove(&sub.job_id);
        }
    }

    if !sub.is_active() {
        return;
    }
    if sub.terminal_fired.swap(true, Ordering::SeqCst) {
        return;
    }
    // Retire before delivering: the subscription is over by the time its
    // callbacks observe it.
    sub.active.store(false, Ordering::SeqCst);

    debug!(job_id = %sub.job_id, status = ?terminal.status, "job reached terminal state");

    let failed = terminal.status == Some(JobStatus::Failed);
    let error_text = terminal.error.clone();

    if let Ok(mut cb) = sub.on_terminal.lock() {
        if let Some(cb) = cb.take() {
            cb(terminal);
        }
    }
    if failed {
        if let Ok(mut cb) = sub.on_error.lock() {
            if let Some(cb) = cb.take() {
                cb(error_text.unwrap_or_else(|| "Job failed".to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent() {
        let inner = SubscriptionInner::new("j-1".into(), None, None);
        assert!(inner.is_active());
        inner.cancel();
        assert!(!inner.is_active());
        // Second cancel is a no-op.
        inner.cancel();
        assert!(!inner.is_active());
    }

    #[test]
    fn test_cancel_drops_callbacks() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        let inner = SubscriptionInner::new(
            "j-1".into(),
            Some(Box::new(move |_| fired_clone.store(true, Ordering::SeqCst))),
            None,
        );
        inner.cancel();
        assert!(inner.on_terminal.lock().unwrap().is_none());
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_finish_fires_terminal_once() {
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let sub = Arc::new(SubscriptionInner::new(
            "j-1".into(),
            Some(Box::new(move |_| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            })),
            None,
        ));
        let registry: Registry = Arc::new(Mutex::new(HashMap::new()));

        finish(&sub, &registry, JobUpdate::status(JobStatus::Completed));
        finish(&sub, &registry, JobUpdate::status(JobStatus::Completed));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!sub.is_active());
    }

    #[test]
    fn test_finish_fires_error_callback_only_for_failed() {
        let error_text = Arc::new(Mutex::new(None::<String>));
        let error_clone = Arc::clone(&error_text);
        let sub = Arc::new(SubscriptionInner::new(
            "j-1".into(),
            None,
            Some(Box::new(move |msg| {
                *error_clone.lock().unwrap() = Some(msg);
            })),
        ));
        let registry: Registry = Arc::new(Mutex::new(HashMap::new()));

        let mut update = JobUpdate::status(JobStatus::Failed);
        update.error = Some("codec exploded".into());
        finish(&sub, &registry, update);

        assert_eq!(
            error_text.lock().unwrap().as_deref(),
            Some("codec exploded")
        );
    }

    #[test]
    fn test_finish_after_cancel_is_silent() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        let sub = Arc::new(SubscriptionInner::new(
            "j-1".into(),
            Some(Box::new(move |_| fired_clone.store(true, Ordering::SeqCst))),
            None,
        ));
        let registry: Registry = Arc::new(Mutex::new(HashMap::new()));

        sub.cancel();
        finish(&sub, &registry, JobUpdate::status(JobStatus::Completed));

        assert!(!fired.load(Ordering::SeqCst));
    }
}
