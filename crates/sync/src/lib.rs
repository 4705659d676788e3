// crates/sync/src/lib.rs
//! Job progress synchronization: a bounded reactive store of job records,
//! fed by per-job subscriptions that consume the service's push stream
//! with automatic fallback to polling.
//!
//! ```no_run
//! use std::sync::Arc;
//! use mediamill_client::{ApiClient, ClientConfig};
//! use mediamill_sync::{JobStore, SubscriptionManager, SyncConfig};
//!
//! # async fn demo() -> Result<(), mediamill_client::ApiError> {
//! let client = ApiClient::new(ClientConfig::default())?;
//! let store = Arc::new(JobStore::new());
//! let manager = SubscriptionManager::new(client, Arc::clone(&store), SyncConfig::default());
//!
//! // Track a job the service already knows about. UI surfaces render
//! // from the store and react to its change feed; cancel on unmount.
//! let subscription = manager.subscribe("job-123");
//! let _changes = store.subscribe();
//! subscription.cancel();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod poller;
pub mod store;
pub mod subscription;

pub use config::SyncConfig;
pub use poller::FallbackPoller;
pub use store::{
    ApplyOutcome, JobStore, StatusCounts, StoreEvent, MAX_TRACKED_JOBS, RECENT_JOBS_WINDOW,
};
pub use subscription::{
    ErrorCallback, Subscription, SubscriptionManager, TerminalCallback,
};
