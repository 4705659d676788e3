// crates/client/src/lib.rs
//! HTTP and push-stream adapters for the remote job-processing service.

pub mod channel;
pub mod config;
pub mod error;
pub mod http;
pub mod sse;

pub use channel::{open_progress_channel, ChannelEvent};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::ApiClient;
pub use sse::{SseDecoder, SseFrame};
