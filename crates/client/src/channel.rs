// crates/client/src/channel.rs
//! Progress channel: the push half of job synchronization.
//!
//! Opens the service's SSE endpoint for one job id and turns it into a
//! stream of [`ChannelEvent`]s. The channel never reconnects on its own;
//! deciding what to do after an error or early close belongs to the
//! subscription layer.

use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use mediamill_types::JobUpdate;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::sse::SseDecoder;

/// What the progress channel observed.
#[derive(Debug)]
pub enum ChannelEvent {
    /// One parsed update frame. If it carries a terminal status the stream
    /// ends right after yielding it.
    Update(JobUpdate),
    /// The server closed the stream without a terminal status; the caller
    /// should fall back to polling.
    Closed,
    /// Transport-level failure; the stream ends. Never user-visible by
    /// itself.
    Error(ApiError),
}

/// Open the push stream for one job.
///
/// Frames that fail to parse are logged and skipped — one bad frame does
/// not tear down the connection.
pub fn open_progress_channel(
    client: &ApiClient,
    job_id: &str,
) -> impl Stream<Item = ChannelEvent> + Send + 'static {
    let (url, request) = client.progress_request(job_id);
    let job_id = job_id.to_string();

    async_stream::stream! {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                yield ChannelEvent::Error(ApiError::transport(&url, e));
                return;
            }
        };
        let response = match ApiClient::check(response, &url).await {
            Ok(response) => response,
            Err(e) => {
                yield ChannelEvent::Error(e);
                return;
            }
        };

        debug!(%job_id, "progress channel open");

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield ChannelEvent::Error(ApiError::transport(&url, e));
                    return;
                }
            };

            for frame in decoder.push(&chunk) {
                match serde_json::from_str::<JobUpdate>(&frame.data) {
                    Ok(update) => {
                        let terminal =
                            update.status.is_some_and(|status| status.is_terminal());
                        yield ChannelEvent::Update(update);
                        if terminal {
                            // Terminal status observed: close the
                            // connection rather than wait for the server.
                            debug!(%job_id, "progress channel saw terminal status");
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(%job_id, error = %e, frame = %frame.data,
                              "discarding malformed progress frame");
                    }
                }
            }
        }

        yield ChannelEvent::Closed;
    }
}
