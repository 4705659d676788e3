//! Minimal stand-in for the remote job service: one listener serving the
//! SSE progress endpoint and the single-job read endpoint, with scripted
//! responses. mockito can't hold a streaming response open or sequence
//! bodies per request, which these tests need.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// How the fake serves `GET /api/jobs/{id}/progress`.
#[derive(Clone)]
pub enum SseMode {
    /// Write these already-formatted frames (with small gaps), then close.
    Frames(Vec<String>),
    /// Keep the stream open with keepalive comments only — never a data
    /// frame.
    Silent,
    /// Reject the stream with a 404.
    Refuse,
}

pub struct FakeService {
    pub base_url: String,
    /// Number of requests served by the poll endpoint.
    pub poll_hits: Arc<AtomicUsize>,
}

const SSE_HEADERS: &str = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncache-control: no-cache\r\nconnection: close\r\n\r\n";

fn json_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// SSE frame wrapping one JSON payload.
pub fn sse_frame(json: &str) -> String {
    format!("data: {json}\n\n")
}

/// Full job record JSON as the service's read endpoint returns it.
pub fn job_json(
    job_id: &str,
    status: &str,
    progress: u8,
    output_file: Option<&str>,
    error: Option<&str>,
) -> String {
    serde_json::json!({
        "job_id": job_id,
        "job_type": "image_convert",
        "status": status,
        "progress": progress,
        "output_file": output_file,
        "error": error,
        "created_at": "2026-02-05T12:00:00Z",
        "updated_at": "2026-02-05T12:00:05Z",
    })
    .to_string()
}

impl FakeService {
    /// `polls` are served in order by the read endpoint; the last one
    /// repeats for every further request.
    pub async fn spawn(sse: SseMode, polls: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let poll_hits = Arc::new(AtomicUsize::new(0));
        let polls = Arc::new(Mutex::new(polls));
        let hits = Arc::clone(&poll_hits);

        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let sse = sse.clone();
                let polls = Arc::clone(&polls);
                let hits = Arc::clone(&hits);
                tokio::spawn(async move {
                    handle(socket, sse, polls, hits).await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            poll_hits,
        }
    }

    pub fn poll_count(&self) -> usize {
        self.poll_hits.load(Ordering::SeqCst)
    }
}

async fn handle(
    mut socket: tokio::net::TcpStream,
    sse: SseMode,
    polls: Arc<Mutex<Vec<String>>>,
    hits: Arc<AtomicUsize>,
) {
    let mut buf = vec![0u8; 4096];
    let n = match socket.read(&mut buf).await {
        Ok(n) => n,
        Err(_) => return,
    };
    let request = String::from_utf8_lossy(&buf[..n]).into_owned();
    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

    if path.ends_with("/progress") {
        match sse {
            SseMode::Refuse => {
                let response =
                    json_response("404 Not Found", r#"{"detail":"stream unavailable"}"#);
                let _ = socket.write_all(response.as_bytes()).await;
            }
            SseMode::Frames(frames) => {
                if socket.write_all(SSE_HEADERS.as_bytes()).await.is_err() {
                    return;
                }
                for frame in frames {
                    if socket.write_all(frame.as_bytes()).await.is_err() {
                        return;
                    }
                    let _ = socket.flush().await;
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
            SseMode::Silent => {
                if socket.write_all(SSE_HEADERS.as_bytes()).await.is_err() {
                    return;
                }
                loop {
                    if socket.write_all(b": keepalive\n\n").await.is_err() {
                        return;
                    }
                    let _ = socket.flush().await;
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            }
        }
    } else {
        hits.fetch_add(1, Ordering::SeqCst);
        let body = {
            let mut polls = polls.lock().unwrap();
            if polls.len() > 1 {
                polls.remove(0)
            } else {
                polls
                    .first()
                    .cloned()
                    .unwrap_or_else(|| r#"{"detail":"Job not found"}"#.to_string())
            }
        };
        let _ = socket.write_all(json_response("200 OK", &body).as_bytes()).await;
    }
}
