// crates/client/src/http.rs
//! HTTP adapter for the remote job-processing service.
//!
//! Every operation normalizes failures into [`ApiError`]: non-2xx bodies
//! are collapsed into a single message via [`ErrorBody`], transport and
//! decode failures keep their `reqwest` source attached. No raw transport
//! error crosses this boundary.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use mediamill_types::{
    BatchRequest, BatchSubmission, ErrorBody, JobListPage, JobRecord, JobRequest, JobSubmission,
    UploadedFile,
};

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Client for the remote job service. Cheap to clone; the underlying
/// connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|source| ApiError::Init { source })?;
        Ok(Self { http, config })
    }

    /// Client against an explicit base URL, default config otherwise.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::new(ClientConfig::with_base_url(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Submit one processing job. The service acknowledges with the
    /// assigned id and a `pending` status.
    pub async fn submit(&self, request: &JobRequest) -> Result<JobSubmission, ApiError> {
        self.post_json(request.endpoint(), request).await
    }

    /// Submit up to 100 jobs in one call.
    pub async fn submit_batch(&self, request: &BatchRequest) -> Result<BatchSubmission, ApiError> {
        self.post_json("/api/batch", request).await
    }

    /// One page of job history, newest first.
    pub async fn list_jobs(&self, page: u32, page_size: u32) -> Result<JobListPage, ApiError> {
        let url = self.url("/api/jobs");
        let response = self
            .http
            .get(&url)
            .query(&[("page", page), ("page_size", page_size)])
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        let response = Self::check(response, &url).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::decode(&url, e))
    }

    /// Full record for one job.
    pub async fn get_job(&self, job_id: &str) -> Result<JobRecord, ApiError> {
        self.get_json(&format!("/api/jobs/{job_id}")).await
    }

    /// Request cancellation of a pending or processing job.
    pub async fn cancel_job(&self, job_id: &str) -> Result<JobSubmission, ApiError> {
        let url = self.url(&format!("/api/jobs/{job_id}"));
        let response = self
            .http
            .delete(&url)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        let response = Self::check(response, &url).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::decode(&url, e))
    }

    /// Re-register a completed job's output as a fresh input file.
    pub async fn use_result(&self, job_id: &str) -> Result<UploadedFile, ApiError> {
        let url = self.url(&format!("/api/jobs/{job_id}/use-result"));
        let response = self
            .http
            .post(&url)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        let response = Self::check(response, &url).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::decode(&url, e))
    }

    /// Download a completed job's output.
    pub async fn download(&self, job_id: &str) -> Result<Bytes, ApiError> {
        let url = self.download_url(job_id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        let response = Self::check(response, &url).await?;
        response
            .bytes()
            .await
            .map_err(|e| ApiError::decode(&url, e))
    }

    /// Direct download URL, for handing to a browser or media element.
    pub fn download_url(&self, job_id: &str) -> String {
        self.url(&format!("/api/jobs/{job_id}/download"))
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// The long-lived progress stream request. No request timeout: the
    /// stream stays open until the job reaches a terminal state.
    pub(crate) fn progress_request(&self, job_id: &str) -> (String, reqwest::RequestBuilder) {
        let url = self.url(&format!("/api/jobs/{job_id}/progress"));
        let builder = self.http.get(&url).header("Accept", "text/event-stream");
        (url, builder)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        let response = Self::check(response, &url).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::decode(&url, e))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        let response = Self::check(response, &url).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::decode(&url, e))
    }

    /// Normalize non-2xx responses into `ApiError::Api`.
    pub(crate) async fn check(
        response: reqwest::Response,
        url: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message(),
            Err(e) => {
                tracing::debug!(%url, error = %e, "non-JSON error body");
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            }
        };
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
