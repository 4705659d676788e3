// crates/types/src/response.rs
//! Response envelopes returned by the remote service, including the error
//! body normalization for its two failure shapes.

use serde::{Deserialize, Serialize};

use crate::job::{JobRecord, JobStatus};

/// Acknowledgement returned by submit and cancel calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSubmission {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One page of `GET /api/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListPage {
    pub jobs: Vec<JobRecord>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// `POST /api/jobs/{id}/use-result` — the completed output re-registered
/// as a fresh input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_id: String,
    pub filename: String,
    pub size: u64,
    pub content_type: String,
}

/// `POST /api/batch` acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSubmission {
    pub batch_id: String,
    pub jobs: Vec<JobSubmission>,
    pub total: u32,
}

// ── Error body normalization ────────────────────────────────────────────

/// The `detail` field of a non-2xx response: either a plain string or an
/// array of validation objects carrying `msg`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationItem>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValidationItem {
    #[serde(default)]
    pub msg: Option<String>,
}

/// JSON body carried by non-2xx responses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

impl ErrorBody {
    /// Collapse both failure shapes into one human-readable message.
    pub fn message(&self) -> String {
        match &self.detail {
            ErrorDetail::Message(msg) => msg.clone(),
            ErrorDetail::Validation(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .map(|item| item.msg.as_deref().unwrap_or("Validation error"))
                    .collect();
                if msgs.is_empty() {
                    "Validation error".to_string()
                } else {
                    msgs.join(", ")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobType;

    #[test]
    fn test_submission_deserializes() {
        let json = r#"{"job_id":"j-1","status":"pending","progress":0}"#;
        let submission: JobSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.job_id, "j-1");
        assert_eq!(submission.status, JobStatus::Pending);
        assert_eq!(submission.message, None);
    }

    #[test]
    fn test_list_page_deserializes() {
        let json = serde_json::json!({
            "jobs": [{
                "job_id": "j-1",
                "job_type": "video_trim",
                "status": "completed",
                "progress": 100,
                "created_at": "2026-02-05T12:00:00Z",
                "updated_at": "2026-02-05T12:01:00Z"
            }],
            "total": 41,
            "page": 2,
            "page_size": 20
        });
        let page: JobListPage = serde_json::from_value(json).unwrap();
        assert_eq!(page.jobs.len(), 1);
        assert_eq!(page.jobs[0].job_type, JobType::VideoTrim);
        assert_eq!(page.total, 41);
    }

    #[test]
    fn test_error_body_string_detail() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Job not found"}"#).unwrap();
        assert_eq!(body.message(), "Job not found");
    }

    #[test]
    fn test_error_body_validation_detail() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"detail":[{"msg":"field required"},{"msg":"value too large"}]}"#,
        )
        .unwrap();
        assert_eq!(body.message(), "field required, value too large");
    }

    #[test]
    fn test_error_body_validation_missing_msg() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":[{"loc":["body","file_id"]}]}"#).unwrap();
        assert_eq!(body.message(), "Validation error");
    }

    #[test]
    fn test_error_body_empty_validation_array() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":[]}"#).unwrap();
        assert_eq!(body.message(), "Validation error");
    }
}
