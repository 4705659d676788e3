// crates/types/src/job.rs
//! Core job data model shared by the store, the HTTP adapter and the
//! progress channel.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a remote processing job.
///
/// Unknown wire values fail deserialization on purpose: a frame carrying a
/// status outside this set is malformed and must be discarded by the caller
/// without touching the previous state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states are absorbing: no further transitions, no further
    /// field mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation a job performs, assigned by the remote service at
/// submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    ImageConvert,
    ImageResize,
    ImageCrop,
    ImageFilter,
    ImageRotate,
    ImageRemoveBg,
    VideoConvert,
    VideoToGif,
    GifToVideo,
    VideoTrim,
    VideoCrop,
    VideoResize,
    VideoCompress,
    VideoThumbnail,
    VideoAudio,
    Batch,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImageConvert => "image_convert",
            Self::ImageResize => "image_resize",
            Self::ImageCrop => "image_crop",
            Self::ImageFilter => "image_filter",
            Self::ImageRotate => "image_rotate",
            Self::ImageRemoveBg => "image_remove_bg",
            Self::VideoConvert => "video_convert",
            Self::VideoToGif => "video_to_gif",
            Self::GifToVideo => "gif_to_video",
            Self::VideoTrim => "video_trim",
            Self::VideoCrop => "video_crop",
            Self::VideoResize => "video_resize",
            Self::VideoCompress => "video_compress",
            Self::VideoThumbnail => "video_thumbnail",
            Self::VideoAudio => "video_audio",
            Self::Batch => "batch",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outstanding or finished unit of remote work.
///
/// `job_id` is immutable for the life of the record; everything else is
/// mutated exclusively through the store's merge path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    /// 0–100. Monotonic non-decreasing while the job is non-terminal;
    /// meaningless once terminal.
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Human-readable failure reason; set only when `status` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Open string-keyed mapping, opaque to this subsystem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl JobRecord {
    /// A freshly submitted job: pending, zero progress, timestamps now.
    pub fn submitted(job_id: impl Into<String>, job_type: JobType) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            job_type,
            status: JobStatus::Pending,
            progress: 0,
            message: None,
            input_file: None,
            output_file: None,
            file_size: None,
            created_at: now,
            updated_at: now,
            error: None,
            metadata: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// A partial job record, as delivered by one progress-stream frame or
/// derived from a full poll read. Every field is optional; absent fields
/// leave the stored record untouched.
///
/// `progress` is intentionally wider than the stored `u8` so out-of-range
/// input survives parsing and gets clamped at the merge site instead of
/// killing the whole frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl JobUpdate {
    /// Update carrying only a status change.
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl From<JobRecord> for JobUpdate {
    /// Lets a full poll read flow through the same merge path as a stream
    /// frame.
    fn from(record: JobRecord) -> Self {
        Self {
            job_id: Some(record.job_id),
            job_type: Some(record.job_type),
            status: Some(record.status),
            progress: Some(i64::from(record.progress)),
            message: record.message,
            input_file: record.input_file,
            output_file: record.output_file,
            file_size: record.file_size,
            error: record.error,
            metadata: record.metadata,
        }
    }
}
