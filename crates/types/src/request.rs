// crates/types/src/request.rs
//! Submit payloads for the remote service's operation endpoints.
//!
//! Each payload references a previously uploaded file by `file_id`; upload
//! itself is a separate collaborator and not modeled here.

use serde::{Deserialize, Serialize};

use crate::job::JobType;

// ── Supporting enums ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpg,
    Jpeg,
    Webp,
    Avif,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFilterKind {
    Grayscale,
    Sepia,
    Blur,
    Sharpen,
    Brightness,
    Contrast,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateDirection {
    Cw90,
    Cw180,
    Cw270,
    FlipH,
    FlipV,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Webm,
    Avi,
    Mov,
    Mkv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoResolution {
    #[serde(rename = "2160p")]
    R2160p,
    #[serde(rename = "1080p")]
    R1080p,
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "480p")]
    R480p,
    #[serde(rename = "360p")]
    R360p,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeQuality {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioAction {
    Extract,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Aac,
    Wav,
    Flac,
}

// ── Image operations ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConvertRequest {
    pub file_id: String,
    pub target_format: ImageFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResizeRequest {
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintain_aspect: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCropRequest {
    pub file_id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFilterRequest {
    pub file_id: String,
    pub filter_type: ImageFilterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRotateRequest {
    pub file_id: String,
    pub direction: RotateDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRemoveBgRequest {
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_matting: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_matting_foreground_threshold: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_matting_background_threshold: Option<u8>,
}

// ── Video operations ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConvertRequest {
    pub file_id: String,
    pub target_format: VideoFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<EncodeQuality>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoToGifRequest {
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<EncodeQuality>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GifToVideoRequest {
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_format: Option<VideoFormat>,
    /// Number of extra loops to encode; 0 plays once.
    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoTrimRequest {
    pub file_id: String,
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCropRequest {
    pub file_id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResizeRequest {
    pub file_id: String,
    pub resolution: VideoResolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCompressRequest {
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_size_mb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crf: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoThumbnailRequest {
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAudioRequest {
    pub file_id: String,
    pub action: AudioAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<AudioFormat>,
}

// ── Request → endpoint binding ──────────────────────────────────────────

/// A submit request bound to its endpoint and resulting job type.
///
/// Serializes untagged: the wire body is the operation payload alone, the
/// endpoint path comes from [`JobRequest::endpoint`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobRequest {
    ImageConvert(ImageConvertRequest),
    ImageResize(ImageResizeRequest),
    ImageCrop(ImageCropRequest),
    ImageFilter(ImageFilterRequest),
    ImageRotate(ImageRotateRequest),
    ImageRemoveBg(ImageRemoveBgRequest),
    VideoConvert(VideoConvertRequest),
    VideoToGif(VideoToGifRequest),
    GifToVideo(GifToVideoRequest),
    VideoTrim(VideoTrimRequest),
    VideoCrop(VideoCropRequest),
    VideoResize(VideoResizeRequest),
    VideoCompress(VideoCompressRequest),
    VideoThumbnail(VideoThumbnailRequest),
    VideoAudio(VideoAudioRequest),
}

impl JobRequest {
    /// `POST` path on the remote service, relative to the API base.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::ImageConvert(_) => "/api/image/convert",
            Self::ImageResize(_) => "/api/image/resize",
            Self::ImageCrop(_) => "/api/image/crop",
            Self::ImageFilter(_) => "/api/image/filter",
            Self::ImageRotate(_) => "/api/image/rotate",
            Self::ImageRemoveBg(_) => "/api/image/remove-bg",
            Self::VideoConvert(_) => "/api/video/convert",
            Self::VideoToGif(_) => "/api/video/to-gif",
            Self::GifToVideo(_) => "/api/video/from-gif",
            Self::VideoTrim(_) => "/api/video/trim",
            Self::VideoCrop(_) => "/api/video/crop",
            Self::VideoResize(_) => "/api/video/resize",
            Self::VideoCompress(_) => "/api/video/compress",
            Self::VideoThumbnail(_) => "/api/video/thumbnail",
            Self::VideoAudio(_) => "/api/video/audio",
        }
    }

    pub fn job_type(&self) -> JobType {
        match self {
            Self::ImageConvert(_) => JobType::ImageConvert,
            Self::ImageResize(_) => JobType::ImageResize,
            Self::ImageCrop(_) => JobType::ImageCrop,
            Self::ImageFilter(_) => JobType::ImageFilter,
            Self::ImageRotate(_) => JobType::ImageRotate,
            Self::ImageRemoveBg(_) => JobType::ImageRemoveBg,
            Self::VideoConvert(_) => JobType::VideoConvert,
            Self::VideoToGif(_) => JobType::VideoToGif,
            Self::GifToVideo(_) => JobType::GifToVideo,
            Self::VideoTrim(_) => JobType::VideoTrim,
            Self::VideoCrop(_) => JobType::VideoCrop,
            Self::VideoResize(_) => JobType::VideoResize,
            Self::VideoCompress(_) => JobType::VideoCompress,
            Self::VideoThumbnail(_) => JobType::VideoThumbnail,
            Self::VideoAudio(_) => JobType::VideoAudio,
        }
    }
}

// ── Batch submission ────────────────────────────────────────────────────

/// One entry in a batch submission. The payload is kept opaque here; the
/// service validates it against the named job type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub job_type: JobType,
    pub data: serde_json::Value,
}

impl BatchItem {
    pub fn new(request: &JobRequest) -> Result<Self, serde_json::Error> {
        Ok(Self {
            job_type: request.job_type(),
            data: serde_json::to_value(request)?,
        })
    }
}

/// `POST /api/batch` — the service accepts 1 to 100 items per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub items: Vec<BatchItem>,
}
