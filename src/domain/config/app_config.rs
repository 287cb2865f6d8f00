//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::payload::DEFAULT_PAYLOAD_LIMIT;
use crate::domain::recording::Duration;

/// Default QR image edge length in pixels
pub const DEFAULT_IMAGE_SIZE: u32 = 512;

/// Default quiet-zone width in modules
pub const DEFAULT_MARGIN: u32 = 1;

/// Default path of the rendered PNG
pub const DEFAULT_OUTPUT: &str = "audio-qr.png";

/// Default codec engine executable
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// QR rendering configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QrConfig {
    pub image_size: Option<u32>,
    pub margin: Option<u32>,
}

/// Codec engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub ffmpeg_path: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub duration: Option<String>,
    pub payload_limit: Option<usize>,
    pub prefer_quality: Option<bool>,
    pub output: Option<String>,
    pub qr: Option<QrConfig>,
    pub engine: Option<EngineConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            duration: Some(Duration::default_duration().to_string()),
            payload_limit: Some(DEFAULT_PAYLOAD_LIMIT),
            prefer_quality: Some(true),
            output: Some(DEFAULT_OUTPUT.to_string()),
            qr: Some(QrConfig {
                image_size: Some(DEFAULT_IMAGE_SIZE),
                margin: Some(DEFAULT_MARGIN),
            }),
            engine: Some(EngineConfig {
                ffmpeg_path: Some(DEFAULT_FFMPEG.to_string()),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            duration: other.duration.or(self.duration),
            payload_limit: other.payload_limit.or(self.payload_limit),
            prefer_quality: other.prefer_quality.or(self.prefer_quality),
            output: other.output.or(self.output),
            qr: Self::merge_qr_config(self.qr, other.qr),
            engine: Self::merge_engine_config(self.engine, other.engine),
        }
    }

    fn merge_qr_config(base: Option<QrConfig>, other: Option<QrConfig>) -> Option<QrConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(QrConfig {
                image_size: o.image_size.or(b.image_size),
                margin: o.margin.or(b.margin),
            }),
        }
    }

    fn merge_engine_config(
        base: Option<EngineConfig>,
        other: Option<EngineConfig>,
    ) -> Option<EngineConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(EngineConfig {
                ffmpeg_path: o.ffmpeg_path.or(b.ffmpeg_path),
            }),
        }
    }

    /// Get duration as parsed Duration, or default if not set/invalid
    pub fn duration_or_default(&self) -> Duration {
        self.duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_duration)
    }

    /// Get the payload byte ceiling, or the QR-derived default
    pub fn payload_limit_or_default(&self) -> usize {
        self.payload_limit.unwrap_or(DEFAULT_PAYLOAD_LIMIT)
    }

    /// Whether the transcode path is preferred when available
    pub fn prefer_quality_or_default(&self) -> bool {
        self.prefer_quality.unwrap_or(true)
    }

    pub fn output_or_default(&self) -> &str {
        self.output.as_deref().unwrap_or(DEFAULT_OUTPUT)
    }

    pub fn image_size_or_default(&self) -> u32 {
        self.qr
            .as_ref()
            .and_then(|q| q.image_size)
            .unwrap_or(DEFAULT_IMAGE_SIZE)
    }

    pub fn margin_or_default(&self) -> u32 {
        self.qr
            .as_ref()
            .and_then(|q| q.margin)
            .unwrap_or(DEFAULT_MARGIN)
    }

    pub fn ffmpeg_path_or_default(&self) -> &str {
        self.engine
            .as_ref()
            .and_then(|e| e.ffmpeg_path.as_deref())
            .unwrap_or(DEFAULT_FFMPEG)
    }
}
