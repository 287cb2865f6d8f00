//! Capture capability profile

use std::fmt;

use serde::Serialize;

use crate::domain::audio::CompressedEncoding;

/// The two strategies for obtaining a final payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapturePath {
    /// Uncompressed capture followed by the codec engine transcode
    Primary,
    /// Capture straight into a natively compressed encoding
    Secondary,
}

impl CapturePath {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary (raw capture + transcode)",
            Self::Secondary => "secondary (native compressed capture)",
        }
    }
}

impl fmt::Display for CapturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of what the runtime environment can do.
/// Computed once per capture attempt and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureProfile {
    isolated_context_available: bool,
    shared_memory_available: bool,
    supported_compressed_encodings: Vec<CompressedEncoding>,
    direct_capture_viable: bool,
}

impl CaptureProfile {
    /// Build a profile. Direct capture is viable when a native recorder is
    /// present and reports at least one encoding.
    pub fn new(
        isolated_context_available: bool,
        shared_memory_available: bool,
        recorder_available: bool,
        supported_compressed_encodings: Vec<CompressedEncoding>,
    ) -> Self {
        let supported_compressed_encodings = if recorder_available {
            supported_compressed_encodings
        } else {
            Vec::new()
        };
        let direct_capture_viable = !supported_compressed_encodings.is_empty();

        Self {
            isolated_context_available,
            shared_memory_available,
            supported_compressed_encodings,
            direct_capture_viable,
        }
    }

    pub fn isolated_context_available(&self) -> bool {
        self.isolated_context_available
    }

    pub fn shared_memory_available(&self) -> bool {
        self.shared_memory_available
    }

    pub fn supported_compressed_encodings(&self) -> &[CompressedEncoding] {
        &self.supported_compressed_encodings
    }

    pub fn direct_capture_viable(&self) -> bool {
        self.direct_capture_viable
    }

    /// Both codec engine prerequisites are met
    pub fn transcode_viable(&self) -> bool {
        self.isolated_context_available && self.shared_memory_available
    }

    /// Pick the capture path for this attempt
    pub fn select_path(&self, prefer_quality: bool) -> CapturePath {
        if prefer_quality && self.transcode_viable() {
            CapturePath::Primary
        } else {
            CapturePath::Secondary
        }
    }
}
