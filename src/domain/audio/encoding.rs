//! Compressed encodings a native recorder may offer

use std::fmt;

use serde::Serialize;

use super::AudioMimeType;

/// A compressed container/codec pair, named by its MIME type string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompressedEncoding {
    #[serde(rename = "audio/webm;codecs=opus")]
    WebmOpus,
    #[serde(rename = "audio/webm")]
    Webm,
    #[serde(rename = "audio/ogg;codecs=opus")]
    OggOpus,
    #[serde(rename = "audio/mp4")]
    Mp4,
}

impl CompressedEncoding {
    /// Preference order used when picking a native encoding
    pub const PREFERENCE: [CompressedEncoding; 4] =
        [Self::WebmOpus, Self::Webm, Self::OggOpus, Self::Mp4];

    pub const fn mime_type(&self) -> AudioMimeType {
        match self {
            Self::WebmOpus => AudioMimeType::WebmOpus,
            Self::Webm => AudioMimeType::Webm,
            Self::OggOpus => AudioMimeType::OggOpus,
            Self::Mp4 => AudioMimeType::Mp4,
        }
    }

    /// All encodings accepted by `is_supported`, in preference order
    pub fn supported_by(is_supported: impl Fn(CompressedEncoding) -> bool) -> Vec<Self> {
        Self::PREFERENCE
            .into_iter()
            .filter(|e| is_supported(*e))
            .collect()
    }
}

impl fmt::Display for CompressedEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}
