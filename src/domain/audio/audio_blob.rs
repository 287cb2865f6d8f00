//! Audio blob value object

use std::fmt;

/// Audio MIME types produced or accepted by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioMimeType {
    Wav,
    Webm,
    WebmOpus,
    OggOpus,
    Mp4,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Webm => "audio/webm",
            Self::WebmOpus => "audio/webm;codecs=opus",
            Self::OggOpus => "audio/ogg;codecs=opus",
            Self::Mp4 => "audio/mp4",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Webm | Self::WebmOpus => "webm",
            Self::OggOpus => "ogg",
            Self::Mp4 => "mp4",
        }
    }

    /// Guess the MIME type from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "webm" => Some(Self::Webm),
            "ogg" | "opus" | "oga" => Some(Self::OggOpus),
            "mp4" | "m4a" => Some(Self::Mp4),
            _ => None,
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which stage produced a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioEncoding {
    /// Raw PCM in a WAV container (primary capture path)
    RawPcmContainer,
    /// Compressed by the native recorder (secondary capture path)
    NativeCompressed,
    /// Compressed by the external codec engine
    TranscodedCompressed,
}

impl AudioEncoding {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RawPcmContainer => "raw-pcm",
            Self::NativeCompressed => "native-compressed",
            Self::TranscodedCompressed => "transcoded",
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value object holding the bytes produced by one pipeline stage.
///
/// Each stage consumes its input blob and produces a new one, so a blob is
/// never shared between stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    bytes: Vec<u8>,
    mime_type: AudioMimeType,
    encoding: AudioEncoding,
}

impl AudioBlob {
    /// Create an AudioBlob from owned bytes
    pub fn new(bytes: Vec<u8>, mime_type: AudioMimeType, encoding: AudioEncoding) -> Self {
        Self {
            bytes,
            mime_type,
            encoding,
        }
    }

    /// Get the raw bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume and return the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    /// Get the size in bytes
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.byte_len();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }

    /// Encode the bytes as base64, the text form carried by the QR code
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_strings() {
        assert_eq!(AudioMimeType::Wav.as_str(), "audio/wav");
        assert_eq!(AudioMimeType::WebmOpus.as_str(), "audio/webm;codecs=opus");
        assert_eq!(AudioMimeType::Mp4.to_string(), "audio/mp4");
    }

    #[test]
    fn mime_type_from_extension() {
        assert_eq!(AudioMimeType::from_extension("OGG"), Some(AudioMimeType::OggOpus));
        assert_eq!(AudioMimeType::from_extension("m4a"), Some(AudioMimeType::Mp4));
        assert_eq!(AudioMimeType::from_extension("flac"), None);
    }

    #[test]
    fn human_readable_size() {
        let blob = AudioBlob::new(vec![0u8; 500], AudioMimeType::Mp4, AudioEncoding::TranscodedCompressed);
        assert_eq!(blob.human_readable_size(), "500 B");

        let blob = AudioBlob::new(vec![0u8; 2048], AudioMimeType::Wav, AudioEncoding::RawPcmContainer);
        assert_eq!(blob.human_readable_size(), "2.0 KB");
    }

    #[test]
    fn to_base64_decodes_back() {
        let blob = AudioBlob::new(vec![1, 2, 3, 4], AudioMimeType::OggOpus, AudioEncoding::NativeCompressed);
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(blob.to_base64())
            .unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 4]);
    }

    #[test]
    fn into_bytes_moves_buffer() {
        let blob = AudioBlob::new(vec![9; 3], AudioMimeType::Mp4, AudioEncoding::TranscodedCompressed);
        assert_eq!(blob.byte_len(), 3);
        assert_eq!(blob.into_bytes(), vec![9, 9, 9]);
    }
}
