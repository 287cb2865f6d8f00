//! Payload size gate

use crate::domain::audio::AudioBlob;

/// Default payload ceiling in bytes, matched to the renderer's fixed
/// version 40 / error correction L settings.
pub const DEFAULT_PAYLOAD_LIMIT: usize = 2215;

/// Outcome of measuring a payload against the ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeVerdict {
    pub byte_length: usize,
    pub limit_bytes: usize,
    pub within_limit: bool,
}

impl SizeVerdict {
    /// User-facing diagnostic for an oversized payload
    pub fn rejection_message(&self) -> String {
        format!(
            "Final audio is still too long ({} bytes, limit {} bytes). Try speaking closer to the mic.",
            self.byte_length, self.limit_bytes
        )
    }
}

/// Measures payloads against a configured byte ceiling.
/// Never truncates: a clipped payload would not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeGate {
    limit_bytes: usize,
}

impl SizeGate {
    pub const fn new(limit_bytes: usize) -> Self {
        Self { limit_bytes }
    }

    pub const fn limit_bytes(&self) -> usize {
        self.limit_bytes
    }

    /// Measure a blob
    pub fn check(&self, blob: &AudioBlob) -> SizeVerdict {
        self.check_len(blob.byte_len())
    }

    /// Measure a raw byte length
    pub fn check_len(&self, byte_length: usize) -> SizeVerdict {
        SizeVerdict {
            byte_length,
            limit_bytes: self.limit_bytes,
            within_limit: byte_length <= self.limit_bytes,
        }
    }
}

impl Default for SizeGate {
    fn default() -> Self {
        Self::new(DEFAULT_PAYLOAD_LIMIT)
    }
}
