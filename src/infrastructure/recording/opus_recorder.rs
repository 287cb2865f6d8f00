//! Native recorder backed by libopus

use crate::application::ports::{CaptureError, NativeRecorder, RecorderSession};
use crate::domain::audio::pcm::resample;
use crate::domain::audio::CompressedEncoding;

use super::opus_encoder::{OpusEncoder, OPUS_SAMPLE_RATE};

/// Bitrate used when the caller gives no hint
const DEFAULT_BITRATE: u32 = 8_000;

/// Records straight to Ogg Opus. Other containers are not supported.
#[derive(Debug, Default, Clone, Copy)]
pub struct OggOpusRecorder;

impl OggOpusRecorder {
    pub fn new() -> Self {
        Self
    }
}

impl NativeRecorder for OggOpusRecorder {
    fn is_available(&self) -> bool {
        OpusEncoder::probe()
    }

    fn is_encoding_supported(&self, encoding: CompressedEncoding) -> bool {
        encoding == CompressedEncoding::OggOpus && self.is_available()
    }

    fn start(
        &self,
        encoding: CompressedEncoding,
        bitrate_hint: Option<u32>,
        input_rate: u32,
    ) -> Result<Box<dyn RecorderSession>, CaptureError> {
        if encoding != CompressedEncoding::OggOpus {
            return Err(CaptureError::NoSupportedEncoding);
        }

        let encoder = OpusEncoder::new(bitrate_hint.unwrap_or(DEFAULT_BITRATE))
            .map_err(|e| CaptureError::RecorderFailed(e.to_string()))?;

        Ok(Box::new(OggOpusSession {
            encoder,
            input_rate,
            samples: Vec::new(),
        }))
    }
}

/// Buffers input and encodes once on stop
struct OggOpusSession {
    encoder: OpusEncoder,
    input_rate: u32,
    samples: Vec<i16>,
}

impl RecorderSession for OggOpusSession {
    fn push(&mut self, samples: &[i16]) -> Result<(), CaptureError> {
        self.samples.extend_from_slice(samples);
        Ok(())
    }

    fn stop(mut self: Box<Self>) -> Result<Vec<u8>, CaptureError> {
        let resampled = resample(&self.samples, self.input_rate, OPUS_SAMPLE_RATE)
            .map_err(|e| CaptureError::RecorderFailed(e.to_string()))?;

        self.encoder
            .encode_to_ogg(&resampled)
            .map_err(|e| CaptureError::RecorderFailed(e.to_string()))
    }
}
