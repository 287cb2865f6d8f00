//! Native recorder port interfaces

use crate::domain::audio::CompressedEncoding;

use super::microphone::CaptureError;

/// Port for a recorder that compresses audio as it is captured
pub trait NativeRecorder: Send + Sync {
    /// Whether the recorder can run at all on this host
    fn is_available(&self) -> bool;

    /// Whether the recorder can produce `encoding`
    fn is_encoding_supported(&self, encoding: CompressedEncoding) -> bool;

    /// Begin a recording session.
    ///
    /// # Arguments
    /// * `encoding` - Output encoding, already checked with `is_encoding_supported`
    /// * `bitrate_hint` - Target bits per second; the recorder may not honour it exactly
    /// * `input_rate` - Sample rate of the mono chunks that will be pushed
    fn start(
        &self,
        encoding: CompressedEncoding,
        bitrate_hint: Option<u32>,
        input_rate: u32,
    ) -> Result<Box<dyn RecorderSession>, CaptureError>;
}

/// An in-progress native recording
pub trait RecorderSession: Send {
    /// Feed captured mono samples
    fn push(&mut self, samples: &[i16]) -> Result<(), CaptureError>;

    /// Finish recording and return the complete encoded file
    fn stop(self: Box<Self>) -> Result<Vec<u8>, CaptureError>;
}
