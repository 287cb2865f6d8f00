//! Microphone port interfaces

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Capture errors shared by both capture paths
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Microphone access was denied")]
    PermissionDenied,

    #[error("No usable audio input device: {0}")]
    DeviceUnavailable(String),

    #[error("No supported compressed encoding found for the native recorder")]
    NoSupportedEncoding,

    #[error("Recorder failed: {0}")]
    RecorderFailed(String),
}

/// A buffer of mono i16 samples
pub type AudioChunk = Vec<i16>;

/// Format of the chunks an input stream yields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
}

/// Progress callback type for reporting capture progress.
/// Parameters: (elapsed_ms, total_ms)
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// A live microphone stream.
///
/// Yields a finite sequence of mono chunks; `None` means the device ended
/// the stream. The stream exclusively owns the device until `stop` is called.
#[async_trait]
pub trait InputStream: Send {
    /// Sample format of yielded chunks
    fn format(&self) -> StreamFormat;

    /// Wait for the next chunk. Must be cancel-safe.
    async fn next_chunk(&mut self) -> Option<Result<AudioChunk, CaptureError>>;

    /// Release the device (all tracks). Idempotent.
    fn stop(&mut self);
}

/// Port for microphone access
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Request the microphone and start streaming.
    ///
    /// # Errors
    /// `PermissionDenied` if access is refused, `DeviceUnavailable` if no
    /// input device exists or it cannot be opened.
    async fn open(&self) -> Result<Box<dyn InputStream>, CaptureError>;
}
