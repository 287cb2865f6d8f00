//! Capture paths
//!
//! - Primary: raw PCM at a fixed 48 kHz, wrapped in WAV, for the transcode engine
//! - Secondary: compressed by the native recorder, ready for output as-is
//!
//! Both own the microphone stream for the length of the capture and release
//! it on every exit path.

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration as TokioDuration, Instant};

use crate::domain::audio::pcm::{encode_wav, resample};
use crate::domain::audio::{AudioBlob, AudioEncoding, AudioMimeType, CompressedEncoding};
use crate::domain::recording::Duration;

use super::ports::{
    AudioChunk, CaptureError, InputStream, Microphone, NativeRecorder, ProgressCallback,
    StreamFormat,
};

/// Sample rate of the raw capture graph
pub const GRAPH_SAMPLE_RATE: u32 = 48_000;

/// Bitrate hint given to the native recorder
pub const NATIVE_BITRATE_HINT: u32 = 8_000;

/// Stops the wrapped stream when dropped
struct StreamGuard {
    stream: Box<dyn InputStream>,
}

impl StreamGuard {
    fn new(stream: Box<dyn InputStream>) -> Self {
        Self { stream }
    }

    fn format(&self) -> StreamFormat {
        self.stream.format()
    }

    async fn next_chunk(&mut self) -> Option<Result<AudioChunk, CaptureError>> {
        self.stream.next_chunk().await
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stream.stop();
    }
}

/// Reports capture progress until dropped
struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    fn spawn(on_progress: Option<ProgressCallback>, duration: Duration) -> Self {
        let handle = on_progress.map(|progress| {
            let duration_ms = duration.as_millis();
            let start = Instant::now();
            tokio::spawn(async move {
                let mut ticker = interval(TokioDuration::from_millis(100));
                loop {
                    ticker.tick().await;
                    let elapsed = start.elapsed().as_millis() as u64;
                    if elapsed >= duration_ms {
                        progress(duration_ms, duration_ms);
                        break;
                    }
                    progress(elapsed, duration_ms);
                }
            })
        });
        Self { handle }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Pull chunks into `sink` until `duration` elapses.
/// The timer always runs to completion unless the stream fails first.
async fn record_for<F>(
    stream: &mut StreamGuard,
    duration: Duration,
    mut sink: F,
) -> Result<(), CaptureError>
where
    F: FnMut(&[i16]) -> Result<(), CaptureError>,
{
    let deadline = tokio::time::sleep(duration.as_std());
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => return Ok(()),
            chunk = stream.next_chunk() => match chunk {
                Some(Ok(samples)) => sink(&samples)?,
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(CaptureError::DeviceUnavailable(
                        "input stream ended before the capture finished".to_string(),
                    ))
                }
            },
        }
    }
}

/// Uncompressed capture feeding the transcode engine
pub struct PrimaryCapture<'a, M: ?Sized> {
    microphone: &'a M,
}

impl<'a, M> PrimaryCapture<'a, M>
where
    M: Microphone + ?Sized,
{
    pub fn new(microphone: &'a M) -> Self {
        Self { microphone }
    }

    /// Record `duration` of audio and return it as 48 kHz mono WAV
    pub async fn capture_raw(
        &self,
        duration: Duration,
        on_progress: Option<ProgressCallback>,
    ) -> Result<AudioBlob, CaptureError> {
        let mut stream = StreamGuard::new(self.microphone.open().await?);
        let source_rate = stream.format().sample_rate;

        let mut samples = Vec::with_capacity(duration.frames_at(source_rate));
        let ticker = ProgressTicker::spawn(on_progress, duration);
        record_for(&mut stream, duration, |chunk| {
            samples.extend_from_slice(chunk);
            Ok(())
        })
        .await?;

        // Release the device before any processing
        drop(ticker);
        drop(stream);

        if samples.is_empty() {
            return Err(CaptureError::DeviceUnavailable(
                "No audio data captured".to_string(),
            ));
        }

        let target_frames = duration.frames_at(GRAPH_SAMPLE_RATE);
        let wav = tokio::task::spawn_blocking(move || {
            let mut graph = resample(&samples, source_rate, GRAPH_SAMPLE_RATE)
                .map_err(|e| CaptureError::RecorderFailed(e.to_string()))?;
            graph.truncate(target_frames);
            Ok::<Vec<u8>, CaptureError>(encode_wav(&graph, GRAPH_SAMPLE_RATE))
        })
        .await
        .map_err(|e| CaptureError::RecorderFailed(format!("Task join error: {}", e)))??;

        log::debug!("Raw capture: {} bytes of WAV", wav.len());
        Ok(AudioBlob::new(
            wav,
            AudioMimeType::Wav,
            AudioEncoding::RawPcmContainer,
        ))
    }
}

/// Capture compressed directly by the native recorder
pub struct SecondaryCapture<'a, M: ?Sized, N: ?Sized> {
    microphone: &'a M,
    recorder: &'a N,
}

impl<'a, M, N> SecondaryCapture<'a, M, N>
where
    M: Microphone + ?Sized,
    N: NativeRecorder + ?Sized,
{
    pub fn new(microphone: &'a M, recorder: &'a N) -> Self {
        Self {
            microphone,
            recorder,
        }
    }

    /// First encoding in preference order the recorder supports
    pub fn select_encoding(&self) -> Option<CompressedEncoding> {
        if !self.recorder.is_available() {
            return None;
        }
        CompressedEncoding::PREFERENCE
            .into_iter()
            .find(|e| self.recorder.is_encoding_supported(*e))
    }

    /// Record `duration` of audio through the native recorder
    pub async fn capture_compressed(
        &self,
        duration: Duration,
        on_progress: Option<ProgressCallback>,
    ) -> Result<AudioBlob, CaptureError> {
        let mut stream = StreamGuard::new(self.microphone.open().await?);

        let encoding = self
            .select_encoding()
            .ok_or(CaptureError::NoSupportedEncoding)?;
        log::info!("Using encoding: {}", encoding);

        let mut session = self.recorder.start(
            encoding,
            Some(NATIVE_BITRATE_HINT),
            stream.format().sample_rate,
        )?;

        let ticker = ProgressTicker::spawn(on_progress, duration);
        record_for(&mut stream, duration, |chunk| session.push(chunk)).await?;

        drop(ticker);
        drop(stream);

        let bytes = tokio::task::spawn_blocking(move || session.stop())
            .await
            .map_err(|e| CaptureError::RecorderFailed(format!("Task join error: {}", e)))??;

        if bytes.is_empty() {
            return Err(CaptureError::RecorderFailed(
                "Recorder produced no data".to_string(),
            ));
        }

        log::info!("Recorded blob size: {} bytes", bytes.len());
        Ok(AudioBlob::new(
            bytes,
            encoding.mime_type(),
            AudioEncoding::NativeCompressed,
        ))
    }
}
