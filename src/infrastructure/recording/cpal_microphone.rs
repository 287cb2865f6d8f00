//! Microphone adapter using cpal
//!
//! `cpal::Stream` is not `Send`, so each opened stream lives on its own
//! thread and hands chunks to the async side over a channel.

use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tokio::sync::{mpsc, oneshot};

use crate::application::capture::GRAPH_SAMPLE_RATE;
use crate::application::ports::{
    AudioChunk, CaptureError, InputStream, Microphone, StreamFormat,
};
use crate::domain::audio::pcm::downmix_to_mono;

type ChunkSender = mpsc::UnboundedSender<Result<AudioChunk, CaptureError>>;

/// Default input device of the default host
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalMicrophone;

impl CpalMicrophone {
    pub fn new() -> Self {
        Self
    }

    fn get_input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device().ok_or_else(|| {
            CaptureError::DeviceUnavailable("No input device available".to_string())
        })
    }

    /// Pick an i16/f32 config, preferring fewer channels and a range that
    /// covers the graph rate so no resampling is needed.
    fn get_input_config(
        device: &cpal::Device,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| classify(e.to_string()))?;

        let covers = |range: &cpal::SupportedStreamConfigRange| {
            range.min_sample_rate().0 <= GRAPH_SAMPLE_RATE
                && range.max_sample_rate().0 >= GRAPH_SAMPLE_RATE
        };

        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;
        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    (covers(&config) && !covers(current))
                        || (covers(&config) == covers(current)
                            && config.channels() < current.channels())
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config.ok_or_else(|| {
            CaptureError::DeviceUnavailable("No suitable input config found".to_string())
        })?;

        let sample_rate = if covers(&config_range) {
            SampleRate(GRAPH_SAMPLE_RATE)
        } else {
            config_range.max_sample_rate()
        };

        let sample_format = config_range.sample_format();
        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    /// Build and start the stream on the current thread
    fn start_stream(tx: &ChunkSender) -> Result<(cpal::Stream, u32), CaptureError> {
        let device = Self::get_input_device()?;
        let (config, sample_format) = Self::get_input_config(&device)?;
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        let err_tx = tx.clone();
        let on_error = move |err: cpal::StreamError| {
            log::warn!("Audio stream error: {}", err);
            let _ = err_tx.send(Err(CaptureError::DeviceUnavailable(err.to_string())));
        };

        let stream = match sample_format {
            SampleFormat::I16 => {
                let data_tx = tx.clone();
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let _ = data_tx.send(Ok(downmix_to_mono(data, channels)));
                    },
                    on_error,
                    None,
                )
            }
            SampleFormat::F32 => {
                let data_tx = tx.clone();
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let i16_data: Vec<i16> =
                            data.iter().map(|&s| (s * 32767.0) as i16).collect();
                        let _ = data_tx.send(Ok(downmix_to_mono(&i16_data, channels)));
                    },
                    on_error,
                    None,
                )
            }
            _ => {
                return Err(CaptureError::DeviceUnavailable(
                    "Unsupported sample format".to_string(),
                ))
            }
        }
        .map_err(|e| classify(e.to_string()))?;

        stream.play().map_err(|e| classify(e.to_string()))?;
        log::debug!(
            "Input stream started: {} Hz, {} channel(s), {:?}",
            sample_rate,
            channels,
            sample_format
        );

        Ok((stream, sample_rate))
    }
}

/// Host audio errors carry no structured permission signal; inspect the text
fn classify(message: String) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
        CaptureError::PermissionDenied
    } else {
        CaptureError::DeviceUnavailable(message)
    }
}

#[async_trait]
impl Microphone for CpalMicrophone {
    async fn open(&self) -> Result<Box<dyn InputStream>, CaptureError> {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || match CpalMicrophone::start_stream(&chunk_tx) {
                Ok((stream, sample_rate)) => {
                    let _ = ready_tx.send(Ok(sample_rate));
                    // Blocks until stop() sends or the handle is dropped
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        let sample_rate = ready_rx.await.map_err(|_| {
            CaptureError::DeviceUnavailable("Capture thread exited early".to_string())
        })??;

        Ok(Box::new(CpalInputStream {
            format: StreamFormat { sample_rate },
            chunks: chunk_rx,
            stop: Some(stop_tx),
            thread: Some(thread),
        }))
    }
}

/// An open cpal stream owned by its capture thread
struct CpalInputStream {
    format: StreamFormat,
    chunks: mpsc::UnboundedReceiver<Result<AudioChunk, CaptureError>>,
    stop: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

#[async_trait]
impl InputStream for CpalInputStream {
    fn format(&self) -> StreamFormat {
        self.format
    }

    async fn next_chunk(&mut self) -> Option<Result<AudioChunk, CaptureError>> {
        if self.stop.is_none() {
            return None;
        }
        self.chunks.recv().await
    }

    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        self.chunks.close();
    }
}

impl Drop for CpalInputStream {
    fn drop(&mut self) {
        self.stop();
    }
}
