//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod codec_engine;
pub mod config;
pub mod microphone;
pub mod platform;
pub mod qr_renderer;
pub mod recorder;

// Re-export common types
pub use codec_engine::{CodecEngine, EngineError};
pub use config::ConfigStore;
pub use microphone::{
    AudioChunk, CaptureError, InputStream, Microphone, ProgressCallback, StreamFormat,
};
pub use platform::PlatformSignals;
pub use qr_renderer::{ErrorCorrection, QrImage, QrOptions, QrRenderer, RenderError};
pub use recorder::{NativeRecorder, RecorderSession};
