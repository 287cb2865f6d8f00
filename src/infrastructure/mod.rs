//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like cpal, libopus and FFmpeg.

pub mod config;
pub mod engine;
pub mod platform;
pub mod qr;
pub mod recording;

// Re-export adapters
pub use config::XdgConfigStore;
pub use engine::FfmpegEngine;
pub use platform::NativePlatform;
pub use qr::QrPngRenderer;
pub use recording::{CpalMicrophone, OggOpusRecorder};
