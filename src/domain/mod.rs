//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod audio;
pub mod capability;
pub mod config;
pub mod error;
pub mod payload;
pub mod pipeline;
pub mod recording;
pub mod transcode;

// Re-export common types
pub use audio::{AudioBlob, AudioEncoding, AudioMimeType, CompressedEncoding};
pub use capability::{CaptureProfile, CapturePath};
pub use config::AppConfig;
pub use error::*;
pub use payload::{SizeGate, SizeVerdict};
pub use pipeline::{PipelineSession, PipelineState};
pub use recording::Duration;
pub use transcode::{FilterSpec, TranscodeRecipe};
