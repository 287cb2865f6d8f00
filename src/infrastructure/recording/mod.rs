//! Recording infrastructure module
//!
//! Microphone capture through cpal and a native Ogg Opus recorder.

mod cpal_microphone;
mod opus_encoder;
mod opus_recorder;

pub use cpal_microphone::CpalMicrophone;
pub use opus_encoder::{OpusEncoder, OPUS_SAMPLE_RATE};
pub use opus_recorder::OggOpusRecorder;
