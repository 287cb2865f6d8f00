//! Capability domain module

mod profile;

pub use profile::{CaptureProfile, CapturePath};
