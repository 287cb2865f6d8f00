//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod capture;
pub mod encode;
pub mod ports;
pub mod probe;
pub mod record_qr;
pub mod transcode;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export use cases
pub use capture::{PrimaryCapture, SecondaryCapture};
pub use encode::EncodeFileUseCase;
pub use probe::CapabilityProber;
pub use record_qr::{
    PipelineError, PipelineFailure, PipelineOutcome, PipelineStage, RecordCallbacks,
    RecordInput, RecordOutput, RecordQrUseCase,
};
pub use transcode::{TranscodeEngine, TranscodeError};
