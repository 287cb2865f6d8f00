//! AudioQR - record a short voice clip and encode it into a single QR code
//!
//! A clip of a few seconds is captured from the microphone, squeezed into a
//! tiny Opus payload (through ffmpeg when available, the built-in encoder
//! otherwise), checked against the QR byte budget and rendered as a PNG.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the pipeline state machine and errors
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, ffmpeg, Opus, QR, config file)
//! - **CLI**: Command-line interface, argument parsing and output

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
