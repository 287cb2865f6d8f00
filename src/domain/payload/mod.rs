//! Payload domain module

mod size_gate;

pub use size_gate::{SizeGate, SizeVerdict, DEFAULT_PAYLOAD_LIMIT};
