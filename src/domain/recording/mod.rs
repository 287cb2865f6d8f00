//! Recording domain module

mod duration;

pub use duration::{Duration, DEFAULT_DURATION_MS, MAX_CAPTURE_MS};
