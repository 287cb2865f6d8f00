//! Host capability signals

mod native;

pub use native::{resolve_binary, NativePlatform};
