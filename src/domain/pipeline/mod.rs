//! Pipeline domain module

mod session;

pub use session::{InvalidStateTransition, PipelineSession, PipelineState};
