//! Pipeline session state machine

use std::fmt;
use thiserror::Error;

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Capturing,
    Transcoding,
    Verifying,
    Done,
    Rejected,
    Failed,
}

impl PipelineState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
            Self::Transcoding => "transcoding",
            Self::Verifying => "verifying",
            Self::Done => "done",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }

    /// Terminal states re-enable the trigger
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Rejected | Self::Failed)
    }

    /// An invocation is in flight
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Capturing | Self::Transcoding | Self::Verifying)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: PipelineState,
    pub action: String,
}

/// Pipeline session entity.
/// Tracks one record-to-render invocation at a time.
///
/// State machine:
///   IDLE | DONE | REJECTED | FAILED -> CAPTURING (start)
///   CAPTURING -> TRANSCODING (begin_transcode)
///   TRANSCODING -> CAPTURING (fall_back, at most once per invocation)
///   CAPTURING | TRANSCODING -> VERIFYING (begin_verify)
///   VERIFYING -> DONE | REJECTED (complete)
///   CAPTURING | TRANSCODING | VERIFYING -> FAILED (fail)
#[derive(Debug, Default)]
pub struct PipelineSession {
    state: PipelineState,
    fallback_used: bool,
}

impl PipelineSession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Whether the single fallback has been spent in this invocation
    pub fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    fn invalid(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.state,
            action: action.to_string(),
        }
    }

    /// Begin a new invocation
    pub fn start(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != PipelineState::Idle && !self.state.is_terminal() {
            return Err(self.invalid("start"));
        }
        self.state = PipelineState::Capturing;
        self.fallback_used = false;
        Ok(())
    }

    /// Transition from CAPTURING to TRANSCODING
    pub fn begin_transcode(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != PipelineState::Capturing {
            return Err(self.invalid("begin transcode"));
        }
        self.state = PipelineState::Transcoding;
        Ok(())
    }

    /// Transition from TRANSCODING back to CAPTURING for the fallback path
    pub fn fall_back(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != PipelineState::Transcoding || self.fallback_used {
            return Err(self.invalid("fall back"));
        }
        self.state = PipelineState::Capturing;
        self.fallback_used = true;
        Ok(())
    }

    /// Transition into VERIFYING
    pub fn begin_verify(&mut self) -> Result<(), InvalidStateTransition> {
        if !matches!(
            self.state,
            PipelineState::Capturing | PipelineState::Transcoding
        ) {
            return Err(self.invalid("verify"));
        }
        self.state = PipelineState::Verifying;
        Ok(())
    }

    /// Transition from VERIFYING to DONE or REJECTED
    pub fn complete(&mut self, within_limit: bool) -> Result<(), InvalidStateTransition> {
        if self.state != PipelineState::Verifying {
            return Err(self.invalid("complete"));
        }
        self.state = if within_limit {
            PipelineState::Done
        } else {
            PipelineState::Rejected
        };
        Ok(())
    }

    /// Transition into FAILED from any in-flight state
    pub fn fail(&mut self) -> Result<(), InvalidStateTransition> {
        if !self.state.is_busy() {
            return Err(self.invalid("fail"));
        }
        self.state = PipelineState::Failed;
        Ok(())
    }
}
