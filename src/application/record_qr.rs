//! Record-to-QR use case
//!
//! Drives one invocation through the pipeline state machine:
//! probe, capture (primary with one fallback, or secondary), verify, render.

use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use crate::domain::audio::AudioBlob;
use crate::domain::capability::CapturePath;
use crate::domain::payload::{SizeGate, SizeVerdict};
use crate::domain::pipeline::{InvalidStateTransition, PipelineSession, PipelineState};
use crate::domain::recording::Duration;
use crate::domain::transcode::TranscodeRecipe;

use super::capture::{PrimaryCapture, SecondaryCapture};
use super::encode::gate_and_render;
use super::ports::{
    CaptureError, CodecEngine, Microphone, NativeRecorder, PlatformSignals, ProgressCallback,
    QrImage, QrOptions, QrRenderer,
};
use super::probe::CapabilityProber;
use super::transcode::{TranscodeEngine, TranscodeError};

/// Failure kinds surfaced by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Microphone access was denied")]
    PermissionDenied,

    #[error("No usable audio input device: {0}")]
    DeviceUnavailable(String),

    #[error("No supported compressed encoding found for the native recorder")]
    NoSupportedEncoding,

    #[error("Codec engine could not be loaded: {0}")]
    EngineLoadFailed(String),

    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("Final audio is still too long ({size} bytes, limit {limit} bytes). Try speaking closer to the mic.")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("QR rendering failed: {0}")]
    RenderFailed(String),

    #[error("A recording is already in progress")]
    Busy,

    #[error("Unexpected failure: {0}")]
    Unknown(String),
}

impl From<CaptureError> for PipelineError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied => Self::PermissionDenied,
            CaptureError::DeviceUnavailable(msg) => Self::DeviceUnavailable(msg),
            CaptureError::NoSupportedEncoding => Self::NoSupportedEncoding,
            CaptureError::RecorderFailed(msg) => Self::Unknown(msg),
        }
    }
}

impl From<TranscodeError> for PipelineError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::EngineLoadFailed(msg) => Self::EngineLoadFailed(msg),
            TranscodeError::TranscodeFailed(msg) => Self::TranscodeFailed(msg),
        }
    }
}

impl From<SizeVerdict> for PipelineError {
    fn from(verdict: SizeVerdict) -> Self {
        Self::PayloadTooLarge {
            size: verdict.byte_length,
            limit: verdict.limit_bytes,
        }
    }
}

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    Capture,
    Transcode,
    Fallback,
    Verify,
    Render,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Capture => "capture",
            Self::Transcode => "transcode",
            Self::Fallback => "fallback capture",
            Self::Verify => "verify",
            Self::Render => "render",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A pipeline error with the stage it happened in
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    pub error: PipelineError,
}

impl PipelineFailure {
    pub fn new(stage: PipelineStage, error: PipelineError) -> Self {
        Self { stage, error }
    }

    fn at(stage: PipelineStage) -> impl FnOnce(CaptureError) -> Self {
        move |e| Self::new(stage, e.into())
    }
}

impl From<InvalidStateTransition> for PipelineFailure {
    fn from(err: InvalidStateTransition) -> Self {
        Self::new(PipelineStage::Verify, PipelineError::Unknown(err.to_string()))
    }
}

/// Terminal result of a completed pipeline
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Payload fit and was rendered
    Done { payload: AudioBlob, image: QrImage },
    /// Payload was measured and is too large
    Rejected { verdict: SizeVerdict },
}

impl PipelineOutcome {
    pub fn state(&self) -> PipelineState {
        match self {
            Self::Done { .. } => PipelineState::Done,
            Self::Rejected { .. } => PipelineState::Rejected,
        }
    }
}

/// Input parameters for one recording
#[derive(Debug, Clone, Copy)]
pub struct RecordInput {
    pub duration: Duration,
    /// Take the transcode path when the environment allows it
    pub prefer_quality: bool,
}

impl Default for RecordInput {
    fn default() -> Self {
        Self {
            duration: Duration::default_duration(),
            prefer_quality: true,
        }
    }
}

/// Output of a finished recording
#[derive(Debug, Clone)]
pub struct RecordOutput {
    pub outcome: PipelineOutcome,
    /// Path selected after probing
    pub path: CapturePath,
    /// Whether the secondary path was taken after a transcode failure
    pub fallback_used: bool,
}

/// Callbacks for progress and status updates
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct RecordCallbacks {
    /// Called during capture with (elapsed_ms, total_ms)
    pub on_progress: Option<ProgressCallback>,
    /// Called on every state transition
    pub on_state: Option<Box<dyn Fn(PipelineState) + Send + Sync>>,
}

/// Record audio and turn it into a QR image
pub struct RecordQrUseCase<P, M, N, E, Q>
where
    P: PlatformSignals,
    M: Microphone,
    N: NativeRecorder,
    E: CodecEngine,
    Q: QrRenderer,
{
    platform: P,
    microphone: M,
    recorder: N,
    engine: TranscodeEngine<E>,
    renderer: Q,
    gate: SizeGate,
    recipe: TranscodeRecipe,
    qr_options: QrOptions,
    session: Mutex<PipelineSession>,
}

impl<P, M, N, E, Q> RecordQrUseCase<P, M, N, E, Q>
where
    P: PlatformSignals,
    M: Microphone,
    N: NativeRecorder,
    E: CodecEngine,
    Q: QrRenderer,
{
    /// Create a new use case instance
    pub fn new(platform: P, microphone: M, recorder: N, engine: E, renderer: Q) -> Self {
        Self {
            platform,
            microphone,
            recorder,
            engine: TranscodeEngine::new(engine),
            renderer,
            gate: SizeGate::default(),
            recipe: TranscodeRecipe::speech_qr(),
            qr_options: QrOptions::default(),
            session: Mutex::new(PipelineSession::new()),
        }
    }

    pub fn with_size_gate(mut self, gate: SizeGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_qr_options(mut self, options: QrOptions) -> Self {
        self.qr_options = options;
        self
    }

    /// Current pipeline state
    pub fn state(&self) -> PipelineState {
        self.session().state()
    }

    fn session(&self) -> MutexGuard<'_, PipelineSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition<F>(&self, callbacks: &RecordCallbacks, step: F) -> Result<(), InvalidStateTransition>
    where
        F: FnOnce(&mut PipelineSession) -> Result<(), InvalidStateTransition>,
    {
        let state = {
            let mut session = self.session();
            step(&mut session)?;
            session.state()
        };
        log::debug!("Pipeline state: {}", state.as_str());
        if let Some(ref cb) = callbacks.on_state {
            cb(state);
        }
        Ok(())
    }

    /// Run one invocation. Rejected while another one is in flight.
    pub async fn execute(
        &self,
        input: RecordInput,
        callbacks: RecordCallbacks,
    ) -> Result<RecordOutput, PipelineFailure> {
        self.transition(&callbacks, PipelineSession::start)
            .map_err(|_| PipelineFailure::new(PipelineStage::Start, PipelineError::Busy))?;

        let result = self.run(input, &callbacks).await;

        if let Err(ref failure) = result {
            log::error!("Pipeline failed during {}: {}", failure.stage, failure.error);
            let _ = self.transition(&callbacks, PipelineSession::fail);
        }
        result
    }

    async fn run(
        &self,
        input: RecordInput,
        callbacks: &RecordCallbacks,
    ) -> Result<RecordOutput, PipelineFailure> {
        let profile = CapabilityProber::new(&self.platform, &self.recorder).probe();
        let path = profile.select_path(input.prefer_quality);
        log::info!("Selected capture path: {}", path);

        let payload = match path {
            CapturePath::Primary => self.capture_and_transcode(input, callbacks).await?,
            CapturePath::Secondary => SecondaryCapture::new(&self.microphone, &self.recorder)
                .capture_compressed(input.duration, callbacks.on_progress.clone())
                .await
                .map_err(PipelineFailure::at(PipelineStage::Capture))?,
        };

        self.transition(callbacks, PipelineSession::begin_verify)?;
        let outcome = gate_and_render(&self.renderer, self.gate, &self.qr_options, payload)?;
        let within_limit = outcome.state() == PipelineState::Done;
        self.transition(callbacks, |s| s.complete(within_limit))?;

        Ok(RecordOutput {
            outcome,
            path,
            fallback_used: self.session().fallback_used(),
        })
    }

    /// Primary path with a single fallback to the native recorder
    async fn capture_and_transcode(
        &self,
        input: RecordInput,
        callbacks: &RecordCallbacks,
    ) -> Result<AudioBlob, PipelineFailure> {
        let raw = PrimaryCapture::new(&self.microphone)
            .capture_raw(input.duration, callbacks.on_progress.clone())
            .await
            .map_err(PipelineFailure::at(PipelineStage::Capture))?;

        self.transition(callbacks, PipelineSession::begin_transcode)?;
        match self.engine.transcode(&raw, &self.recipe).await {
            Ok(blob) => Ok(blob),
            Err(e) => {
                log::warn!("{}; falling back to the native recorder", e);
                self.transition(callbacks, PipelineSession::fall_back)
                    .map_err(|_| PipelineFailure::new(PipelineStage::Transcode, e.into()))?;

                SecondaryCapture::new(&self.microphone, &self.recorder)
                    .capture_compressed(input.duration, callbacks.on_progress.clone())
                    .await
                    .map_err(PipelineFailure::at(PipelineStage::Fallback))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::application::test_support::{
        FakeEngine, FakeMicrophone, FakePlatform, FakeRecorder, FakeRenderer,
    };
    use crate::domain::audio::{AudioEncoding, CompressedEncoding};

    type TestUseCase =
        RecordQrUseCase<FakePlatform, FakeMicrophone, FakeRecorder, FakeEngine, FakeRenderer>;

    fn use_case(platform: FakePlatform, engine: FakeEngine, recorder: FakeRecorder) -> TestUseCase {
        RecordQrUseCase::new(
            platform,
            FakeMicrophone::new(48_000),
            recorder,
            engine,
            FakeRenderer::new(),
        )
    }

    fn input(millis: u64) -> RecordInput {
        RecordInput {
            duration: Duration::from_millis(millis),
            prefer_quality: true,
        }
    }

    fn ogg_recorder() -> FakeRecorder {
        FakeRecorder::supporting(&[CompressedEncoding::OggOpus])
    }

    #[tokio::test(start_paused = true)]
    async fn primary_path_within_limit_is_done() {
        let uc = use_case(FakePlatform::isolated(), FakeEngine::new(2_000), ogg_recorder());

        let output = uc.execute(input(1_600), RecordCallbacks::default()).await.unwrap();

        assert_eq!(uc.state(), PipelineState::Done);
        assert_eq!(output.path, CapturePath::Primary);
        assert!(!output.fallback_used);
        match output.outcome {
            PipelineOutcome::Done { payload, .. } => {
                assert_eq!(payload.byte_len(), 2_000);
                assert_eq!(payload.encoding(), AudioEncoding::TranscodedCompressed);
                assert_eq!(uc.renderer.rendered(), vec![payload.to_base64()]);
            }
            other => panic!("expected Done, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_payload_is_rejected() {
        let uc = use_case(FakePlatform::isolated(), FakeEngine::new(2_300), ogg_recorder());

        let output = uc.execute(input(2_500), RecordCallbacks::default()).await.unwrap();

        assert_eq!(uc.state(), PipelineState::Rejected);
        let PipelineOutcome::Rejected { verdict } = output.outcome else {
            panic!("expected Rejected");
        };
        let message = PipelineError::from(verdict).to_string();
        assert!(message.contains("2300"));
        assert!(message.contains("2215"));
        assert!(uc.renderer.rendered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn no_isolation_goes_straight_to_secondary() {
        let uc = use_case(FakePlatform::not_isolated(), FakeEngine::new(2_000), ogg_recorder());

        let output = uc.execute(input(1_600), RecordCallbacks::default()).await.unwrap();

        assert_eq!(output.path, CapturePath::Secondary);
        assert_eq!(uc.state(), PipelineState::Done);
        assert_eq!(uc.engine.engine().loads(), 0);
        assert_eq!(uc.engine.engine().runs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn quality_not_preferred_skips_transcode() {
        let uc = use_case(FakePlatform::isolated(), FakeEngine::new(2_000), ogg_recorder());

        let output = uc
            .execute(
                RecordInput {
                    duration: Duration::from_secs(1),
                    prefer_quality: false,
                },
                RecordCallbacks::default(),
            )
            .await
            .unwrap();

        assert_eq!(output.path, CapturePath::Secondary);
        assert_eq!(uc.engine.engine().runs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn permission_denied_fails_and_leaves_nothing_open() {
        let uc = RecordQrUseCase::new(
            FakePlatform::isolated(),
            FakeMicrophone::denied(),
            ogg_recorder(),
            FakeEngine::new(2_000),
            FakeRenderer::new(),
        );

        let failure = uc.execute(input(1_600), RecordCallbacks::default()).await.unwrap_err();

        assert_eq!(failure.error, PipelineError::PermissionDenied);
        assert_eq!(failure.stage, PipelineStage::Capture);
        assert_eq!(uc.state(), PipelineState::Failed);
        assert_eq!(uc.microphone.opened(), uc.microphone.released());
    }

    #[tokio::test(start_paused = true)]
    async fn transcode_failure_falls_back_once() {
        let uc = use_case(
            FakePlatform::isolated(),
            FakeEngine::new(2_000).failing_run(),
            ogg_recorder().with_output_len(1_500),
        );

        let output = uc.execute(input(1_600), RecordCallbacks::default()).await.unwrap();

        assert!(output.fallback_used);
        assert_eq!(uc.state(), PipelineState::Done);
        assert_eq!(uc.engine.engine().runs(), 1);
        let PipelineOutcome::Done { payload, .. } = output.outcome else {
            panic!("expected Done");
        };
        assert_eq!(payload.encoding(), AudioEncoding::NativeCompressed);
        assert_eq!(uc.microphone.opened(), 2);
        assert_eq!(uc.microphone.released(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn engine_load_failure_falls_back() {
        let uc = use_case(
            FakePlatform::isolated(),
            FakeEngine::new(2_000).failing_load(),
            ogg_recorder(),
        );

        let output = uc.execute(input(1_000), RecordCallbacks::default()).await.unwrap();
        assert!(output.fallback_used);
        assert_eq!(uc.engine.engine().runs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_after_fallback_is_terminal() {
        let uc = use_case(
            FakePlatform::isolated(),
            FakeEngine::new(2_000).failing_run(),
            FakeRecorder::supporting(&[]),
        );

        let failure = uc.execute(input(1_000), RecordCallbacks::default()).await.unwrap_err();

        assert_eq!(failure.stage, PipelineStage::Fallback);
        assert_eq!(failure.error, PipelineError::NoSupportedEncoding);
        assert_eq!(uc.state(), PipelineState::Failed);
        assert_eq!(uc.engine.engine().runs(), 1);
        assert_eq!(uc.microphone.opened(), uc.microphone.released());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_invocation_is_busy() {
        let uc = use_case(FakePlatform::isolated(), FakeEngine::new(2_000), ogg_recorder());

        let (first, second) = tokio::join!(
            uc.execute(input(1_000), RecordCallbacks::default()),
            uc.execute(input(1_000), RecordCallbacks::default())
        );

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err().error, PipelineError::Busy);
        assert_eq!(uc.state(), PipelineState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_state_allows_a_new_invocation() {
        let uc = use_case(FakePlatform::isolated(), FakeEngine::new(2_300), ogg_recorder());

        uc.execute(input(1_000), RecordCallbacks::default()).await.unwrap();
        assert_eq!(uc.state(), PipelineState::Rejected);

        uc.execute(input(1_000), RecordCallbacks::default()).await.unwrap();
        assert_eq!(uc.engine.engine().loads(), 1);
        assert_eq!(uc.engine.engine().runs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn state_callback_sees_transcode_path() {
        let uc = use_case(FakePlatform::isolated(), FakeEngine::new(2_000), ogg_recorder());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let callbacks = RecordCallbacks {
            on_state: Some(Box::new(move |s| sink.lock().unwrap().push(s))),
            ..Default::default()
        };
        uc.execute(input(1_000), callbacks).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                PipelineState::Capturing,
                PipelineState::Transcoding,
                PipelineState::Verifying,
                PipelineState::Done,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn render_refusal_fails_pipeline() {
        let uc = RecordQrUseCase::new(
            FakePlatform::isolated(),
            FakeMicrophone::new(48_000),
            ogg_recorder(),
            FakeEngine::new(2_000),
            FakeRenderer::failing(),
        );

        let failure = uc.execute(input(1_000), RecordCallbacks::default()).await.unwrap_err();
        assert_eq!(failure.stage, PipelineStage::Render);
        assert_eq!(uc.state(), PipelineState::Failed);
    }
}
