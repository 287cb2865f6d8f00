//! Size-gate and render a finished payload

use crate::domain::audio::AudioBlob;
use crate::domain::payload::SizeGate;

use super::ports::{QrOptions, QrRenderer};
use super::record_qr::{PipelineError, PipelineFailure, PipelineOutcome, PipelineStage};

/// Measure `payload` and, if it fits, render its base64 form as a QR image.
/// Oversized payloads are never clipped.
pub(crate) fn gate_and_render<Q>(
    renderer: &Q,
    gate: SizeGate,
    options: &QrOptions,
    payload: AudioBlob,
) -> Result<PipelineOutcome, PipelineFailure>
where
    Q: QrRenderer + ?Sized,
{
    let verdict = gate.check(&payload);
    log::info!(
        "Payload size: {} bytes (limit {} bytes)",
        verdict.byte_length,
        verdict.limit_bytes
    );

    if !verdict.within_limit {
        return Ok(PipelineOutcome::Rejected { verdict });
    }

    let image = renderer
        .render(&payload.to_base64(), options)
        .map_err(|e| {
            PipelineFailure::new(PipelineStage::Render, PipelineError::RenderFailed(e.to_string()))
        })?;

    Ok(PipelineOutcome::Done { payload, image })
}

/// Turns an existing compressed audio file into a QR image
pub struct EncodeFileUseCase<Q: QrRenderer> {
    renderer: Q,
    gate: SizeGate,
    options: QrOptions,
}

impl<Q: QrRenderer> EncodeFileUseCase<Q> {
    pub fn new(renderer: Q, gate: SizeGate, options: QrOptions) -> Self {
        Self {
            renderer,
            gate,
            options,
        }
    }

    pub fn execute(&self, payload: AudioBlob) -> Result<PipelineOutcome, PipelineFailure> {
        gate_and_render(&self.renderer, self.gate, &self.options, payload)
    }
}
