//! PCM helpers: WAV container, resampling
//!
//! All functions work on mono i16 samples.

use rubato::{FftFixedIn, Resampler};
use thiserror::Error;

/// Size of the standard WAV RIFF header in bytes
pub const WAV_HEADER_SIZE: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;

/// Resampling errors
#[derive(Debug, Clone, Error)]
#[error("Resampling failed: {0}")]
pub struct ResampleError(pub String);

/// Wrap mono 16-bit samples in a PCM WAV container.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-15]   "WAVEfmt "
/// [16-19]  16, [20-21] 1 (PCM), [22-23] channels
/// [24-27]  sample_rate, [28-31] byte_rate, [32-33] block_align, [34-35] bits
/// [36-39]  "data", [40-43] data_size
/// ```
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let channels: u16 = 1;
    let block_align = channels * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_size = (samples.len() * 2) as u32;

    let mut wav = Vec::with_capacity(WAV_HEADER_SIZE + data_size as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());

    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }
    wav
}

/// Duration in seconds of a mono 16-bit WAV produced by [`encode_wav`]
pub fn wav_duration_secs(wav: &[u8]) -> Option<f64> {
    if wav.len() < WAV_HEADER_SIZE || &wav[0..4] != b"RIFF" {
        return None;
    }
    let sample_rate = u32::from_le_bytes(wav[24..28].try_into().ok()?);
    let data_size = u32::from_le_bytes(wav[40..44].try_into().ok()?);
    if sample_rate == 0 {
        return None;
    }
    Some(data_size as f64 / 2.0 / sample_rate as f64)
}

/// Average interleaved channels down to mono
pub fn downmix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Resample mono audio between rates
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Result<Vec<i16>, ResampleError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

    let ratio = to_rate as f64 / from_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        1024, // Chunk size
        2,    // Sub-chunks
        1,    // Mono
    )
    .map_err(|e| ResampleError(format!("init: {}", e)))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());

        let mut chunk = samples_f32[input_pos..end_pos].to_vec();
        chunk.resize(frames_needed, 0.0);

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| ResampleError(e.to_string()))?;

        output.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
        input_pos = end_pos;
    }

    output.truncate(output_len);
    Ok(output)
}
