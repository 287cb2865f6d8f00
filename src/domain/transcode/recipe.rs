//! Fixed transcode recipe for the codec engine
//!
//! Mirrors the speech-optimised settings the payload budget was tuned for:
//! - Leading silence below -50 dB removed
//! - Hard trim to 1.4 seconds
//! - Opus (libopus) at 8 kbps, mono, 8 kHz
//! - VOIP application, 20% packet loss hint, 60 ms frames
//! - MP4 container, bit-exact muxing

use std::fmt;

use crate::domain::audio::AudioMimeType;
use crate::domain::recording::Duration;

/// One filter in the engine's audio filter chain
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Drop leading audio quieter than `threshold_db`
    SilenceTrim { start_periods: u32, threshold_db: i32 },
    /// Keep at most `max` of audio
    DurationTrim { max: Duration },
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SilenceTrim {
                start_periods,
                threshold_db,
            } => write!(
                f,
                "silenceremove=start_periods={}:start_threshold={}dB",
                start_periods, threshold_db
            ),
            Self::DurationTrim { max } => write!(f, "atrim=duration={}", max.as_secs_f64()),
        }
    }
}

/// Engine invocation parameters. A fixed configuration value; only the
/// capture duration is user-variable.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeRecipe {
    pub input_name: String,
    pub output_name: String,
    pub output_mime: AudioMimeType,
    pub filter_chain: Vec<FilterSpec>,
    pub codec: String,
    pub bitrate_bps: u32,
    pub channel_count: u8,
    pub sample_rate: u32,
    pub codec_application_hint: String,
    pub packet_loss_hint: u8,
    pub compression_level: u8,
    pub frame_duration_ms: u32,
    /// Strip encoder/muxer metadata so identical input gives identical bytes
    pub bitexact: bool,
}

impl TranscodeRecipe {
    /// The recipe tuned for a version 40 / level L QR payload
    pub fn speech_qr() -> Self {
        Self {
            input_name: "in.wav".to_string(),
            output_name: "out.mp4".to_string(),
            output_mime: AudioMimeType::Mp4,
            filter_chain: vec![
                FilterSpec::SilenceTrim {
                    start_periods: 1,
                    threshold_db: -50,
                },
                FilterSpec::DurationTrim {
                    max: Duration::from_millis(1_400),
                },
            ],
            codec: "libopus".to_string(),
            bitrate_bps: 8_000,
            channel_count: 1,
            sample_rate: 8_000,
            codec_application_hint: "voip".to_string(),
            packet_loss_hint: 20,
            compression_level: 10,
            frame_duration_ms: 60,
            bitexact: true,
        }
    }

    /// Comma-joined filter graph, or None when the chain is empty
    pub fn filter_graph(&self) -> Option<String> {
        if self.filter_chain.is_empty() {
            return None;
        }
        Some(
            self.filter_chain
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Bitrate in ffmpeg shorthand ("8k" for 8000)
    fn bitrate_arg(&self) -> String {
        if self.bitrate_bps % 1000 == 0 {
            format!("{}k", self.bitrate_bps / 1000)
        } else {
            self.bitrate_bps.to_string()
        }
    }

    /// Build the engine argument vector. Names refer to the engine's
    /// virtual file slots, not host paths.
    pub fn to_argv(&self) -> Vec<String> {
        let mut args = vec!["-i".to_string(), self.input_name.clone()];

        if let Some(graph) = self.filter_graph() {
            args.push("-af".to_string());
            args.push(graph);
        }

        args.extend([
            "-c:a".to_string(),
            self.codec.clone(),
            "-b:a".to_string(),
            self.bitrate_arg(),
            "-ac".to_string(),
            self.channel_count.to_string(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
            "-application".to_string(),
            self.codec_application_hint.clone(),
            "-packet_loss".to_string(),
            self.packet_loss_hint.to_string(),
            "-compression_level".to_string(),
            self.compression_level.to_string(),
            "-frame_duration".to_string(),
            self.frame_duration_ms.to_string(),
        ]);

        if self.bitexact {
            args.extend([
                "-fflags".to_string(),
                "+bitexact".to_string(),
                "-flags:a".to_string(),
                "+bitexact".to_string(),
            ]);
        }

        args.push(self.output_name.clone());
        args
    }
}

impl Default for TranscodeRecipe {
    fn default() -> Self {
        Self::speech_qr()
    }
}
