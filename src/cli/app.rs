//! Main app runners: record, encode and probe

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use serde::Serialize;

use crate::application::ports::{ConfigStore, QrImage, QrOptions};
use crate::application::{
    CapabilityProber, EncodeFileUseCase, PipelineError, PipelineOutcome, RecordCallbacks,
    RecordInput, RecordQrUseCase,
};
use crate::domain::audio::{AudioBlob, AudioEncoding, AudioMimeType};
use crate::domain::capability::{CapturePath, CaptureProfile};
use crate::domain::config::{AppConfig, EngineConfig};
use crate::domain::payload::SizeGate;
use crate::domain::pipeline::PipelineState;
use crate::domain::recording::Duration;
use crate::infrastructure::platform::resolve_binary;
use crate::infrastructure::{
    CpalMicrophone, FfmpegEngine, NativePlatform, OggOpusRecorder, QrPngRenderer, XdgConfigStore,
};

use super::config_cmd::parse_capture_duration;
use super::presenter::{format_progress, Presenter};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
pub const EXIT_REJECTED: u8 = 3;

/// Environment override for the ffmpeg binary
pub const FFMPEG_ENV: &str = "AUDIO_QR_FFMPEG";

/// Settings resolved from merged configuration
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub duration: Duration,
    pub prefer_quality: bool,
    pub output: PathBuf,
    pub data_uri: bool,
    pub payload_limit: usize,
    pub qr: QrOptions,
    pub ffmpeg_path: String,
}

impl RunOptions {
    /// Validate merged configuration. Errors are usage errors.
    pub fn from_config(config: &AppConfig, data_uri: bool) -> Result<Self, String> {
        let duration = match config.duration.as_deref() {
            Some(s) => parse_capture_duration(s).map_err(|e| format!("Invalid duration: {}", e))?,
            None => Duration::default_duration(),
        };

        let payload_limit = config.payload_limit_or_default();
        if payload_limit == 0 {
            return Err("payload_limit must be a positive integer".to_string());
        }

        Ok(Self {
            duration,
            prefer_quality: config.prefer_quality_or_default(),
            output: PathBuf::from(config.output_or_default()),
            data_uri,
            payload_limit,
            qr: QrOptions::from_config(config),
            ffmpeg_path: config.ffmpeg_path_or_default().to_string(),
        })
    }
}

/// Record from the microphone and write the QR code
pub async fn run_record(options: RunOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let use_case = RecordQrUseCase::new(
        NativePlatform::new(options.ffmpeg_path.clone()),
        CpalMicrophone::new(),
        OggOpusRecorder::new(),
        FfmpegEngine::new(&options.ffmpeg_path),
        QrPngRenderer::new(),
    )
    .with_size_gate(SizeGate::new(options.payload_limit))
    .with_qr_options(options.qr);

    let input = RecordInput {
        duration: options.duration,
        prefer_quality: options.prefer_quality,
    };

    presenter.start_spinner(&format!("Recording for {}...", options.duration));
    let callbacks = match presenter.spinner_handle() {
        Some(bar) => {
            let progress_bar = bar.clone();
            RecordCallbacks {
                on_progress: Some(Arc::new(move |elapsed, total| {
                    progress_bar.set_message(format!(
                        "Recording... {}",
                        format_progress(elapsed, total)
                    ));
                })),
                on_state: Some(Box::new(move |state| match state {
                    PipelineState::Transcoding => bar.set_message("Transcoding..."),
                    PipelineState::Verifying => bar.set_message("Checking payload size..."),
                    _ => {}
                })),
            }
        }
        None => RecordCallbacks::default(),
    };

    match use_case.execute(input, callbacks).await {
        Ok(output) => {
            if output.fallback_used {
                presenter.warn("Transcode failed; used the native recorder instead");
            }
            finish(&mut presenter, output.outcome, &options, Some(output.path)).await
        }
        Err(failure) => {
            presenter.spinner_fail(&format!("Failed during {}", failure.stage));
            presenter.error(&failure.to_string());
            if failure.error == PipelineError::PermissionDenied {
                presenter.info("Grant this terminal access to the microphone and try again");
            }
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Encode an existing audio file
pub async fn run_encode(file: &Path, options: RunOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let mime = match file
        .extension()
        .and_then(|e| e.to_str())
        .and_then(AudioMimeType::from_extension)
    {
        Some(mime) => mime,
        None => {
            presenter.error(&format!(
                "Unsupported audio file: {} (expected ogg, opus, webm, mp4, m4a or wav)",
                file.display()
            ));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let bytes = match tokio::fs::read(file).await {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => {
            presenter.error(&format!("{} is empty", file.display()));
            return ExitCode::from(EXIT_ERROR);
        }
        Err(e) => {
            presenter.error(&format!("Cannot read {}: {}", file.display(), e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let use_case = EncodeFileUseCase::new(
        QrPngRenderer::new(),
        SizeGate::new(options.payload_limit),
        options.qr,
    );
    let payload = AudioBlob::new(bytes, mime, AudioEncoding::NativeCompressed);

    presenter.start_spinner("Encoding...");
    match use_case.execute(payload) {
        Ok(outcome) => finish(&mut presenter, outcome, &options, None).await,
        Err(failure) => {
            presenter.spinner_fail("Encoding failed");
            presenter.error(&failure.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Report a terminal outcome and write the image
async fn finish(
    presenter: &mut Presenter,
    outcome: PipelineOutcome,
    options: &RunOptions,
    path: Option<CapturePath>,
) -> ExitCode {
    match outcome {
        PipelineOutcome::Done { payload, image } => {
            let via = path.map(|p| format!(", {} path", p)).unwrap_or_default();
            presenter.spinner_success(&format!(
                "Payload {} ({}{})",
                payload.human_readable_size(),
                payload.mime_type().as_str(),
                via
            ));

            if let Err(e) = write_image(&image, &options.output).await {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            presenter.success(&format!("QR code written to {}", options.output.display()));

            if options.data_uri {
                presenter.output(&image.to_data_uri());
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        PipelineOutcome::Rejected { verdict } => {
            presenter.spinner_fail("Payload too large");
            presenter.error(&verdict.rejection_message());
            ExitCode::from(EXIT_REJECTED)
        }
    }
}

async fn write_image(image: &QrImage, output: &Path) -> Result<(), String> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("Cannot create {}: {}", parent.display(), e))?;
    }
    tokio::fs::write(output, image.png())
        .await
        .map_err(|e| format!("Cannot write {}: {}", output.display(), e))
}

/// Probe output
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    #[serde(flatten)]
    pub profile: CaptureProfile,
    pub selected_path: CapturePath,
    pub ffmpeg: Option<PathBuf>,
}

/// Show capabilities and the path a recording would take
pub fn run_probe(json: bool, options: &RunOptions) -> ExitCode {
    let presenter = Presenter::new();

    let platform = NativePlatform::new(options.ffmpeg_path.clone());
    let recorder = OggOpusRecorder::new();
    let profile = CapabilityProber::new(&platform, &recorder).probe();

    let report = ProbeReport {
        selected_path: profile.select_path(options.prefer_quality),
        ffmpeg: resolve_binary(&options.ffmpeg_path),
        profile,
    };

    if json {
        return match serde_json::to_string_pretty(&report) {
            Ok(text) => {
                presenter.output(&text);
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                presenter.error(&format!("Failed to serialise probe report: {}", e));
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    let encodings: Vec<String> = report
        .profile
        .supported_compressed_encodings()
        .iter()
        .map(|e| e.to_string())
        .collect();
    let encodings = if encodings.is_empty() {
        "(none)".to_string()
    } else {
        encodings.join(", ")
    };

    presenter.key_value(
        "ffmpeg",
        &report
            .ffmpeg
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("not found ({})", options.ffmpeg_path)),
    );
    presenter.key_value(
        "scratch space",
        &report.profile.shared_memory_available().to_string(),
    );
    presenter.key_value("native encodings", &encodings);
    presenter.key_value("selected path", report.selected_path.as_str());
    if !report.profile.transcode_viable() {
        presenter.info("Install ffmpeg with libopus for the smaller transcoded payloads");
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Ignoring config file {}: {}", store.path().display(), e);
            AppConfig::empty()
        }
    };

    let env_config = AppConfig {
        engine: env::var(FFMPEG_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .map(|path| EngineConfig {
                ffmpeg_path: Some(path),
            }),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_defaults() {
        let options = RunOptions::from_config(&AppConfig::defaults(), false).unwrap();
        assert_eq!(options.duration.as_millis(), 2_500);
        assert_eq!(options.payload_limit, 2_215);
        assert!(options.prefer_quality);
        assert_eq!(options.output, PathBuf::from("audio-qr.png"));
        assert_eq!(options.qr, QrOptions::default());
        assert_eq!(options.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn options_reject_long_duration() {
        let config = AppConfig {
            duration: Some("30s".to_string()),
            ..AppConfig::defaults()
        };
        let err = RunOptions::from_config(&config, false).unwrap_err();
        assert!(err.contains("too long"));
    }

    #[test]
    fn options_reject_zero_limit() {
        let config = AppConfig {
            payload_limit: Some(0),
            ..AppConfig::defaults()
        };
        assert!(RunOptions::from_config(&config, false).is_err());
    }

    #[tokio::test]
    async fn write_image_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/qr.png");
        let image = QrImage::from_png(b"\x89PNG".to_vec());

        write_image(&image, &path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");
    }
}
