//! FFmpeg codec engine adapter
//!
//! The engine's file slots map to a private scratch directory; ffmpeg is run
//! with that directory as its working directory so argv names stay relative.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;

use crate::application::ports::{CodecEngine, EngineError};

/// Encoder the transcode recipe depends on
const REQUIRED_ENCODER: &str = "libopus";

/// Scratch directory removed on drop
struct Workspace {
    path: PathBuf,
}

impl Workspace {
    fn create() -> Result<Self, EngineError> {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        let path = std::env::temp_dir().join(format!(
            "audio-qr-{}-{}",
            std::process::id(),
            timestamp
        ));
        std::fs::create_dir_all(&path).map_err(|e| {
            EngineError::LoadFailed(format!("cannot create workspace {}: {}", path.display(), e))
        })?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Best-effort cleanup
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Runs the system ffmpeg binary
pub struct FfmpegEngine {
    binary: PathBuf,
    workspace: OnceLock<Workspace>,
}

impl FfmpegEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            workspace: OnceLock::new(),
        }
    }

    fn workspace(&self) -> Result<&Path, EngineError> {
        self.workspace
            .get()
            .map(Workspace::path)
            .ok_or(EngineError::NotLoaded)
    }

    /// Resolve a slot name inside the workspace
    fn slot(&self, name: &str) -> Result<PathBuf, EngineError> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.starts_with('-');
        if !plain {
            return Err(EngineError::InvalidName(name.to_string()));
        }
        Ok(self.workspace()?.join(name))
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("-hide_banner")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

/// Last non-empty stderr line, which is where ffmpeg puts the reason
fn last_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("unknown error")
        .trim()
        .to_string()
}

#[async_trait]
impl CodecEngine for FfmpegEngine {
    fn is_loaded(&self) -> bool {
        self.workspace.get().is_some()
    }

    async fn load(&self) -> Result<(), EngineError> {
        if self.is_loaded() {
            return Ok(());
        }

        let output = self
            .command()
            .arg("-encoders")
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::LoadFailed(format!(
                        "ffmpeg not found at '{}'",
                        self.binary.display()
                    ))
                } else {
                    EngineError::LoadFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            return Err(EngineError::LoadFailed(last_line(&output.stderr)));
        }

        let encoders = String::from_utf8_lossy(&output.stdout);
        if !encoders.contains(REQUIRED_ENCODER) {
            return Err(EngineError::LoadFailed(format!(
                "ffmpeg at '{}' was built without {}",
                self.binary.display(),
                REQUIRED_ENCODER
            )));
        }

        let workspace = Workspace::create()?;
        log::debug!("Codec engine workspace: {}", workspace.path().display());
        // A concurrent load may have won; its workspace is kept and ours dropped
        let _ = self.workspace.set(workspace);
        Ok(())
    }

    async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        let path = self.slot(name)?;
        fs::write(&path, bytes)
            .await
            .map_err(|e| EngineError::Io(format!("{}: {}", name, e)))
    }

    async fn run(&self, argv: &[String]) -> Result<(), EngineError> {
        let workspace = self.workspace()?;

        let output = self
            .command()
            .args(["-loglevel", "error", "-nostdin", "-y"])
            .args(argv)
            .current_dir(workspace)
            .output()
            .await
            .map_err(|e| EngineError::RunFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(EngineError::RunFailed(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                last_line(&output.stderr)
            )));
        }
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        let path = self.slot(name)?;
        fs::read(&path)
            .await
            .map_err(|e| EngineError::Io(format!("{}: {}", name, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::pcm::encode_wav;
    use crate::domain::transcode::TranscodeRecipe;

    #[tokio::test]
    async fn unloaded_engine_refuses_io() {
        let engine = FfmpegEngine::new("ffmpeg");
        assert!(!engine.is_loaded());
        assert_eq!(
            engine.write_input("in.wav", b"x").await,
            Err(EngineError::NotLoaded)
        );
        assert_eq!(engine.run(&[]).await, Err(EngineError::NotLoaded));
    }

    #[tokio::test]
    async fn missing_binary_fails_to_load() {
        let engine = FfmpegEngine::new("/nonexistent/bin/ffmpeg-audio-qr");
        let err = engine.load().await.unwrap_err();
        assert!(matches!(err, EngineError::LoadFailed(msg) if msg.contains("not found")));
        assert!(!engine.is_loaded());
    }

    #[test]
    fn last_line_skips_trailing_blanks() {
        assert_eq!(last_line(b"first\nUnknown encoder 'x'\n\n"), "Unknown encoder 'x'");
        assert_eq!(last_line(b""), "unknown error");
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg with libopus on PATH"]
    async fn transcodes_wav_to_small_opus() {
        let engine = FfmpegEngine::new("ffmpeg");
        engine.load().await.unwrap();

        assert!(matches!(
            engine.write_input("../escape.wav", b"x").await,
            Err(EngineError::InvalidName(_))
        ));

        let samples: Vec<i16> = (0..48_000)
            .map(|i| ((i as f32 * 0.05).sin() * 8_000.0) as i16)
            .collect();
        let recipe = TranscodeRecipe::speech_qr();
        engine
            .write_input(&recipe.input_name, &encode_wav(&samples, 48_000))
            .await
            .unwrap();
        engine.run(&recipe.to_argv()).await.unwrap();

        let first = engine.read_output(&recipe.output_name).await.unwrap();
        assert!(!first.is_empty());
        assert!(first.len() < 2_215);

        engine.run(&recipe.to_argv()).await.unwrap();
        let second = engine.read_output(&recipe.output_name).await.unwrap();
        assert_eq!(first, second);
    }
}
