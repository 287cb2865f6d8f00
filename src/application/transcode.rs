//! Transcoding through the external codec engine

use thiserror::Error;
use tokio::sync::OnceCell;

use crate::domain::audio::{AudioBlob, AudioEncoding};
use crate::domain::transcode::TranscodeRecipe;

use super::ports::{CodecEngine, EngineError};

/// Transcode errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscodeError {
    #[error("Codec engine could not be loaded: {0}")]
    EngineLoadFailed(String),

    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),
}

impl From<EngineError> for TranscodeError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::LoadFailed(msg) => Self::EngineLoadFailed(msg),
            other => Self::TranscodeFailed(other.to_string()),
        }
    }
}

/// Wraps a codec engine so it is loaded at most once per process.
///
/// Concurrent callers share a single in-flight load. A failed load is not
/// remembered; the next caller tries again.
pub struct TranscodeEngine<E> {
    engine: E,
    loaded: OnceCell<()>,
}

impl<E: CodecEngine> TranscodeEngine<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            loaded: OnceCell::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub async fn ensure_loaded(&self) -> Result<(), TranscodeError> {
        self.loaded
            .get_or_try_init(|| async {
                if self.engine.is_loaded() {
                    return Ok(());
                }
                log::info!("Loading codec engine");
                self.engine.load().await.map_err(|e| match e {
                    EngineError::LoadFailed(msg) => TranscodeError::EngineLoadFailed(msg),
                    other => TranscodeError::EngineLoadFailed(other.to_string()),
                })
            })
            .await
            .map(|_| ())
    }

    /// Run `recipe` over `input` and return the compressed result
    pub async fn transcode(
        &self,
        input: &AudioBlob,
        recipe: &TranscodeRecipe,
    ) -> Result<AudioBlob, TranscodeError> {
        self.ensure_loaded().await?;

        self.engine
            .write_input(&recipe.input_name, input.bytes())
            .await?;

        let argv = recipe.to_argv();
        log::debug!("Engine argv: {}", argv.join(" "));
        self.engine.run(&argv).await?;

        let output = self.engine.read_output(&recipe.output_name).await?;
        if output.is_empty() {
            return Err(TranscodeError::TranscodeFailed(
                "engine produced an empty output".to_string(),
            ));
        }

        log::info!(
            "Transcoded {} -> {} bytes",
            input.byte_len(),
            output.len()
        );
        Ok(AudioBlob::new(
            output,
            recipe.output_mime,
            AudioEncoding::TranscodedCompressed,
        ))
    }
}
