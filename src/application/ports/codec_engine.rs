//! External codec engine port interface

use async_trait::async_trait;
use thiserror::Error;

/// Codec engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Codec engine failed to load: {0}")]
    LoadFailed(String),

    #[error("Codec engine is not loaded")]
    NotLoaded,

    #[error("Invalid engine file name: {0}")]
    InvalidName(String),

    #[error("Engine file I/O failed: {0}")]
    Io(String),

    #[error("Engine run failed: {0}")]
    RunFailed(String),
}

/// Port for an external codec engine with a virtual file system.
///
/// File names passed to `write_input`, `run` and `read_output` refer to the
/// engine's own slots, never to host paths.
#[async_trait]
pub trait CodecEngine: Send + Sync {
    /// Whether the engine is initialised
    fn is_loaded(&self) -> bool;

    /// Initialise the engine. Idempotent.
    async fn load(&self) -> Result<(), EngineError>;

    /// Place bytes into an input slot
    async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError>;

    /// Run the engine with an argument vector
    async fn run(&self, argv: &[String]) -> Result<(), EngineError>;

    /// Read back an output slot
    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError>;
}
