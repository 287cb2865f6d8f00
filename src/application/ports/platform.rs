//! Platform capability signals port

/// Read-only environment signals the codec engine depends on.
/// Implementations must not fail; an absent feature reads as `false`.
pub trait PlatformSignals: Send + Sync {
    /// The execution context the engine needs is available
    fn is_isolated(&self) -> bool;

    /// The engine's shared working memory can be provided
    fn shared_memory_available(&self) -> bool;
}
