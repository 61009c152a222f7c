//! The `SandboxTransport` trait, the seam between the runner and the wire.

use async_trait::async_trait;

use crate::error::SandboxError;

/// Moves one encoded request to the sandbox and returns the raw response body.
///
/// Implementations report a non-success status as [`SandboxError::Status`]
/// with the body attached, and must not retry.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn SandboxTransport>`.
#[async_trait]
pub trait SandboxTransport: Send + Sync + 'static {
    /// Perform a single request/response exchange.
    async fn exchange(&self, body: Vec<u8>) -> Result<Vec<u8>, SandboxError>;

    /// Return the transport's identifier (URL or name).
    fn url(&self) -> &str;
}
