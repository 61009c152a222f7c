//! Batch runner: encode → exchange → interpret.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SandboxError;
use crate::interpret::{interpret, RunOutput};
use crate::record::Record;
use crate::request::encode_request;
use crate::transport::SandboxTransport;

/// Client for a remote Lua sandbox.
///
/// Safe to share across tasks: every call takes a fresh correlation id from
/// an atomic counter that starts at 1.
pub struct SandboxClient {
    transport: Arc<dyn SandboxTransport>,
    next_id: AtomicU64,
}

impl SandboxClient {
    pub fn new(transport: Arc<dyn SandboxTransport>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Run `code` against `records`.
    ///
    /// `Err` means the whole call failed and nothing was produced. `Ok` may
    /// still carry per-record failures in [`RunOutput::errors`].
    pub async fn run(&self, records: &[Record], code: &str) -> Result<RunOutput, SandboxError> {
        self.run_with_cancel(records, code, &CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), but returns [`SandboxError::Cancelled`] as
    /// soon as `cancel` fires. Nothing is interpreted after cancellation.
    pub async fn run_with_cancel(
        &self,
        records: &[Record],
        code: &str,
        cancel: &CancellationToken,
    ) -> Result<RunOutput, SandboxError> {
        let id = self.next_id();
        let body = encode_request(id, records, code)?;

        debug!(
            id,
            records = records.len(),
            bytes = body.len(),
            url = %self.transport.url(),
            "submitting batch"
        );
        let start = Instant::now();

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(id, "batch cancelled");
                return Err(SandboxError::Cancelled);
            }
            res = self.transport.exchange(body) => res?,
        };

        let output = interpret(records, id, &raw)?;

        match &output.errors {
            Some(errors) => warn!(
                id,
                failed = errors.len(),
                produced = output.records.len(),
                "batch finished with record failures"
            ),
            None => debug!(
                id,
                produced = output.records.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "batch finished"
            ),
        }

        Ok(output)
    }
}
