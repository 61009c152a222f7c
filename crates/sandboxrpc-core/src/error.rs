//! Error types: fatal call errors and per-record failures.

use serde_json::Number;
use thiserror::Error;

use crate::request::RpcError;

/// Errors that abort a whole `run` call. No output is produced.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The request body could not be serialized.
    #[error("Encoding error: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The exchange failed before a response arrived (connection refused, reset, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The sandbox answered with a non-success status. `body` is kept verbatim
    /// since the sandbox reports script timeouts this way.
    #[error("HTTP error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The transport deadline elapsed.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The caller's cancellation token fired before the exchange completed.
    #[error("Request cancelled")]
    Cancelled,

    /// The response violated the envelope contract (id, version, shape or length).
    #[error("Protocol mismatch: {0}")]
    ProtocolMismatch(String),

    /// Top-level RPC error, e.g. the filter failed to load.
    #[error("RPC call error: {0}")]
    Remote(RpcError),
}

impl SandboxError {
    /// Returns `true` if the exchange itself failed (network, status, deadline).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. } | Self::Timeout { .. })
    }

    /// Returns `true` if the filter code was rejected by the sandbox.
    pub fn is_script_error(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// Why a single record could not be interpreted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordFailure {
    /// The filter raised an error for this record.
    #[error("{0}")]
    Remote(String),

    #[error("malformed result: expected [code, timestamp, record], got {got}")]
    Shape { got: String },

    #[error("malformed result: status code must be a number, got {got}")]
    StatusType { got: &'static str },

    #[error("unrecognized status code {0}")]
    UnknownStatus(Number),

    #[error("malformed result: timestamp must be a number, got {got}")]
    TimestampType { got: &'static str },

    #[error("malformed result: record must be a map or a list of maps, got {got}")]
    PayloadType { got: &'static str },

    #[error("malformed result: split record {position} must be a map, got {got}")]
    SplitItemType { position: usize, got: &'static str },
}

/// A per-record failure tagged with the input index it came from.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("record {index}: {reason}")]
pub struct RecordError {
    pub index: usize,
    pub reason: RecordFailure,
}

impl RecordError {
    pub fn new(index: usize, reason: RecordFailure) -> Self {
        Self { index, reason }
    }

    pub fn message(&self) -> String {
        self.reason.to_string()
    }
}

/// Every per-record failure of one call, sorted by index.
///
/// Only exists when at least one record failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    failures: Vec<RecordError>,
}

impl BatchError {
    /// `None` when `failures` is empty.
    pub fn from_failures(mut failures: Vec<RecordError>) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        failures.sort_by_key(|f| f.index);
        Some(Self { failures })
    }

    pub fn failures(&self) -> &[RecordError] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Never `true` for an error built by `from_failures`.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Input indices that failed, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.failures.iter().map(|f| f.index)
    }

    pub fn into_failures(self) -> Vec<RecordError> {
        self.failures
    }
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "errors were raised processing {} record(s):", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}
