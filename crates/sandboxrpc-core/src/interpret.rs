//! Response interpretation: raw `run` response body → output records.

use tracing::warn;

use crate::action::RecordAction;
use crate::error::{BatchError, RecordError, RecordFailure, SandboxError};
use crate::record::Record;
use crate::request::{JsonRpcResponse, RecordResult, RpcId, JSONRPC_VERSION};

/// Result of a `run` call that reached the per-record stage.
///
/// `records` is always usable, even when `errors` is set: a failure at one
/// index never removes output produced for another.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub records: Vec<Record>,
    pub errors: Option<BatchError>,
}

impl RunOutput {
    /// Returns `true` if no record failed.
    pub fn is_complete(&self) -> bool {
        self.errors.is_none()
    }

    /// All-or-nothing view: the records only if every input succeeded.
    pub fn into_result(self) -> Result<Vec<Record>, BatchError> {
        match self.errors {
            Some(err) => Err(err),
            None => Ok(self.records),
        }
    }
}

/// Interpret the raw response `body` to a `run` request that carried
/// `records` under id `sent_id`.
pub fn interpret(records: &[Record], sent_id: u64, body: &[u8]) -> Result<RunOutput, SandboxError> {
    let response: JsonRpcResponse = serde_json::from_slice(body)
        .map_err(|e| SandboxError::ProtocolMismatch(format!("undecodable response: {e}")))?;
    let results = check_envelope(response, sent_id, records.len())?;
    Ok(interpret_results(records, results))
}

/// Request-level checks, in order: id, version, top-level error, length.
fn check_envelope(
    response: JsonRpcResponse,
    sent_id: u64,
    expected: usize,
) -> Result<Vec<RecordResult>, SandboxError> {
    if response.id != RpcId::Number(sent_id) {
        return Err(SandboxError::ProtocolMismatch(format!(
            "mismatched jsonrpc id: sent {sent_id}, got {}",
            response.id
        )));
    }
    if response.jsonrpc != JSONRPC_VERSION {
        return Err(SandboxError::ProtocolMismatch(format!(
            "unsupported jsonrpc version {:?}",
            response.jsonrpc
        )));
    }
    let results = response.into_result().map_err(SandboxError::Remote)?;
    if results.len() != expected {
        return Err(SandboxError::ProtocolMismatch(format!(
            "expected {expected} results, got {}",
            results.len()
        )));
    }
    Ok(results)
}

/// Apply each per-record result to its input record. Never short-circuits.
///
/// `results` must be aligned 1:1 with `records`.
pub fn interpret_results(records: &[Record], results: Vec<RecordResult>) -> RunOutput {
    let mut output = Vec::with_capacity(records.len());
    let mut failures = Vec::new();

    for (index, (original, result)) in records.iter().zip(results).enumerate() {
        match resolve(result) {
            Ok(action) => action.emit(original, &mut output),
            Err(reason) => {
                warn!(index, error = %reason, "record failed in sandbox");
                failures.push(RecordError::new(index, reason));
            }
        }
    }

    RunOutput {
        records: output,
        errors: BatchError::from_failures(failures),
    }
}

fn resolve(result: RecordResult) -> Result<RecordAction, RecordFailure> {
    match result {
        RecordResult::Entry { error: Some(msg), .. } if !msg.is_empty() => {
            Err(RecordFailure::Remote(msg))
        }
        RecordResult::Entry { result: Some(value), .. } => RecordAction::parse(value),
        RecordResult::Entry { result: None, .. } => Err(RecordFailure::Shape {
            got: "no result".into(),
        }),
        RecordResult::Unexpected(value) => Err(RecordFailure::Shape {
            got: format!("entry {value}"),
        }),
    }
}
