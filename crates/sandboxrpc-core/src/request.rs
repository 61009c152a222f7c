//! JSON-RPC 2.0 wire types for the sandbox `run` method.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SandboxError;
use crate::record::{Attrs, Record};

/// Protocol version sent and expected back.
pub const JSONRPC_VERSION: &str = "2.0";

/// The only method the sandbox exposes.
pub const RUN_METHOD: &str = "run";

/// JSON-RPC request ID: a number, a string, or null.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    #[default]
    Null,
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Parameters of a `run` call. Only attribute maps travel; input
/// timestamps stay on the client.
#[derive(Debug, Clone, Serialize)]
pub struct RunParams<'a> {
    pub events: Vec<&'a Attrs>,
    pub filter: &'a str,
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<P> {
    pub jsonrpc: &'static str,
    pub id: RpcId,
    pub method: &'static str,
    pub params: P,
}

impl<'a> JsonRpcRequest<RunParams<'a>> {
    /// Build a `run` request for `records` and `code`.
    pub fn run(id: u64, records: &'a [Record], code: &'a str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: RpcId::Number(id),
            method: RUN_METHOD,
            params: RunParams {
                events: records.iter().map(|r| &r.attrs).collect(),
                filter: code,
            },
        }
    }
}

/// Serialize a `run` request body.
pub fn encode_request(id: u64, records: &[Record], code: &str) -> Result<Vec<u8>, SandboxError> {
    serde_json::to_vec(&JsonRpcRequest::run(id, records, code)).map_err(SandboxError::Encoding)
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.message)
    }
}

/// One entry of the response `result` array.
///
/// Entries that are not objects, or whose `error` is not a string, land in
/// `Unexpected` so a single bad entry never fails the whole envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RecordResult {
    Entry {
        result: Option<Value>,
        error: Option<String>,
    },
    Unexpected(Value),
}

impl From<Value> for RecordResult {
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::Unexpected(value);
        };
        let error = match map.remove("error") {
            None | Some(Value::Null) => None,
            Some(Value::String(msg)) => Some(msg),
            Some(other) => {
                map.insert("error".into(), other);
                return Self::Unexpected(Value::Object(map));
            }
        };
        let result = map.remove("result").filter(|v| !v.is_null());
        Self::Entry { result, error }
    }
}

impl From<RecordResult> for Value {
    fn from(entry: RecordResult) -> Self {
        match entry {
            RecordResult::Entry { result, error } => {
                let mut map = serde_json::Map::new();
                if let Some(result) = result {
                    map.insert("result".into(), result);
                }
                if let Some(error) = error {
                    map.insert("error".into(), Value::String(error));
                }
                Value::Object(map)
            }
            RecordResult::Unexpected(value) => value,
        }
    }
}

impl RecordResult {
    /// Successful entry carrying `[code, ts, payload]`.
    pub fn ok(value: Value) -> Self {
        Self::Entry { result: Some(value), error: None }
    }

    /// Entry whose transformation raised `message`.
    pub fn err(message: impl Into<String>) -> Self {
        Self::Entry { result: None, error: Some(message.into()) }
    }
}

/// A JSON-RPC 2.0 response to `run`.
///
/// Missing `jsonrpc` / `id` decode to empty defaults so the envelope checks
/// can report them instead of a generic decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: RpcId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<RecordResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    /// Returns `true` if the response carries no top-level error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Per-record results, or the top-level error.
    pub fn into_result(self) -> Result<Vec<RecordResult>, RpcError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(log: &str, ts: f64) -> Record {
        let mut attrs = Attrs::new();
        attrs.insert("log".into(), json!(log));
        Record::new(ts, attrs)
    }

    #[test]
    fn run_request_serialization() {
        let records = vec![record("one", 1.5), record("two", 2.5)];
        let body = encode_request(7, &records, "return 0").unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "run",
                "params": {
                    "events": [{ "log": "one" }, { "log": "two" }],
                    "filter": "return 0"
                }
            })
        );
    }

    #[test]
    fn empty_batch_sends_empty_events() {
        let body = encode_request(1, &[], "").unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["params"]["events"], json!([]));
    }

    #[test]
    fn response_entries_decode() {
        let resp: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "result": [
                { "result": [1, 2.5, { "a": 1 }] },
                { "error": "boom" },
                42,
                { "error": { "nested": true } },
                [[1, 0, {}]]
            ]
        }))
        .unwrap();
        assert_eq!(resp.id, RpcId::Number(3));
        let entries = resp.into_result().unwrap();
        assert_eq!(entries[0], RecordResult::ok(json!([1, 2.5, { "a": 1 }])));
        assert_eq!(entries[1], RecordResult::err("boom"));
        assert_eq!(entries[2], RecordResult::Unexpected(json!(42)));
        assert!(matches!(entries[3], RecordResult::Unexpected(_)));
        assert!(matches!(entries[4], RecordResult::Unexpected(_)));
    }

    #[test]
    fn response_into_result_error() {
        let resp: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 21, "message": "error loading script" }
        }))
        .unwrap();
        assert!(!resp.is_ok());
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, 21);
        assert_eq!(err.to_string(), "21 (error loading script)");
    }

    #[test]
    fn missing_version_and_id_default() {
        let resp: JsonRpcResponse = serde_json::from_value(json!({ "result": [] })).unwrap();
        assert_eq!(resp.jsonrpc, "");
        assert_eq!(resp.id, RpcId::Null);
    }
}
