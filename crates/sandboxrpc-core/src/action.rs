//! Typed per-record verdicts.
//!
//! The sandbox answers each record with `[code, timestamp, payload]`, where
//! the status code decides how the other two elements are read:
//!
//! | code | meaning                                                    |
//! |------|------------------------------------------------------------|
//! | `-1` | drop the record                                            |
//! | `0`  | keep the input record as is                                |
//! | `1`  | replace it, timestamp from element 1                       |
//! | `2`  | replace it, keep the input timestamp                       |
//!
//! [`RecordAction::parse`] is the only place that looks at the raw tuple.

use serde_json::Value;

use crate::error::RecordFailure;
use crate::record::{Attrs, Record};

/// Replacement content: one map, or a split into several.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Single(Attrs),
    Many(Vec<Attrs>),
}

impl Payload {
    pub fn parse(value: Value) -> Result<Self, RecordFailure> {
        match value {
            Value::Object(attrs) => Ok(Self::Single(attrs)),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(position, item)| match item {
                    Value::Object(attrs) => Ok(attrs),
                    other => Err(RecordFailure::SplitItemType {
                        position,
                        got: kind_of(&other),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            other => Err(RecordFailure::PayloadType { got: kind_of(&other) }),
        }
    }

    /// Number of records this payload emits.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_vec(self) -> Vec<Attrs> {
        match self {
            Self::Single(attrs) => vec![attrs],
            Self::Many(items) => items,
        }
    }
}

/// What to do with one input record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordAction {
    Drop,
    PassThrough,
    Replace { timestamp: f64, payload: Payload },
    ReplaceKeepTimestamp { payload: Payload },
}

impl RecordAction {
    /// Parse a raw `[code, timestamp, payload]` tuple.
    pub fn parse(value: Value) -> Result<Self, RecordFailure> {
        let mut items = match value {
            Value::Array(items) if items.len() == 3 => items,
            Value::Array(items) => {
                return Err(RecordFailure::Shape {
                    got: format!("array of {} elements", items.len()),
                })
            }
            other => {
                return Err(RecordFailure::Shape {
                    got: kind_of(&other).to_string(),
                })
            }
        };

        let code = match &items[0] {
            Value::Number(n) => n.clone(),
            other => return Err(RecordFailure::StatusType { got: kind_of(other) }),
        };

        match code.as_f64() {
            Some(c) if c == -1.0 => Ok(Self::Drop),
            Some(c) if c == 0.0 => Ok(Self::PassThrough),
            Some(c) if c == 1.0 => {
                let timestamp = items[1]
                    .as_f64()
                    .ok_or_else(|| RecordFailure::TimestampType { got: kind_of(&items[1]) })?;
                let payload = Payload::parse(items.swap_remove(2))?;
                Ok(Self::Replace { timestamp, payload })
            }
            Some(c) if c == 2.0 => {
                let payload = Payload::parse(items.swap_remove(2))?;
                Ok(Self::ReplaceKeepTimestamp { payload })
            }
            _ => Err(RecordFailure::UnknownStatus(code)),
        }
    }

    /// Append the records this action produces for `original` to `out`.
    pub fn emit(self, original: &Record, out: &mut Vec<Record>) {
        let (timestamp, payload) = match self {
            Self::Drop => return,
            Self::PassThrough => {
                out.push(original.clone());
                return;
            }
            Self::Replace { timestamp, payload } => (timestamp, payload),
            Self::ReplaceKeepTimestamp { payload } => (original.timestamp, payload),
        };
        out.extend(
            payload
                .into_vec()
                .into_iter()
                .map(|attrs| Record::new(timestamp, attrs)),
        );
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attrs {
        match value {
            Value::Object(map) => map,
            _ => panic!("not a map"),
        }
    }

    fn original() -> Record {
        Record::new(5.25, attrs(json!({ "log": "in" })))
    }

    #[test]
    fn drop_and_pass_through_ignore_other_elements() {
        assert_eq!(RecordAction::parse(json!([-1, null, null])).unwrap(), RecordAction::Drop);
        assert_eq!(
            RecordAction::parse(json!([0, "not a ts", 17])).unwrap(),
            RecordAction::PassThrough
        );
    }

    #[test]
    fn replace_reads_timestamp() {
        let action = RecordAction::parse(json!([1, 11.5, { "msg": "x" }])).unwrap();
        assert_eq!(
            action,
            RecordAction::Replace {
                timestamp: 11.5,
                payload: Payload::Single(attrs(json!({ "msg": "x" }))),
            }
        );
    }

    #[test]
    fn keep_timestamp_ignores_element_one() {
        let action = RecordAction::parse(json!([2, "garbage", { "msg": "x" }])).unwrap();
        let mut out = Vec::new();
        action.emit(&original(), &mut out);
        assert_eq!(out, vec![Record::new(5.25, attrs(json!({ "msg": "x" })))]);
    }

    #[test]
    fn integral_float_codes_are_accepted() {
        assert_eq!(RecordAction::parse(json!([-1.0, 0, {}])).unwrap(), RecordAction::Drop);
    }

    #[test]
    fn split_payload_shares_timestamp() {
        let action = RecordAction::parse(json!([1, 3.0, [{ "n": 1 }, { "n": 2 }, { "n": 3 }]])).unwrap();
        let mut out = Vec::new();
        action.emit(&original(), &mut out);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.timestamp == 3.0));
        assert_eq!(out[2].attrs["n"], 3);
    }

    #[test]
    fn empty_split_emits_nothing() {
        let action = RecordAction::parse(json!([1, 3.0, []])).unwrap();
        let mut out = Vec::new();
        action.emit(&original(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(
            RecordAction::parse(json!([1, 2.0])).unwrap_err(),
            RecordFailure::Shape { got: "array of 2 elements".into() }
        );
        assert_eq!(
            RecordAction::parse(Value::Null).unwrap_err(),
            RecordFailure::Shape { got: "null".into() }
        );
        assert_eq!(
            RecordAction::parse(json!(["1", 0, {}])).unwrap_err(),
            RecordFailure::StatusType { got: "string" }
        );
        assert_eq!(
            RecordAction::parse(json!([1, null, {}])).unwrap_err(),
            RecordFailure::TimestampType { got: "null" }
        );
        assert_eq!(
            RecordAction::parse(json!([2, 0, "text"])).unwrap_err(),
            RecordFailure::PayloadType { got: "string" }
        );
        assert_eq!(
            RecordAction::parse(json!([1, 0, [{}, 4]])).unwrap_err(),
            RecordFailure::SplitItemType { position: 1, got: "number" }
        );
    }

    #[test]
    fn unknown_codes_are_rejected() {
        let err = RecordAction::parse(json!([3, 0, {}])).unwrap_err();
        assert_eq!(err.to_string(), "unrecognized status code 3");
        let err = RecordAction::parse(json!([1.5, 0, {}])).unwrap_err();
        assert_eq!(err.to_string(), "unrecognized status code 1.5");
    }
}
