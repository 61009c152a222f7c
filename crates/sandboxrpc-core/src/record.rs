//! Log record model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute map of a record: string keys to arbitrary JSON values.
pub type Attrs = Map<String, Value>;

/// A single log record as seen by the sandbox.
///
/// Records are never mutated by the client; interpreting a response only
/// clones input records or builds new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Epoch seconds with fractional precision.
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub attrs: Attrs,
}

impl Record {
    pub fn new(timestamp: f64, attrs: Attrs) -> Self {
        Self { timestamp, attrs }
    }

    /// Record with a zero timestamp.
    pub fn from_attrs(attrs: Attrs) -> Self {
        Self::new(0.0, attrs)
    }
}
