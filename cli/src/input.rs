//! NDJSON record input.

use std::io::BufRead;

use anyhow::{Context, Result};
use sandboxrpc_core::Record;

/// Read one `{"timestamp": .., "attrs": {..}}` object per line. Blank lines
/// are skipped.
pub fn read_records(reader: impl BufRead) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", n + 1))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(line)
            .with_context(|| format!("invalid record on line {}", n + 1))?;
        records.push(record);
    }
    Ok(records)
}
