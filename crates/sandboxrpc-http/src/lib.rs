//! sandboxrpc-http: HTTP transport for SandboxRPC.
//!
//! # Quick start
//! ```rust,no_run
//! use sandboxrpc_core::Record;
//!
//! # async fn demo() -> Result<(), sandboxrpc_core::SandboxError> {
//! let client = sandboxrpc_http::client("http://localhost:5555/jsonrpc")?;
//! let records: Vec<Record> = Vec::new();
//! let output = client
//!     .run(&records, "function cb_filter(tag, ts, record) return 0, ts, record end")
//!     .await?;
//! println!("{} records out", output.records.len());
//! # Ok(())
//! # }
//! ```

pub mod client;

#[cfg(test)]
mod test_server;

use std::sync::Arc;

use sandboxrpc_core::{SandboxClient, SandboxError};

pub use client::{HttpClientConfig, HttpTransport};

/// `SandboxClient` talking to `url` over HTTP with default settings.
pub fn client(url: impl Into<String>) -> Result<SandboxClient, SandboxError> {
    client_with_config(url, HttpClientConfig::default())
}

/// `SandboxClient` talking to `url` over HTTP.
pub fn client_with_config(
    url: impl Into<String>,
    config: HttpClientConfig,
) -> Result<SandboxClient, SandboxError> {
    let transport = HttpTransport::new(url, config)?;
    Ok(SandboxClient::new(Arc::new(transport)))
}
