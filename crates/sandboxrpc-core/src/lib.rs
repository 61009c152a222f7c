//! sandboxrpc-core: record model, wire types and response interpreter for SandboxRPC.
//!
//! # Overview
//!
//! SandboxRPC submits batches of log records to a remote Lua sandbox and
//! turns the sandbox's per-record verdicts back into records. The core crate
//! defines:
//!
//! - [`Record`] / [`Attrs`]: the log record model
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types and [`encode_request`]
//! - [`RecordAction`] / [`Payload`]: the typed form of a per-record verdict
//! - [`interpret`]: response envelope → [`RunOutput`]
//! - [`SandboxError`] / [`BatchError`]: fatal and per-record error types
//! - [`SandboxTransport`]: the seam every transport implements
//! - [`SandboxClient`]: the batch runner

pub mod action;
pub mod client;
pub mod error;
pub mod interpret;
pub mod record;
pub mod request;
pub mod transport;

pub use action::{Payload, RecordAction};
pub use client::SandboxClient;
pub use error::{BatchError, RecordError, RecordFailure, SandboxError};
pub use interpret::{interpret, RunOutput};
pub use record::{Attrs, Record};
pub use request::{
    encode_request, JsonRpcRequest, JsonRpcResponse, RecordResult, RpcError, RpcId, RunParams,
    JSONRPC_VERSION, RUN_METHOD,
};
pub use transport::SandboxTransport;
