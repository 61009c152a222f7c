//! sandboxrpc CLI: run Lua filters against log records on a remote sandbox.
//!
//! Usage:
//! ```bash
//! # Run a filter over NDJSON records (stdin by default)
//! sandboxrpc run --url http://localhost:5555/jsonrpc --filter filter.lua --records logs.ndjson
//!
//! # Check that the sandbox answers
//! sandboxrpc check --url http://localhost:5555/jsonrpc
//! ```
//!
//! Output records go to stdout as NDJSON. Per-record failures go to stderr
//! and make the process exit with code 2; fatal errors exit with code 1.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use sandboxrpc_core::SandboxClient;
use sandboxrpc_http::HttpClientConfig;

mod input;
mod logging;

use logging::LogConfig;

/// Filter that keeps every record; used by `check`.
const NOOP_FILTER: &str = "function cb_filter(tag, ts, record) return 0, ts, record end";

#[derive(Parser)]
#[command(
    name = "sandboxrpc",
    about = "Run Lua filters against log records on a remote sandbox",
    version
)]
struct Cli {
    /// Global log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SANDBOXRPC_LOG", default_value = "warn")]
    log_level: String,

    /// Per-crate log level override, e.g. `sandboxrpc_core=debug`. Repeatable.
    #[arg(long = "log-component", global = true, value_parser = logging::parse_component)]
    log_components: Vec<(String, String)>,

    /// Emit JSON structured logs
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a filter over NDJSON records and print the output records
    Run {
        #[command(flatten)]
        endpoint: Endpoint,
        /// Path to the Lua filter
        #[arg(short, long)]
        filter: PathBuf,
        /// NDJSON records file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        records: String,
    },
    /// Send an empty batch to check that the sandbox is reachable
    Check {
        #[command(flatten)]
        endpoint: Endpoint,
    },
}

#[derive(Args)]
struct Endpoint {
    /// Sandbox JSON-RPC endpoint URL
    #[arg(long, env = "SANDBOXRPC_URL")]
    url: String,
    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,
}

impl Endpoint {
    fn client(&self) -> Result<SandboxClient> {
        let config = HttpClientConfig {
            request_timeout: Duration::from_millis(self.timeout_ms),
            ..HttpClientConfig::default()
        };
        sandboxrpc_http::client_with_config(&self.url, config)
            .with_context(|| format!("creating client for {}", self.url))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init_tracing(&LogConfig {
        level: cli.log_level.clone(),
        components: cli.log_components.iter().cloned().collect(),
        json: cli.json_logs,
    });

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = match cli.command {
        Commands::Run {
            endpoint,
            filter,
            records,
        } => cmd_run(&endpoint, &filter, &records, &cancel).await,
        Commands::Check { endpoint } => cmd_check(&endpoint, &cancel).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn cmd_run(
    endpoint: &Endpoint,
    filter: &Path,
    source: &str,
    cancel: &CancellationToken,
) -> Result<ExitCode> {
    let code = std::fs::read_to_string(filter)
        .with_context(|| format!("reading filter {}", filter.display()))?;

    let records = if source == "-" {
        input::read_records(io::stdin().lock())
    } else {
        let file = File::open(source).with_context(|| format!("opening {source}"))?;
        input::read_records(BufReader::new(file))
    }?;

    let client = endpoint.client()?;
    let output = client.run_with_cancel(&records, &code, cancel).await?;

    let mut stdout = io::stdout().lock();
    for record in &output.records {
        serde_json::to_writer(&mut stdout, record)?;
        writeln!(stdout)?;
    }
    stdout.flush()?;

    match output.errors {
        Some(errors) => {
            eprintln!("{errors}");
            Ok(ExitCode::from(2))
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

async fn cmd_check(endpoint: &Endpoint, cancel: &CancellationToken) -> Result<ExitCode> {
    let client = endpoint.client()?;
    println!("Checking {}...", client.url());

    let start = Instant::now();
    client.run_with_cancel(&[], NOOP_FILTER, cancel).await?;

    println!("  Status:  OK");
    println!("  Latency: {}ms", start.elapsed().as_millis());
    Ok(ExitCode::SUCCESS)
}
