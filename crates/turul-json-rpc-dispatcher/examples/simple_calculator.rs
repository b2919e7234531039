//! Simple Calculator JSON-RPC Example
//!
//! Line-delimited JSON-RPC over stdin/stdout. Each input line is one request
//! body; each reply is written on its own line, notifications get none.
//!
//! ```text
//! $ echo '{"jsonrpc":"2.0","method":"add","params":[1,2],"id":1}' \
//!     | cargo run --example simple_calculator
//! {"jsonrpc":"2.0","id":1,"result":3.0}
//! ```

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use turul_json_rpc_dispatcher::prelude::*;

/// Add two numbers
#[rpc_method]
fn add(a: f64, b: f64) -> f64 {
    a + b
}

/// Subtract `b` from `a`
#[rpc_method]
fn subtract(a: f64, b: f64) -> f64 {
    a - b
}

/// Divide `a` by `b`
#[rpc_method]
async fn divide(a: f64, b: f64) -> Result<f64, HandlerError> {
    if b == 0.0 {
        return Err(ApplicationError::new(1001, "Division by zero")
            .map_err(HandlerError::internal)?
            .with_data(serde_json::json!({"dividend": a}))
            .into());
    }
    Ok(a / b)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only responses
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut registry = MethodRegistry::new();
    registry.add(add())?;
    registry.add(subtract())?;
    registry.add(divide())?;
    registry.add(
        MethodBuilder::new("sum")
            .description("Sum any number of values")
            .rest("values")
            .blocking_handler(|args, _| Ok(args.rest_as::<Vec<f64>>()?.iter().sum::<f64>()))
            .build()?,
    )?;

    let dispatcher = JsonRpcDispatcher::with_config(
        registry,
        DispatcherConfig::new().log_payloads(false),
    );
    info!(
        "Calculator ready with methods: {}",
        dispatcher.registry().trait_names().join(", ")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = dispatcher.handle_request(line.as_str()).await;
        if !reply.is_empty() {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
