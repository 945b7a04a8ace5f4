//! # Cross-Context Relay Demo
//!
//! Starts the relay process, a main context and its worker, then runs:
//!
//! 1. `addNumbers(1, 2)`
//! 2. `addNumbersSlow(1, 2)` to completion
//! 3. `addNumbersSlow(1, 2)` cancelled after one second
//! 4. `hello("worker")`, which the worker forwards back to the main context
//!
//! Each step logs its outcome and how long it took.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use context_runtime::handlers::methods;
use context_runtime::{ConnectionError, ContextConfig, MainContext};
use relay_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use xc_cancellation::{CancellationToken, CancellationTokenSource};
use xc_relay::{RelayConfig, RelayProcess};

const CANCEL_AFTER: Duration = Duration::from_secs(1);

async fn timeit<F>(label: &str, call: F)
where
    F: Future<Output = Result<Value, ConnectionError>>,
{
    let started = Instant::now();
    let outcome = call.await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match outcome {
        Ok(result) => info!(call = label, %result, elapsed_ms, "Call succeeded"),
        Err(e) => warn!(call = label, error = %e, elapsed_ms, "Call failed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("failed to initialize telemetry")?;

    let relay = RelayProcess::spawn(RelayConfig::from_env()).context("failed to start relay")?;
    let config = ContextConfig::from_env()?;
    let main_context = MainContext::start(&relay, config).context("failed to start contexts")?;

    let none = CancellationToken::none();
    timeit(
        "addNumbers(1, 2)",
        main_context.send_request(methods::ADD_NUMBERS, json!([1, 2]), &none),
    )
    .await;
    timeit(
        "addNumbersSlow(1, 2)",
        main_context.send_request(methods::ADD_NUMBERS_SLOW, json!([1, 2]), &none),
    )
    .await;

    let source = CancellationTokenSource::new();
    let token = source.token();
    tokio::spawn(async move {
        tokio::time::sleep(CANCEL_AFTER).await;
        info!("Cancelling addNumbersSlow");
        source.cancel();
    });
    timeit(
        "addNumbersSlow(1, 2) cancelled",
        main_context.send_request(methods::ADD_NUMBERS_SLOW, json!([1, 2]), &token),
    )
    .await;

    timeit(
        "hello(\"worker\")",
        main_context.send_request(methods::HELLO, json!("worker"), &none),
    )
    .await;

    main_context.shutdown().await?;
    relay.shutdown();

    match encode_metrics() {
        Ok(metrics) => debug!("{metrics}"),
        Err(e) => warn!(error = %e, "Metrics not encoded"),
    }
    Ok(())
}
