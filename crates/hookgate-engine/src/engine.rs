//! The execution engine: the template every hook process runs.
//!
//! Pipeline: parse the (fully buffered) input, run every callback in order
//! against the same event, pick the first non-skip decision, serialize it,
//! exit. The whole pipeline sits inside one fail-open boundary: a broken
//! hook must never block the agent's primary workflow.

use std::sync::Arc;

use hookgate_types::{Decision, HookDecision};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::adapters::ProtocolAdapter;
use crate::callback::HookCallback;

/// Outcome of one hook run: at most one output document plus an exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookResponse {
    /// Document to write to stdout. `None` means write nothing at all —
    /// the transparent pass-through every agent must support.
    pub body: Option<String>,
    pub exit_code: i32,
}

impl HookResponse {
    /// The all-skip outcome: no output, success.
    pub fn silent() -> Self {
        Self {
            body: None,
            exit_code: 0,
        }
    }
}

/// Run the full pipeline for one already-read input document.
///
/// Every callback runs even after a non-skip decision has been found:
/// callbacks may carry independent side effects (logging) that must always
/// occur. The first non-skip decision in invocation order is serialized; if
/// every callback skips, nothing is written.
///
/// Any error in parsing, a callback, or formatting degrades to a synthetic
/// `allow` carrying a `Hook error:` message, written out with exit 0.
pub async fn run(
    adapter: &dyn ProtocolAdapter,
    callbacks: &[Arc<dyn HookCallback>],
    raw_input: &str,
) -> HookResponse {
    match run_pipeline(adapter, callbacks, raw_input).await {
        Ok(response) => response,
        Err(err) => fail_open(adapter, &err),
    }
}

async fn run_pipeline(
    adapter: &dyn ProtocolAdapter,
    callbacks: &[Arc<dyn HookCallback>],
    raw_input: &str,
) -> anyhow::Result<HookResponse> {
    let event = adapter.parse(raw_input)?;

    let mut selected: Option<HookDecision> = None;
    for callback in callbacks {
        let decision = callback.evaluate(&event).await?;
        tracing::debug!(
            callback = callback.name(),
            decision = decision.decision.as_str(),
            "callback evaluated"
        );
        if selected.is_none() && decision.decision != Decision::Skip {
            selected = Some(decision);
        }
    }

    let decision = match selected {
        // Transparent pass-through: not even an empty envelope
        None => return Ok(HookResponse::silent()),
        Some(decision) => decision,
    };

    let formatted = adapter.format(&decision);
    let exit_code = decision.exit_code.unwrap_or(formatted.exit_code);
    Ok(HookResponse {
        body: Some(formatted.body),
        exit_code,
    })
}

/// Convert any pipeline error into a visible, non-blocking outcome.
fn fail_open(adapter: &dyn ProtocolAdapter, err: &anyhow::Error) -> HookResponse {
    tracing::warn!(error = %err, "hook pipeline failed, degrading to allow");
    let warning = HookDecision::allow(format!("Hook error: {err}"));
    let formatted = adapter.format(&warning);
    HookResponse {
        body: Some(formatted.body),
        exit_code: 0,
    }
}

/// Read all of stdin, run the pipeline, write the body (if any) to stdout.
///
/// The input is one bounded JSON document, fully consumed before any
/// parsing begins. Returns the process exit code.
pub async fn run_stdio(
    adapter: &dyn ProtocolAdapter,
    callbacks: &[Arc<dyn HookCallback>],
) -> i32 {
    let mut raw = String::new();
    if let Err(err) = tokio::io::stdin().read_to_string(&mut raw).await {
        let response = fail_open(adapter, &anyhow::Error::new(err));
        write_response(&response).await;
        return response.exit_code;
    }

    let response = run(adapter, callbacks, &raw).await;
    write_response(&response).await;
    response.exit_code
}

async fn write_response(response: &HookResponse) {
    if let Some(body) = &response.body {
        let mut stdout = tokio::io::stdout();
        // A failed write leaves the agent treating the run as a skip
        let _ = stdout.write_all(body.as_bytes()).await;
        let _ = stdout.write_all(b"\n").await;
        let _ = stdout.flush().await;
    }
}
