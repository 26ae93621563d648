//! Decision-producing callback trait.

use async_trait::async_trait;

use hookgate_types::{HookDecision, HookEvent};

/// A decision-producing callback run by the execution engine.
///
/// Callbacks for the same route fire in registration order against the same
/// parsed event; the first non-skip decision wins, but every callback still
/// runs so independent side effects (logging, bookkeeping) always occur.
/// Errors propagate to the engine's fail-open boundary.
#[async_trait]
pub trait HookCallback: Send + Sync {
    /// Stable name, used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Evaluate the event and produce a decision. Return
    /// [`HookDecision::skip`] to express "no opinion".
    async fn evaluate(&self, event: &HookEvent) -> anyhow::Result<HookDecision>;
}
