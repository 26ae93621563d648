//! Pattern advisory: surface design guidance the first time a file matching
//! a rule is touched in a session.

use std::sync::Arc;

use async_trait::async_trait;

use hookgate_config::AdvisoryRule;
use hookgate_engine::HookCallback;
use hookgate_store::{ExecutionLog, new_entry};
use hookgate_types::{Decision, HookDecision, HookEvent};

/// Pre-action callback: matches configured advisory rules against the
/// event's file path and delivers each matching guidance once per
/// session/file/pattern-set. Repeat firings skip via the execution log.
pub struct PatternAdvisory {
    store: Arc<ExecutionLog>,
    rules: Vec<AdvisoryRule>,
}

impl PatternAdvisory {
    pub fn new(store: Arc<ExecutionLog>, rules: Vec<AdvisoryRule>) -> Self {
        Self { store, rules }
    }

    fn matching_rules(&self, file_path: &str) -> Vec<&AdvisoryRule> {
        self.rules
            .iter()
            .filter(|rule| file_path.ends_with(&rule.suffix))
            .collect()
    }
}

#[async_trait]
impl HookCallback for PatternAdvisory {
    fn name(&self) -> &str {
        "pattern-advisory"
    }

    async fn evaluate(&self, event: &HookEvent) -> anyhow::Result<HookDecision> {
        let Some(file_path) = event.file_path.as_deref() else {
            return Ok(HookDecision::skip());
        };

        let matched = self.matching_rules(file_path);
        if matched.is_empty() {
            return Ok(HookDecision::skip());
        }
        let patterns: Vec<String> = matched.iter().map(|r| r.suffix.clone()).collect();

        // Same advisory already delivered this session?
        if self
            .store
            .has_executed(&event.session_id, file_path, Decision::Allow, &patterns)
            .await?
        {
            tracing::debug!(file = file_path, "advisory already delivered, skipping");
            return Ok(HookDecision::skip());
        }

        let guidance = matched
            .iter()
            .map(|r| r.guidance.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        self.store
            .log_execution(&new_entry(
                &event.session_id,
                file_path,
                event.operation,
                Decision::Allow,
                patterns,
            ))
            .await?;

        Ok(HookDecision::allow(guidance))
    }
}
