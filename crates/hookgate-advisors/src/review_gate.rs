//! Review gate: post-action nudge to re-review a file, debounced and
//! change-detecting so rapid successive edits don't each trigger one.

use std::sync::Arc;

use async_trait::async_trait;

use hookgate_engine::HookCallback;
use hookgate_store::{ExecutionLog, new_entry};
use hookgate_types::{Decision, HookDecision, HookEvent};

/// Post-action callback. Skips when the file was reviewed within the
/// debounce window or is byte-identical to the last reviewed state;
/// otherwise records a review entry (with file metadata) and surfaces a
/// re-review nudge.
pub struct ReviewGate {
    store: Arc<ExecutionLog>,
    debounce_ms: i64,
}

impl ReviewGate {
    pub fn new(store: Arc<ExecutionLog>, debounce_ms: i64) -> Self {
        Self { store, debounce_ms }
    }
}

#[async_trait]
impl HookCallback for ReviewGate {
    fn name(&self) -> &str {
        "review-gate"
    }

    async fn evaluate(&self, event: &HookEvent) -> anyhow::Result<HookDecision> {
        let Some(file_path) = event.file_path.as_deref() else {
            return Ok(HookDecision::skip());
        };

        if self
            .store
            .was_recently_reviewed(&event.session_id, file_path, self.debounce_ms)
            .await?
        {
            tracing::debug!(file = file_path, "inside debounce window, skipping review");
            return Ok(HookDecision::skip());
        }

        if !self
            .store
            .has_file_changed(&event.session_id, file_path, Decision::Allow)
            .await?
        {
            tracing::debug!(file = file_path, "unchanged since last review, skipping");
            return Ok(HookDecision::skip());
        }

        let mut entry = new_entry(
            &event.session_id,
            file_path,
            event.operation,
            Decision::Allow,
            Vec::new(),
        );
        if let Some(meta) = self.store.file_metadata(file_path).await {
            entry = entry.with_metadata(&meta);
        }
        self.store.log_execution(&entry).await?;

        Ok(
            HookDecision::allow(format!("{file_path} changed; review the latest edit"))
                .with_operator_note(format!(
                    "review logged for session {}",
                    event.session_id
                )),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookgate_types::{EventKind, FileOperation};

    fn event(session: &str, file: &str) -> HookEvent {
        HookEvent {
            agent: "claude".to_string(),
            kind: EventKind::PostAction,
            tool_name: "Edit".to_string(),
            tool_input: serde_json::json!({}),
            file_path: Some(file.to_string()),
            operation: Some(FileOperation::Edit),
            cwd: "/p".to_string(),
            session_id: session.to_string(),
            model: None,
            tool_config: None,
            prompt: None,
        }
    }

    fn temp_file(name: &str, contents: &[u8]) -> String {
        let dir = std::env::temp_dir().join("hookgate-review-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn test_first_edit_triggers_review() {
        let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
        let gate = ReviewGate::new(store, 3000);
        let file = temp_file("first.rs", b"fn main() {}");

        let decision = gate.evaluate(&event("s1", &file)).await.unwrap();
        assert_eq!(decision.decision, Decision::Allow);
        assert!(decision.message.contains("review"));
        assert!(decision.operator_note.is_some());
    }

    #[tokio::test]
    async fn test_rapid_second_edit_debounced() {
        let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
        let gate = ReviewGate::new(store, 60_000);
        let file = temp_file("rapid.rs", b"fn main() {}");
        let ev = event("s1", &file);

        gate.evaluate(&ev).await.unwrap();
        // Change the file; still inside the debounce window
        std::fs::write(&file, b"fn main() { println!(); }").unwrap();
        let second = gate.evaluate(&ev).await.unwrap();
        assert_eq!(second.decision, Decision::Skip);
    }

    #[tokio::test]
    async fn test_unchanged_file_outside_window_skips() {
        let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
        let file = temp_file("stable.rs", b"fn main() {}");

        // Zero debounce so only change detection gates
        let gate = ReviewGate::new(store, 0);
        let ev = event("s1", &file);
        let first = gate.evaluate(&ev).await.unwrap();
        assert_eq!(first.decision, Decision::Allow);

        let second = gate.evaluate(&ev).await.unwrap();
        assert_eq!(second.decision, Decision::Skip);
    }

    #[tokio::test]
    async fn test_no_file_path_skips() {
        let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
        let gate = ReviewGate::new(store, 3000);
        let mut ev = event("s1", "unused");
        ev.file_path = None;
        ev.operation = None;
        let decision = gate.evaluate(&ev).await.unwrap();
        assert_eq!(decision.decision, Decision::Skip);
    }
}
