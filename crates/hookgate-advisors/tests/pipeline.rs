//! End-to-end pipeline tests: routing token → adapter → callbacks → store.

use std::sync::Arc;

use hookgate_advisors::{PatternAdvisory, ReviewGate};
use hookgate_config::AdvisoryRule;
use hookgate_engine::{AgentFamily, HookRegistry, RouteError, dispatch};
use hookgate_store::ExecutionLog;
use hookgate_types::EventKind;
use serde_json::Value;

fn registry_with_advisory(store: Arc<ExecutionLog>) -> HookRegistry {
    let rules = vec![AdvisoryRule {
        suffix: ".ts".to_string(),
        guidance: "Use pattern X".to_string(),
    }];
    let mut registry = HookRegistry::new();
    registry.register_for_agents(
        &AgentFamily::ALL,
        EventKind::PreAction,
        Arc::new(PatternAdvisory::new(store.clone(), rules)),
    );
    registry.register_for_agents(
        &AgentFamily::ALL,
        EventKind::PostAction,
        Arc::new(ReviewGate::new(store, 60_000)),
    );
    registry
}

#[tokio::test]
async fn test_pre_action_advisory_end_to_end() {
    let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
    let registry = registry_with_advisory(store);

    let raw = r#"{"session_id":"s1","cwd":"/p","tool_name":"Write","tool_input":{"file_path":"/p/f.ts"}}"#;
    let response = dispatch(&registry, "Claude.PreToolUse", raw).await.unwrap();
    assert_eq!(response.exit_code, 0);

    let v: Value = serde_json::from_str(response.body.as_deref().unwrap()).unwrap();
    assert_eq!(v["hookSpecificOutput"]["permissionDecision"], "allow");
    assert_eq!(v["hookSpecificOutput"]["additionalContext"], "Use pattern X");
}

#[tokio::test]
async fn test_second_invocation_is_silent() {
    let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
    let registry = registry_with_advisory(store);

    let raw = r#"{"session_id":"s1","cwd":"/p","tool_name":"Write","tool_input":{"file_path":"/p/f.ts"}}"#;
    let first = dispatch(&registry, "Claude.PreToolUse", raw).await.unwrap();
    assert!(first.body.is_some());

    // Same session/file again: the advisory was logged, so every callback
    // skips and nothing at all is written.
    let second = dispatch(&registry, "Claude.PreToolUse", raw).await.unwrap();
    assert_eq!(second.body, None);
    assert_eq!(second.exit_code, 0);
}

#[tokio::test]
async fn test_droid_pre_action_uses_droid_vocabulary() {
    let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
    let registry = registry_with_advisory(store);

    let raw = r#"{"sessionId":"d1","cwd":"/p","toolName":"Write","toolInput":{"file_path":"/p/f.ts"}}"#;
    let response = dispatch(&registry, "Droid.PreToolUse", raw).await.unwrap();
    let v: Value = serde_json::from_str(response.body.as_deref().unwrap()).unwrap();
    assert_eq!(v["decision"], "proceed");
    assert_eq!(v["context"], "Use pattern X");
}

#[tokio::test]
async fn test_malformed_input_fails_open_end_to_end() {
    let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
    let registry = registry_with_advisory(store);

    let response = dispatch(&registry, "Claude.PreToolUse", "not json")
        .await
        .unwrap();
    assert_eq!(response.exit_code, 0);
    assert!(response.body.unwrap().contains("Hook error:"));
}

#[tokio::test]
async fn test_routing_error_is_fail_closed() {
    let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
    let registry = registry_with_advisory(store);

    // No separator: a configuration error, raised before any input is used
    let err = dispatch(&registry, "Foo", "ignored").await.unwrap_err();
    assert!(matches!(err, RouteError::InvalidToken { .. }));
}

#[tokio::test]
async fn test_cross_agent_state_is_shared_per_session() {
    let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
    let registry = registry_with_advisory(store);

    // Claude delivers the advisory first
    let claude = r#"{"session_id":"s1","cwd":"/p","tool_name":"Write","tool_input":{"file_path":"/p/f.ts"}}"#;
    dispatch(&registry, "Claude.PreToolUse", claude).await.unwrap();

    // A Droid process in the same session sees it already happened
    let droid = r#"{"sessionId":"s1","cwd":"/p","toolName":"Write","toolInput":{"file_path":"/p/f.ts"}}"#;
    let response = dispatch(&registry, "Droid.PreToolUse", droid).await.unwrap();
    assert_eq!(response.body, None);
}

#[tokio::test]
async fn test_post_action_review_then_debounce() {
    let dir = std::env::temp_dir().join("hookgate-pipeline-test");
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join("reviewed.ts");
    std::fs::write(&file, b"export const x = 1;").unwrap();
    let file_s = file.to_string_lossy().to_string();

    let store = Arc::new(ExecutionLog::open_in_memory().unwrap());
    let registry = registry_with_advisory(store);

    let raw = format!(
        r#"{{"session_id":"s1","cwd":"/p","tool_name":"Edit","tool_input":{{"file_path":"{file_s}","old_string":"1","new_string":"2"}}}}"#
    );
    let first = dispatch(&registry, "Claude.PostToolUse", &raw).await.unwrap();
    let v: Value = serde_json::from_str(first.body.as_deref().unwrap()).unwrap();
    assert!(
        v["hookSpecificOutput"]["additionalContext"]
            .as_str()
            .unwrap()
            .contains("review")
    );

    // Immediately after: inside the debounce window, silent
    let second = dispatch(&registry, "Claude.PostToolUse", &raw).await.unwrap();
    assert_eq!(second.body, None);
}
