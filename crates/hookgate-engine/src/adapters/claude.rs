//! Claude family adapter.
//!
//! Input envelopes are snake_case (`session_id`, `cwd`, `tool_name`,
//! `tool_input`). Output shape varies per event subtype: pre-action
//! responses carry a `permissionDecision`, post-action and session-boundary
//! responses only ever carry a blocking signal on deny.

use serde::Deserialize;
use serde_json::{Value, json};

use hookgate_types::{Decision, EventKind, FileOperation, HookDecision, HookEvent};

use super::{AdapterError, FormattedResponse, ProtocolAdapter, file_path_from_input, model_from_value};

#[derive(Debug, Deserialize)]
struct ClaudeEnvelope {
    session_id: String,
    cwd: String,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    tool_input: Option<Value>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    model: Option<Value>,
    #[serde(default)]
    tool_config: Option<Value>,
}

#[derive(Debug, Clone, Copy)]
pub struct ClaudeAdapter {
    kind: EventKind,
}

impl ClaudeAdapter {
    pub fn new(kind: EventKind) -> Self {
        Self { kind }
    }

    fn format_pre_action(&self, decision: &HookDecision) -> FormattedResponse {
        let mut out = json!({
            "hookEventName": "PreToolUse",
        });
        match decision.decision {
            Decision::Skip => return FormattedResponse::ok("{}".to_string()),
            Decision::Allow => {
                out["permissionDecision"] = json!("allow");
                if !decision.message.is_empty() {
                    // Advisory context, not a blocking reason
                    out["additionalContext"] = json!(decision.message);
                }
            }
            Decision::Deny => {
                out["permissionDecision"] = json!("deny");
                out["permissionDecisionReason"] = json!(decision.message);
            }
            Decision::Ask => {
                out["permissionDecision"] = json!("ask");
                out["permissionDecisionReason"] = json!(decision.message);
            }
        }
        if let Some(updated) = &decision.updated_input {
            out["updatedInput"] = updated.clone();
        }
        let body = json!({ "hookSpecificOutput": out }).to_string();
        if decision.decision == Decision::Deny {
            FormattedResponse::block(body)
        } else {
            FormattedResponse::ok(body)
        }
    }

    fn format_post_action(&self, decision: &HookDecision) -> FormattedResponse {
        match decision.decision {
            Decision::Deny => FormattedResponse::block(
                json!({"decision": "block", "reason": decision.message}).to_string(),
            ),
            Decision::Allow if !decision.message.is_empty() => FormattedResponse::ok(
                json!({
                    "hookSpecificOutput": {
                        "hookEventName": "PostToolUse",
                        "additionalContext": decision.message,
                    }
                })
                .to_string(),
            ),
            _ => FormattedResponse::ok("{}".to_string()),
        }
    }

    fn format_boundary(&self, decision: &HookDecision) -> FormattedResponse {
        match decision.decision {
            Decision::Deny => FormattedResponse::block(
                json!({"decision": "block", "reason": decision.message}).to_string(),
            ),
            // Keeps fail-open warnings visible without blocking
            Decision::Allow if !decision.message.is_empty() => {
                FormattedResponse::ok(json!({"systemMessage": decision.message}).to_string())
            }
            _ => FormattedResponse::ok("{}".to_string()),
        }
    }
}

impl ProtocolAdapter for ClaudeAdapter {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn parse(&self, raw: &str) -> Result<HookEvent, AdapterError> {
        let envelope: ClaudeEnvelope = serde_json::from_str(raw)?;
        let tool_name = envelope.tool_name.unwrap_or_default();
        let tool_input = envelope.tool_input.unwrap_or(Value::Null);
        let file_path = file_path_from_input(&tool_name, &tool_input);
        let operation = FileOperation::infer(&tool_name);
        Ok(HookEvent {
            agent: "claude".to_string(),
            kind: self.kind,
            model: model_from_value(envelope.model.as_ref()),
            tool_name,
            tool_input,
            file_path,
            operation,
            cwd: envelope.cwd,
            session_id: envelope.session_id,
            tool_config: envelope.tool_config,
            prompt: envelope.prompt,
        })
    }

    fn format(&self, decision: &HookDecision) -> FormattedResponse {
        match self.kind {
            EventKind::PreAction => self.format_pre_action(decision),
            EventKind::PostAction => self.format_post_action(decision),
            EventKind::Stop | EventKind::PromptSubmit | EventKind::TaskComplete => {
                self.format_boundary(decision)
            }
        }
    }
}
