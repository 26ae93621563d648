//! Droid family adapter.
//!
//! Input envelopes are camelCase (`sessionId`, `cwd`, `toolName`,
//! `toolInput`, `permissionMode`). The protocol's decision vocabulary is
//! `proceed` / `halt` / `confirm` — distinct from the uniform one — and has
//! no true no-op, so `skip` on pre-action maps to `proceed` with no message
//! attached.

use serde::Deserialize;
use serde_json::{Value, json};

use hookgate_types::{Decision, EventKind, FileOperation, HookDecision, HookEvent};

use super::{AdapterError, FormattedResponse, ProtocolAdapter, file_path_from_input, model_from_value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DroidEnvelope {
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
    /// Droid autonomy mode ("default", "auto-medium", ...). Passed through
    /// as tool configuration when no explicit toolConfig is present.
    #[serde(default)]
    permission_mode: Option<String>,
}

fn verdict(decision: Decision) -> &'static str {
    match decision {
        Decision::Allow | Decision::Skip => "proceed",
        Decision::Deny => "halt",
        Decision::Ask => "confirm",
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DroidAdapter {
    kind: EventKind,
}

impl DroidAdapter {
    pub fn new(kind: EventKind) -> Self {
        Self { kind }
    }

    fn format_pre_action(&self, decision: &HookDecision) -> FormattedResponse {
        let mut out = json!({ "decision": verdict(decision.decision) });
        match decision.decision {
            // The protocol's no-objection value, with no message attached
            Decision::Skip => return FormattedResponse::ok(out.to_string()),
            Decision::Allow => {
                if !decision.message.is_empty() {
                    out["context"] = json!(decision.message);
                }
            }
            Decision::Deny | Decision::Ask => {
                out["reason"] = json!(decision.message);
            }
        }
        if let Some(updated) = &decision.updated_input {
            out["updatedInput"] = updated.clone();
        }
        if decision.decision == Decision::Deny {
            FormattedResponse::block(out.to_string())
        } else {
            FormattedResponse::ok(out.to_string())
        }
    }

    fn format_post_action(&self, decision: &HookDecision) -> FormattedResponse {
        match decision.decision {
            Decision::Deny => FormattedResponse::block(
                json!({"decision": "halt", "reason": decision.message}).to_string(),
            ),
            Decision::Allow if !decision.message.is_empty() => {
                FormattedResponse::ok(json!({"context": decision.message}).to_string())
            }
            _ => FormattedResponse::ok("{}".to_string()),
        }
    }

    fn format_boundary(&self, decision: &HookDecision) -> FormattedResponse {
        match decision.decision {
            Decision::Deny => FormattedResponse::block(
                json!({"decision": "halt", "reason": decision.message}).to_string(),
            ),
            Decision::Allow if !decision.message.is_empty() => {
                FormattedResponse::ok(json!({"systemMessage": decision.message}).to_string())
            }
            _ => FormattedResponse::ok("{}".to_string()),
        }
    }
}

impl ProtocolAdapter for DroidAdapter {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn parse(&self, raw: &str) -> Result<HookEvent, AdapterError> {
        let envelope: DroidEnvelope = serde_json::from_str(raw)?;
        let tool_name = envelope.tool_name.unwrap_or_default();
        let tool_input = envelope.tool_input.unwrap_or(Value::Null);
        let file_path = file_path_from_input(&tool_name, &tool_input);
        let operation = FileOperation::infer(&tool_name);
        let tool_config = envelope.tool_config.or_else(|| {
            envelope
                .permission_mode
                .map(|mode| json!({ "permissionMode": mode }))
        });
        Ok(HookEvent {
            agent: "droid".to_string(),
            kind: self.kind,
            model: model_from_value(envelope.model.as_ref()),
            tool_name,
            tool_input,
            file_path,
            operation,
            cwd: envelope.cwd,
            session_id: envelope.session_id,
            tool_config,
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
