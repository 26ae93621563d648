//! Protocol adapters: one per agent family.
//!
//! An adapter translates between the uniform `HookEvent`/`HookDecision`
//! pair and one agent family's wire shapes. The event subtype is fixed at
//! construction (it comes from the routing token), so `format` dispatches
//! over an immutable tag and adapter instances are safely reusable.

mod claude;
mod droid;

pub use claude::ClaudeAdapter;
pub use droid::DroidAdapter;

use hookgate_types::{EventKind, HookDecision, HookEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Structurally invalid payload. Never patched over with defaults:
    /// guessing the context would route callbacks in the wrong semantic
    /// space. Propagates to the engine's fail-open boundary.
    #[error("invalid hook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Serialized response plus the exit status the protocol expects for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedResponse {
    pub body: String,
    pub exit_code: i32,
}

impl FormattedResponse {
    pub fn ok(body: String) -> Self {
        Self { body, exit_code: 0 }
    }

    pub fn block(body: String) -> Self {
        Self { body, exit_code: 2 }
    }
}

/// Parse one agent family's input envelope and serialize decisions back.
pub trait ProtocolAdapter: Send + Sync {
    /// The event subtype this adapter instance serves.
    fn kind(&self) -> EventKind;

    /// Parse the raw input document into a uniform event.
    fn parse(&self, raw: &str) -> Result<HookEvent, AdapterError>;

    /// Serialize a decision into this family's envelope for the subtype
    /// captured at construction. Infallible: every decision has a valid
    /// serialization, including `skip` (the protocol's no-op envelope).
    fn format(&self, decision: &HookDecision) -> FormattedResponse;
}

/// Supported agent families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentFamily {
    Claude,
    Droid,
}

impl AgentFamily {
    pub const ALL: [AgentFamily; 2] = [AgentFamily::Claude, AgentFamily::Droid];

    /// Parse the agent segment of a routing token (case-insensitive).
    pub fn from_token(s: &str) -> Option<AgentFamily> {
        match s.to_lowercase().as_str() {
            "claude" => Some(AgentFamily::Claude),
            "droid" => Some(AgentFamily::Droid),
            _ => None,
        }
    }

    pub fn token_name(&self) -> &'static str {
        match self {
            AgentFamily::Claude => "Claude",
            AgentFamily::Droid => "Droid",
        }
    }
}

/// Build the adapter for an agent family and event subtype.
pub fn adapter_for(agent: AgentFamily, kind: EventKind) -> Box<dyn ProtocolAdapter> {
    match agent {
        AgentFamily::Claude => Box::new(ClaudeAdapter::new(kind)),
        AgentFamily::Droid => Box::new(DroidAdapter::new(kind)),
    }
}

/// Extract the target file path from a tool input payload, for the tools
/// that touch files.
pub(crate) fn file_path_from_input(
    tool_name: &str,
    tool_input: &serde_json::Value,
) -> Option<String> {
    hookgate_types::FileOperation::infer(tool_name)?;
    let key = if tool_name == "NotebookEdit" {
        "notebook_path"
    } else {
        "file_path"
    };
    tool_input.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Best-effort model identifier from an agent payload: either a plain
/// string or an object carrying an `id` field.
pub(crate) fn model_from_value(value: Option<&serde_json::Value>) -> Option<String> {
    let value = value?;
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    value.get("id").and_then(|v| v.as_str()).map(str::to_string)
}
