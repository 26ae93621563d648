//! hookgate-types: shared data model for the hook engine.
//!
//! A hook run is one short-lived process: the agent feeds a JSON event on
//! stdin, callbacks produce a decision, and the adapter serializes it back.
//! These types are the uniform shapes every agent family is normalized into.

use serde::{Deserialize, Serialize};

// ──────────────────── Decisions ────────────────────

/// The closed set of decisions a callback can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Let the tool action proceed (optionally with advisory context).
    Allow,
    /// Block the tool action with a reason.
    Deny,
    /// Defer to the human operator.
    Ask,
    /// No opinion; produces no output at all when every callback skips.
    Skip,
}

impl Decision {
    /// Stable string form used in the execution log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::Ask => "ask",
            Decision::Skip => "skip",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Decision> {
        match s.to_lowercase().as_str() {
            "allow" => Some(Decision::Allow),
            "deny" => Some(Decision::Deny),
            "ask" => Some(Decision::Ask),
            "skip" => Some(Decision::Skip),
            _ => None,
        }
    }
}

/// Decision produced by a callback, to be serialized by a protocol adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookDecision {
    pub decision: Decision,
    /// Message surfaced to the agent's model (reason or advisory context).
    #[serde(default)]
    pub message: String,
    /// Message for the human operator only; never enters the agent envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_note: Option<String>,
    /// Replacement for the tool's input. Only meaningful on pre-action events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_input: Option<serde_json::Value>,
    /// Explicit process exit code, overriding the adapter's inferred one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl HookDecision {
    pub fn allow(message: impl Into<String>) -> Self {
        Self {
            decision: Decision::Allow,
            message: message.into(),
            operator_note: None,
            updated_input: None,
            exit_code: None,
        }
    }

    /// Allow with no advisory message attached.
    pub fn allow_silent() -> Self {
        Self::allow("")
    }

    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            decision: Decision::Deny,
            message: message.into(),
            operator_note: None,
            updated_input: None,
            exit_code: None,
        }
    }

    pub fn ask(message: impl Into<String>) -> Self {
        Self {
            decision: Decision::Ask,
            message: message.into(),
            operator_note: None,
            updated_input: None,
            exit_code: None,
        }
    }

    pub fn skip() -> Self {
        Self {
            decision: Decision::Skip,
            message: String::new(),
            operator_note: None,
            updated_input: None,
            exit_code: None,
        }
    }

    pub fn with_operator_note(mut self, note: impl Into<String>) -> Self {
        self.operator_note = Some(note.into());
        self
    }

    pub fn with_updated_input(mut self, input: serde_json::Value) -> Self {
        self.updated_input = Some(input);
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }
}

// ──────────────────── Events ────────────────────

/// Event subtype families shared across agent protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Fires before a tool action runs; the only subtype that may rewrite input.
    PreAction,
    /// Fires after a tool action completed.
    PostAction,
    /// Session is stopping.
    Stop,
    /// The user submitted a prompt.
    PromptSubmit,
    /// A tracked task was marked complete.
    TaskComplete,
}

impl EventKind {
    /// Parse the event segment of a routing token (case-insensitive).
    pub fn from_token(s: &str) -> Option<EventKind> {
        match s.to_lowercase().as_str() {
            "pretooluse" | "pre-tool-use" | "pre_tool_use" => Some(EventKind::PreAction),
            "posttooluse" | "post-tool-use" | "post_tool_use" => Some(EventKind::PostAction),
            "stop" => Some(EventKind::Stop),
            "userpromptsubmit" | "user-prompt-submit" | "user_prompt_submit" => {
                Some(EventKind::PromptSubmit)
            }
            "taskcomplete" | "task-complete" | "task_complete" => Some(EventKind::TaskComplete),
            _ => None,
        }
    }

    /// Canonical token segment, as printed in route listings.
    pub fn token_name(&self) -> &'static str {
        match self {
            EventKind::PreAction => "PreToolUse",
            EventKind::PostAction => "PostToolUse",
            EventKind::Stop => "Stop",
            EventKind::PromptSubmit => "UserPromptSubmit",
            EventKind::TaskComplete => "TaskComplete",
        }
    }
}

/// Inferred file operation for file-touching tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    Read,
    Write,
    Edit,
}

impl FileOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileOperation::Read => "read",
            FileOperation::Write => "write",
            FileOperation::Edit => "edit",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<FileOperation> {
        match s.to_lowercase().as_str() {
            "read" => Some(FileOperation::Read),
            "write" => Some(FileOperation::Write),
            "edit" => Some(FileOperation::Edit),
            _ => None,
        }
    }

    /// Infer the operation from a tool name, for the tools that touch files.
    pub fn infer(tool_name: &str) -> Option<FileOperation> {
        match tool_name {
            "Read" => Some(FileOperation::Read),
            "Write" => Some(FileOperation::Write),
            "Edit" | "MultiEdit" | "NotebookEdit" => Some(FileOperation::Edit),
            _ => None,
        }
    }
}

/// A parsed hook event, uniform across agent families.
///
/// Invariant: `session_id` and `cwd` are always present; `file_path` and
/// `operation` are set iff the acting tool touches a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookEvent {
    /// Agent family identifier (e.g. "claude", "droid").
    pub agent: String,
    pub kind: EventKind,
    /// Acting tool name; empty for session-boundary events.
    #[serde(default)]
    pub tool_name: String,
    /// Opaque tool input payload as the agent sent it.
    #[serde(default)]
    pub tool_input: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<FileOperation>,
    pub cwd: String,
    pub session_id: String,
    /// The agent's chosen LLM backend, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Free-form tool configuration passed through by the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<serde_json::Value>,
    /// Raw prompt text, populated on prompt-submit events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

// ──────────────────── Execution log ────────────────────

/// Current on-disk metadata of a file, captured for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Modification time, unix millis.
    pub mtime_ms: i64,
    /// Hex SHA-256 of the file contents.
    pub checksum: String,
}

/// One immutable row of the execution log, appended at the end of a hook run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub session_id: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<FileOperation>,
    pub decision: Decision,
    /// Rule patterns that matched; comma-joined at rest, may be empty.
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_mtime_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_checksum: Option<String>,
    /// Unix millis at logging time.
    pub created_at: i64,
}

impl ExecutionLogEntry {
    /// Attach file metadata to the entry.
    pub fn with_metadata(mut self, meta: &FileMetadata) -> Self {
        self.file_mtime_ms = Some(meta.mtime_ms);
        self.file_checksum = Some(meta.checksum.clone());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_string_roundtrip() {
        for d in [Decision::Allow, Decision::Deny, Decision::Ask, Decision::Skip] {
            assert_eq!(Decision::from_str_loose(d.as_str()), Some(d));
        }
        assert_eq!(Decision::from_str_loose("DENY"), Some(Decision::Deny));
        assert_eq!(Decision::from_str_loose("bogus"), None);
    }

    #[test]
    fn test_event_kind_from_token() {
        assert_eq!(EventKind::from_token("PreToolUse"), Some(EventKind::PreAction));
        assert_eq!(EventKind::from_token("pre-tool-use"), Some(EventKind::PreAction));
        assert_eq!(EventKind::from_token("POSTTOOLUSE"), Some(EventKind::PostAction));
        assert_eq!(EventKind::from_token("stop"), Some(EventKind::Stop));
        assert_eq!(
            EventKind::from_token("UserPromptSubmit"),
            Some(EventKind::PromptSubmit)
        );
        assert_eq!(EventKind::from_token("task_complete"), Some(EventKind::TaskComplete));
        assert_eq!(EventKind::from_token(""), None);
        assert_eq!(EventKind::from_token("compact"), None);
    }

    #[test]
    fn test_infer_operation() {
        assert_eq!(FileOperation::infer("Read"), Some(FileOperation::Read));
        assert_eq!(FileOperation::infer("Write"), Some(FileOperation::Write));
        assert_eq!(FileOperation::infer("MultiEdit"), Some(FileOperation::Edit));
        assert_eq!(FileOperation::infer("Bash"), None);
    }

    #[test]
    fn test_decision_constructors() {
        let d = HookDecision::deny("no").with_exit_code(3);
        assert_eq!(d.decision, Decision::Deny);
        assert_eq!(d.exit_code, Some(3));

        let s = HookDecision::skip();
        assert_eq!(s.decision, Decision::Skip);
        assert!(s.message.is_empty());
    }

    #[test]
    fn test_decision_serde_lowercase() {
        let json = serde_json::to_string(&Decision::Ask).unwrap();
        assert_eq!(json, "\"ask\"");
    }
}
