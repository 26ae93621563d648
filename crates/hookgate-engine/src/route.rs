//! Dispatch/routing: resolve an `AgentName.EventName` token to an adapter
//! and a registered callback list, then delegate to the engine.
//!
//! This is the one fail-closed layer: a bad token or an unregistered route
//! is a configuration error discovered before any event is parsed, and the
//! safest response is to refuse to start so the integrator notices.

use std::collections::HashMap;
use std::sync::Arc;

use hookgate_types::EventKind;

use crate::adapters::{AgentFamily, adapter_for};
use crate::callback::HookCallback;
use crate::engine::{self, HookResponse};

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid routing token '{token}': expected the form AgentName.EventName")]
    InvalidToken { token: String },
    #[error("unknown agent '{agent}'; supported agents: {supported}")]
    UnknownAgent { agent: String, supported: String },
    #[error("unknown event '{event}' for agent '{agent}'")]
    UnknownEvent { agent: String, event: String },
    #[error("no callback registered for route '{token}'; registered routes: {registered}")]
    NoCallbacks { token: String, registered: String },
}

/// A resolved routing token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub agent: AgentFamily,
    pub kind: EventKind,
}

impl Route {
    pub fn token(&self) -> String {
        format!("{}.{}", self.agent.token_name(), self.kind.token_name())
    }
}

/// Parse a routing token: exactly two non-empty components split on `.`,
/// agent segment case-insensitive.
pub fn parse_route(token: &str) -> Result<Route, RouteError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [agent_s, event_s] = parts.as_slice() else {
        return Err(RouteError::InvalidToken {
            token: token.to_string(),
        });
    };
    if agent_s.is_empty() || event_s.is_empty() {
        return Err(RouteError::InvalidToken {
            token: token.to_string(),
        });
    }

    let agent = AgentFamily::from_token(agent_s).ok_or_else(|| RouteError::UnknownAgent {
        agent: agent_s.to_string(),
        supported: AgentFamily::ALL
            .iter()
            .map(|a| a.token_name())
            .collect::<Vec<_>>()
            .join(", "),
    })?;
    let kind = EventKind::from_token(event_s).ok_or_else(|| RouteError::UnknownEvent {
        agent: agent.token_name().to_string(),
        event: event_s.to_string(),
    })?;
    Ok(Route { agent, kind })
}

/// Registry of decision callbacks, keyed by route.
#[derive(Default)]
pub struct HookRegistry {
    callbacks: HashMap<Route, Vec<Arc<dyn HookCallback>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for a route. Callbacks fire in registration order.
    pub fn register(&mut self, agent: AgentFamily, kind: EventKind, callback: Arc<dyn HookCallback>) {
        self.callbacks
            .entry(Route { agent, kind })
            .or_default()
            .push(callback);
    }

    /// Register the same callback under several agents at once.
    pub fn register_for_agents(
        &mut self,
        agents: &[AgentFamily],
        kind: EventKind,
        callback: Arc<dyn HookCallback>,
    ) {
        for agent in agents {
            self.register(*agent, kind, callback.clone());
        }
    }

    pub fn callbacks_for(&self, route: &Route) -> Option<&[Arc<dyn HookCallback>]> {
        self.callbacks
            .get(route)
            .map(Vec::as_slice)
            .filter(|list| !list.is_empty())
    }

    /// Registered routing tokens, sorted, for diagnostics.
    pub fn routes(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.callbacks.keys().map(Route::token).collect();
        tokens.sort();
        tokens
    }
}

/// Resolve a routing token and run the engine over one input document.
///
/// Route resolution happens entirely before the input is looked at, so a
/// misconfigured integration fails without consuming the event.
pub async fn dispatch(
    registry: &HookRegistry,
    token: &str,
    raw_input: &str,
) -> Result<HookResponse, RouteError> {
    let route = parse_route(token)?;
    let callbacks = registry
        .callbacks_for(&route)
        .ok_or_else(|| RouteError::NoCallbacks {
            token: route.token(),
            registered: registry.routes().join(", "),
        })?;
    let adapter = adapter_for(route.agent, route.kind);
    Ok(engine::run(adapter.as_ref(), callbacks, raw_input).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hookgate_types::{HookDecision, HookEvent};

    struct AlwaysAllow;

    #[async_trait]
    impl HookCallback for AlwaysAllow {
        fn name(&self) -> &str {
            "always-allow"
        }

        async fn evaluate(&self, _event: &HookEvent) -> anyhow::Result<HookDecision> {
            Ok(HookDecision::allow("go ahead"))
        }
    }

    #[test]
    fn test_parse_route_valid() {
        let route = parse_route("Claude.PreToolUse").unwrap();
        assert_eq!(route.agent, AgentFamily::Claude);
        assert_eq!(route.kind, EventKind::PreAction);

        // Agent segment is case-insensitive
        let route = parse_route("droid.TaskComplete").unwrap();
        assert_eq!(route.agent, AgentFamily::Droid);
        assert_eq!(route.kind, EventKind::TaskComplete);
    }

    #[test]
    fn test_parse_route_no_separator() {
        let err = parse_route("Foo").unwrap_err();
        assert!(matches!(err, RouteError::InvalidToken { .. }));
    }

    #[test]
    fn test_parse_route_empty_segments() {
        assert!(matches!(
            parse_route("Claude."),
            Err(RouteError::InvalidToken { .. })
        ));
        assert!(matches!(
            parse_route(".Stop"),
            Err(RouteError::InvalidToken { .. })
        ));
        assert!(matches!(
            parse_route("A.B.C"),
            Err(RouteError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_parse_route_unknown_agent_names_supported() {
        let err = parse_route("Cursor.PreToolUse").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Claude"));
        assert!(msg.contains("Droid"));
    }

    #[test]
    fn test_parse_route_unknown_event() {
        let err = parse_route("Claude.Compact").unwrap_err();
        assert!(matches!(err, RouteError::UnknownEvent { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_unregistered_route_lists_registered() {
        let mut registry = HookRegistry::new();
        registry.register(
            AgentFamily::Claude,
            EventKind::PreAction,
            Arc::new(AlwaysAllow),
        );

        let err = dispatch(&registry, "Claude.Stop", "{}").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Claude.Stop"));
        assert!(msg.contains("Claude.PreToolUse"));
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_engine() {
        let mut registry = HookRegistry::new();
        registry.register(
            AgentFamily::Claude,
            EventKind::PreAction,
            Arc::new(AlwaysAllow),
        );

        let raw = r#"{"session_id":"s1","cwd":"/p","tool_name":"Write","tool_input":{"file_path":"/p/f.ts"}}"#;
        let response = dispatch(&registry, "claude.PreToolUse", raw).await.unwrap();
        assert_eq!(response.exit_code, 0);
        assert!(response.body.unwrap().contains("go ahead"));
    }

    #[test]
    fn test_registry_routes_sorted() {
        let mut registry = HookRegistry::new();
        registry.register(AgentFamily::Droid, EventKind::Stop, Arc::new(AlwaysAllow));
        registry.register(
            AgentFamily::Claude,
            EventKind::PreAction,
            Arc::new(AlwaysAllow),
        );
        assert_eq!(registry.routes(), vec!["Claude.PreToolUse", "Droid.Stop"]);
    }

    #[test]
    fn test_register_for_agents() {
        let mut registry = HookRegistry::new();
        registry.register_for_agents(
            &AgentFamily::ALL,
            EventKind::PreAction,
            Arc::new(AlwaysAllow),
        );
        assert_eq!(registry.routes().len(), 2);
    }
}
