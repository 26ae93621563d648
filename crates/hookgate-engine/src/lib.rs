//! hookgate-engine: hook normalization and execution.
//!
//! One hook run is one process: the dispatcher resolves a routing token to a
//! protocol adapter and a callback list, the engine reads the event, runs
//! the callbacks, and serializes the winning decision back into the calling
//! agent's envelope. Runtime failures never block the agent (fail-open);
//! configuration failures refuse to start (fail-closed).

pub mod adapters;
pub mod callback;
pub mod engine;
pub mod route;

pub use adapters::{AdapterError, AgentFamily, FormattedResponse, ProtocolAdapter, adapter_for};
pub use callback::HookCallback;
pub use engine::{HookResponse, run, run_stdio};
pub use route::{HookRegistry, Route, RouteError, dispatch, parse_route};
