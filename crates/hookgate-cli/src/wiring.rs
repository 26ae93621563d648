//! Route registration and command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hookgate_advisors::{PatternAdvisory, ReviewGate};
use hookgate_config::HookgateConfig;
use hookgate_engine::{AgentFamily, HookRegistry, adapter_for, parse_route};
use hookgate_store::ExecutionLog;
use hookgate_types::EventKind;

fn load_config(path: Option<&Path>) -> anyhow::Result<HookgateConfig> {
    Ok(match path {
        Some(path) => hookgate_config::load_config_from(path)?,
        None => hookgate_config::load_config()?,
    })
}

fn open_store(config: &HookgateConfig, db: Option<PathBuf>) -> anyhow::Result<Arc<ExecutionLog>> {
    let db_path = db.unwrap_or_else(|| config.db_path.clone());
    Ok(Arc::new(ExecutionLog::open(&db_path)?))
}

/// The default callback wiring: pattern advisories before tool actions,
/// the review gate after them. Session-boundary routes stay unwired here;
/// invoking them surfaces the fail-closed "no callback registered" error.
fn build_registry(store: Arc<ExecutionLog>, config: &HookgateConfig) -> HookRegistry {
    let mut registry = HookRegistry::new();
    registry.register_for_agents(
        &AgentFamily::ALL,
        EventKind::PreAction,
        Arc::new(PatternAdvisory::new(store.clone(), config.advisories.clone())),
    );
    registry.register_for_agents(
        &AgentFamily::ALL,
        EventKind::PostAction,
        Arc::new(ReviewGate::new(store, config.review_debounce_ms)),
    );
    registry
}

/// Run one hook invocation; returns the process exit code.
pub async fn run_hook(
    token: &str,
    config_path: Option<&Path>,
    db: Option<PathBuf>,
) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let store = open_store(&config, db)?;
    let registry = build_registry(store, &config);

    // Configuration errors are fail-closed and must surface before any
    // event is consumed from stdin.
    let route = parse_route(token)?;
    let callbacks = registry
        .callbacks_for(&route)
        .ok_or_else(|| hookgate_engine::RouteError::NoCallbacks {
            token: route.token(),
            registered: registry.routes().join(", "),
        })?;

    // Only now does stdin get consumed
    let adapter = adapter_for(route.agent, route.kind);
    Ok(hookgate_engine::run_stdio(adapter.as_ref(), callbacks).await)
}

pub async fn print_routes(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = Arc::new(ExecutionLog::open_in_memory()?);
    let registry = build_registry(store, &config);
    for token in registry.routes() {
        println!("{token}");
    }
    Ok(())
}

pub async fn print_log(
    session: &str,
    file: Option<&str>,
    limit: usize,
    config_path: Option<&Path>,
    db: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config, db)?;

    let entries = match file {
        Some(file) => store
            .last_entry(session, file)
            .await?
            .into_iter()
            .collect(),
        None => store.entries_for_session(session, limit).await?,
    };

    if entries.is_empty() {
        println!("no entries for session {session}");
        return Ok(());
    }
    for entry in entries {
        let when = chrono::DateTime::from_timestamp_millis(entry.created_at)
            .map(|t| t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
            .unwrap_or_else(|| entry.created_at.to_string());
        let op = entry
            .operation
            .map(|o| o.as_str())
            .unwrap_or("-");
        println!(
            "{when}  {decision:<5}  {op:<5}  {file}  [{patterns}]",
            decision = entry.decision.as_str(),
            file = entry.file_path,
            patterns = entry.patterns.join(","),
        );
    }
    Ok(())
}
