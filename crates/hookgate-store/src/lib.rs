//! hookgate-store: SQLite-based execution log for hook runs.
//!
//! Gives decision callbacks durable, session-scoped memory across
//! independent short-lived processes. The log is append-only: later reads
//! want the most recent matching entry, but earlier entries stay for audit
//! and debounce purposes. Concurrent processes appending for the same
//! session/file pair are not mutually excluded; a duplicate advisory under
//! a rare race is acceptable, a missed one is not.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use hookgate_types::{Decision, ExecutionLogEntry, FileMetadata, FileOperation};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blocking task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS hook_executions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        file_path TEXT NOT NULL,
        operation TEXT,
        decision TEXT NOT NULL,
        patterns TEXT NOT NULL DEFAULT '',
        file_mtime_ms INTEGER,
        file_checksum TEXT,
        created_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_hook_executions_session_file
        ON hook_executions(session_id, file_path);";

/// Append-only execution log, backed by SQLite.
pub struct ExecutionLog {
    conn: Arc<Mutex<Connection>>,
    /// Process-local memo tier for `has_executed` lookups.
    memo: Arc<std::sync::Mutex<HashMap<String, bool>>>,
}

impl ExecutionLog {
    /// Open (or create) the log database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;

        // WAL tolerates independent writer processes racing on the same db
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        tracing::debug!("Execution log opened: {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            memo: Arc::new(std::sync::Mutex::new(HashMap::new())),
        })
    }

    /// Open an in-memory log (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            memo: Arc::new(std::sync::Mutex::new(HashMap::new())),
        })
    }

    /// Append a new, immutable entry. Prior entries are never touched.
    pub async fn log_execution(&self, entry: &ExecutionLogEntry) -> Result<()> {
        let conn = self.conn.clone();
        let entry = entry.clone();
        let patterns = join_patterns(&entry.patterns);
        let result = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO hook_executions
                    (session_id, file_path, operation, decision, patterns,
                     file_mtime_ms, file_checksum, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    entry.session_id,
                    entry.file_path,
                    entry.operation.map(|o| o.as_str()),
                    entry.decision.as_str(),
                    patterns,
                    entry.file_mtime_ms,
                    entry.file_checksum,
                    entry.created_at,
                ],
            )?;
            Ok(())
        })
        .await?;

        // Memoized lookups may now be stale
        self.clear_cache();
        result
    }

    /// True if an entry already exists for this session/file whose decision
    /// and matched-pattern set equal the given ones.
    pub async fn has_executed(
        &self,
        session_id: &str,
        file_path: &str,
        decision: Decision,
        patterns: &[String],
    ) -> Result<bool> {
        let joined = join_patterns(patterns);
        let key = format!("{session_id}\x1f{file_path}\x1f{}\x1f{joined}", decision.as_str());
        if let Ok(memo) = self.memo.lock() {
            if let Some(&hit) = memo.get(&key) {
                return Ok(hit);
            }
        }

        let conn = self.conn.clone();
        let session_id = session_id.to_string();
        let file_path = file_path.to_string();
        let decision_s = decision.as_str();
        let found: bool = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM hook_executions
                 WHERE session_id = ?1 AND file_path = ?2
                   AND decision = ?3 AND patterns = ?4",
                rusqlite::params![session_id, file_path, decision_s, joined],
                |row| row.get(0),
            )?;
            Ok::<_, StoreError>(count > 0)
        })
        .await??;

        if let Ok(mut memo) = self.memo.lock() {
            memo.insert(key, found);
        }
        Ok(found)
    }

    /// True if the most recent entry for this session/file is strictly
    /// younger than `window_ms`. The exact boundary value is excluded.
    pub async fn was_recently_reviewed(
        &self,
        session_id: &str,
        file_path: &str,
        window_ms: i64,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.conn.clone();
        let session_id = session_id.to_string();
        let file_path = file_path.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let last: Option<i64> = conn
                .query_row(
                    "SELECT created_at FROM hook_executions
                     WHERE session_id = ?1 AND file_path = ?2
                     ORDER BY created_at DESC, id DESC LIMIT 1",
                    rusqlite::params![session_id, file_path],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(match last {
                Some(created_at) => now - created_at < window_ms,
                None => false,
            })
        })
        .await?
    }

    /// Current mtime + SHA-256 of the file. `None` means "unknown" (the file
    /// could not be read) and is never an error.
    pub async fn file_metadata(&self, file_path: &str) -> Option<FileMetadata> {
        let path = PathBuf::from(file_path);
        tokio::task::spawn_blocking(move || read_file_metadata(&path))
            .await
            .ok()
            .flatten()
    }

    /// True if the file differs from the metadata recorded on the most
    /// recent entry for this session/file with `reference_decision`.
    ///
    /// No such entry, an entry recorded without metadata, or unreadable
    /// current metadata all report "changed" — review is the safe default.
    pub async fn has_file_changed(
        &self,
        session_id: &str,
        file_path: &str,
        reference_decision: Decision,
    ) -> Result<bool> {
        let conn = self.conn.clone();
        let session = session_id.to_string();
        let path = file_path.to_string();
        let decision_s = reference_decision.as_str();
        let recorded: Option<(Option<i64>, Option<String>)> =
            tokio::task::spawn_blocking(move || {
                let conn = conn.blocking_lock();
                conn.query_row(
                    "SELECT file_mtime_ms, file_checksum FROM hook_executions
                     WHERE session_id = ?1 AND file_path = ?2 AND decision = ?3
                     ORDER BY created_at DESC, id DESC LIMIT 1",
                    rusqlite::params![session, path, decision_s],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(StoreError::from)
            })
            .await??;

        let (recorded_mtime, recorded_checksum) = match recorded {
            Some((Some(mtime), Some(checksum))) => (mtime, checksum),
            // No reference entry, or one logged without metadata
            _ => return Ok(true),
        };

        match self.file_metadata(file_path).await {
            Some(current) => {
                Ok(current.mtime_ms != recorded_mtime || current.checksum != recorded_checksum)
            }
            None => Ok(true),
        }
    }

    /// Most recent entry for a session/file pair, if any.
    pub async fn last_entry(
        &self,
        session_id: &str,
        file_path: &str,
    ) -> Result<Option<ExecutionLogEntry>> {
        let conn = self.conn.clone();
        let session_id = session_id.to_string();
        let file_path = file_path.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let result = conn
                .query_row(
                    "SELECT session_id, file_path, operation, decision, patterns,
                            file_mtime_ms, file_checksum, created_at
                     FROM hook_executions
                     WHERE session_id = ?1 AND file_path = ?2
                     ORDER BY created_at DESC, id DESC LIMIT 1",
                    rusqlite::params![session_id, file_path],
                    row_to_entry,
                )
                .optional()?;
            Ok(result)
        })
        .await?
    }

    /// Entries for a session, newest first.
    pub async fn entries_for_session(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ExecutionLogEntry>> {
        let conn = self.conn.clone();
        let session_id = session_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT session_id, file_path, operation, decision, patterns,
                        file_mtime_ms, file_checksum, created_at
                 FROM hook_executions
                 WHERE session_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![session_id, limit as i64], row_to_entry)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?
    }

    /// Drop the in-memory memo tier. The durable log is untouched.
    pub fn clear_cache(&self) {
        if let Ok(mut memo) = self.memo.lock() {
            memo.clear();
        }
    }
}

/// Canonical comma-joined form of a pattern set (sorted, so the comparison
/// is set-like rather than order-sensitive).
fn join_patterns(patterns: &[String]) -> String {
    let mut sorted: Vec<&str> = patterns.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(",")
}

fn read_file_metadata(path: &Path) -> Option<FileMetadata> {
    let meta = std::fs::metadata(path).ok()?;
    let mtime_ms = meta
        .modified()
        .ok()?
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?
        .as_millis() as i64;
    let contents = std::fs::read(path).ok()?;
    let digest = Sha256::digest(&contents);
    Some(FileMetadata {
        mtime_ms,
        checksum: hex::encode(digest),
    })
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExecutionLogEntry> {
    let operation: Option<String> = row.get(2)?;
    let decision_s: String = row.get(3)?;
    let decision = Decision::from_str_loose(&decision_s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown decision: {decision_s}").into(),
        )
    })?;
    let patterns: String = row.get(4)?;
    Ok(ExecutionLogEntry {
        session_id: row.get(0)?,
        file_path: row.get(1)?,
        operation: operation.as_deref().and_then(FileOperation::from_str_loose),
        decision,
        patterns: if patterns.is_empty() {
            Vec::new()
        } else {
            patterns.split(',').map(str::to_string).collect()
        },
        file_mtime_ms: row.get(5)?,
        file_checksum: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Convenience: build an entry timestamped now.
pub fn new_entry(
    session_id: &str,
    file_path: &str,
    operation: Option<FileOperation>,
    decision: Decision,
    patterns: Vec<String>,
) -> ExecutionLogEntry {
    ExecutionLogEntry {
        session_id: session_id.to_string(),
        file_path: file_path.to_string(),
        operation,
        decision,
        patterns,
        file_mtime_ms: None,
        file_checksum: None,
        created_at: chrono::Utc::now().timestamp_millis(),
    }
}
