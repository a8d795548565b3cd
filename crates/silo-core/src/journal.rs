//! Append-only audit journal.
//!
//! Every externally visible request produces exactly one `Enter` event and
//! exactly one terminal event sharing its correlation id, so full request
//! lifecycles can be reconstructed from the journal alone. Entries are
//! immutable once written; sinks only ever append.
//!
//! Logging is best-effort from the caller's perspective: a sink failure
//! must never abort the operation that triggered it. Failures are surfaced
//! on the diagnostic channel (`tracing::warn!`) instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use crate::error::JournalError;

/// Lifecycle event tag for one journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    /// Request handling started.
    Enter,
    /// The operation succeeded.
    Ok,
    /// The peer identity did not resolve to the required role.
    BadIdentity,
    /// The peer identity matched the role namespace but was malformed.
    BadPeerSvid,
    /// The request body could not be read or was not syntactically valid.
    BrokenBody,
    /// The body parsed but did not match the expected request shape.
    RequestTypeMismatch,
    /// A required workload id list was empty.
    NoWorkloadId,
    /// The store rejected the operation after the request was admitted.
    StoreFailure,
}

/// One audit record. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Opaque per-request identifier threading the request through the
    /// journal and the process logs.
    pub correlation_id: String,
    /// HTTP method or equivalent operation identifier.
    pub method: String,
    /// Request URL or operation path.
    pub url: String,
    /// Verified peer identity string.
    pub identity: String,
    /// Lifecycle event tag.
    pub event: AuditEvent,
    /// When the event was recorded.
    pub at: DateTime<Utc>,
}

/// A journal persistence target.
///
/// Implementations must be safe to share across async tasks and must only
/// ever append — no update or delete.
#[async_trait::async_trait]
pub trait JournalSink: Send + Sync {
    /// The sink's name, for diagnostics.
    fn name(&self) -> &str;

    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be persisted.
    async fn append(&self, entry: &JournalEntry) -> Result<(), JournalError>;
}

/// Fans entries out to all registered sinks, best-effort.
pub struct Journal {
    sinks: RwLock<Vec<Arc<dyn JournalSink>>>,
}

impl Journal {
    /// Create a journal with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
        }
    }

    /// Register a sink.
    pub async fn add_sink(&self, sink: Arc<dyn JournalSink>) {
        self.sinks.write().await.push(sink);
    }

    /// Append an entry to every sink.
    ///
    /// Sink failures never propagate to the caller — they are reported via
    /// `tracing::warn!` so the triggering request can still complete.
    pub async fn log(&self, entry: JournalEntry) {
        let sinks = self.sinks.read().await;
        for sink in sinks.iter() {
            if let Err(e) = sink.append(&entry).await {
                warn!(
                    sink = sink.name(),
                    correlation_id = %entry.correlation_id,
                    error = %e,
                    "journal sink failed"
                );
            }
        }
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal").finish_non_exhaustive()
    }
}

/// Sink that appends JSON-lines to a file.
///
/// The file is opened for append lazily on the first write; a `tokio`
/// `Mutex` around the handle serializes writes, which preserves per-
/// correlation-id ordering (global interleaving is permitted).
pub struct FileJournalSink {
    path: PathBuf,
    writer: Mutex<Option<tokio::fs::File>>,
}

impl FileJournalSink {
    /// Create a sink writing to the given path.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: Mutex::new(None),
        }
    }

    async fn get_writer(
        &self,
    ) -> Result<tokio::sync::MutexGuard<'_, Option<tokio::fs::File>>, JournalError> {
        let mut guard = self.writer.lock().await;
        if guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .map_err(|e| JournalError::SinkFailure {
                    name: self.name().to_owned(),
                    reason: format!(
                        "failed to open journal file '{}': {e}",
                        self.path.display()
                    ),
                })?;
            *guard = Some(file);
        }
        Ok(guard)
    }
}

#[async_trait::async_trait]
impl JournalSink for FileJournalSink {
    #[allow(clippy::needless_lifetimes, clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let mut line = serde_json::to_vec(entry).map_err(|e| JournalError::Serialization {
            reason: e.to_string(),
        })?;
        line.push(b'\n');

        let mut guard = self.get_writer().await?;
        let file = guard.as_mut().ok_or_else(|| JournalError::SinkFailure {
            name: "file".to_owned(),
            reason: "file handle unexpectedly None after open".to_owned(),
        })?;

        file.write_all(&line)
            .await
            .map_err(|e| JournalError::SinkFailure {
                name: "file".to_owned(),
                reason: format!("write failed: {e}"),
            })?;

        file.flush().await.map_err(|e| JournalError::SinkFailure {
            name: "file".to_owned(),
            reason: format!("flush failed: {e}"),
        })?;

        Ok(())
    }
}

impl std::fmt::Debug for FileJournalSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileJournalSink")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// In-memory sink for tests and journal inspection.
#[derive(Default)]
pub struct MemoryJournalSink {
    entries: Mutex<Vec<JournalEntry>>,
}

impl MemoryJournalSink {
    /// Create an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended entries, in append order.
    pub async fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().await.clone()
    }

    /// Entries for one correlation id, in append order.
    pub async fn entries_for(&self, correlation_id: &str) -> Vec<JournalEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.correlation_id == correlation_id)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl JournalSink for MemoryJournalSink {
    #[allow(clippy::needless_lifetimes, clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }
}

impl std::fmt::Debug for MemoryJournalSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryJournalSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(cid: &str, event: AuditEvent) -> JournalEntry {
        JournalEntry {
            correlation_id: cid.to_owned(),
            method: "DELETE".to_owned(),
            url: "/v1/sentinel/secrets".to_owned(),
            identity: "spiffe://test.local/sa/sentinel/i0".to_owned(),
            event,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn memory_sink_preserves_order() {
        let journal = Journal::new();
        let sink = Arc::new(MemoryJournalSink::new());
        journal.add_sink(Arc::clone(&sink) as Arc<dyn JournalSink>).await;

        journal.log(entry("cid-1", AuditEvent::Enter)).await;
        journal.log(entry("cid-1", AuditEvent::Ok)).await;

        let entries = sink.entries_for("cid-1").await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, AuditEvent::Enter);
        assert_eq!(entries[1].event, AuditEvent::Ok);
    }

    #[tokio::test]
    async fn log_without_sinks_is_a_no_op() {
        let journal = Journal::new();
        journal.log(entry("cid-1", AuditEvent::Enter)).await;
    }

    #[tokio::test]
    async fn failing_sink_does_not_abort_logging() {
        struct FailingSink;

        #[async_trait::async_trait]
        impl JournalSink for FailingSink {
            fn name(&self) -> &str {
                "failing"
            }
            async fn append(&self, _entry: &JournalEntry) -> Result<(), JournalError> {
                Err(JournalError::SinkFailure {
                    name: "failing".to_owned(),
                    reason: "disk on fire".to_owned(),
                })
            }
        }

        let journal = Journal::new();
        let good = Arc::new(MemoryJournalSink::new());
        journal.add_sink(Arc::new(FailingSink)).await;
        journal.add_sink(Arc::clone(&good) as Arc<dyn JournalSink>).await;

        // Must not panic or propagate; the healthy sink still receives it.
        journal.log(entry("cid-2", AuditEvent::Enter)).await;
        assert_eq!(good.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn file_sink_appends_json_lines() {
        let dir = std::env::temp_dir().join(format!("silo-journal-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("journal.log");

        let sink = FileJournalSink::new(&path);
        sink.append(&entry("cid-3", AuditEvent::Enter)).await.unwrap();
        sink.append(&entry("cid-3", AuditEvent::Ok)).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: JournalEntry = serde_json::from_str(line).unwrap();
            assert_eq!(parsed.correlation_id, "cid-3");
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
