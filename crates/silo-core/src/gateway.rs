//! Per-request gateway state machine.
//!
//! One [`RequestGate`] exists per inbound call and is stateless across
//! requests. It walks the fixed check sequence — root-key precheck, journal
//! `Enter`, identity check, body checks done by the caller — and guarantees
//! that at most one terminal event is ever journaled for the request. Once
//! terminal, the gate refuses all further logging.
//!
//! The root-key precheck runs before anything is journaled: an unready
//! store performs no work and leaves nothing in the journal beyond a
//! process-log diagnostic.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::identity::{IdentityMatcher, Role};
use crate::journal::{AuditEvent, Journal, JournalEntry};
use crate::rootkey::RootKeyCell;

/// The root key precondition does not hold; the request was not admitted.
#[derive(Debug, thiserror::Error)]
#[error("root key not set")]
pub struct NotReady;

/// The peer identity did not satisfy the required role.
///
/// Deliberately carries no detail — the caller learns only "not
/// authorized", never why.
#[derive(Debug, thiserror::Error)]
#[error("not authorized")]
pub struct Denied;

/// Tracks one request through the gateway check sequence.
pub struct RequestGate {
    journal: Arc<Journal>,
    correlation_id: String,
    method: String,
    url: String,
    identity: String,
    terminal: bool,
}

impl RequestGate {
    /// Admit a request: verify the root-key precondition, then journal the
    /// `Enter` event.
    ///
    /// # Errors
    ///
    /// Returns [`NotReady`] while the root key is unset. Nothing is
    /// journaled in that case.
    pub async fn open(
        journal: Arc<Journal>,
        root_key: &RootKeyCell,
        correlation_id: impl Into<String>,
        method: impl Into<String>,
        url: impl Into<String>,
        identity: impl Into<String>,
    ) -> Result<Self, NotReady> {
        let correlation_id = correlation_id.into();

        if !root_key.is_initialized().await {
            info!(correlation_id = %correlation_id, "root key not set");
            return Err(NotReady);
        }

        let gate = Self {
            journal,
            correlation_id,
            method: method.into(),
            url: url.into(),
            identity: identity.into(),
            terminal: false,
        };
        gate.write(AuditEvent::Enter).await;
        Ok(gate)
    }

    /// Check that the peer identity resolves to `role`.
    ///
    /// # Errors
    ///
    /// On mismatch, journals the terminal `BadIdentity` event and returns
    /// [`Denied`]; the gate accepts no further events.
    pub async fn require_role(
        &mut self,
        matcher: &IdentityMatcher,
        role: Role,
    ) -> Result<(), Denied> {
        if matcher.role_of(&self.identity) == role {
            Ok(())
        } else {
            self.terminate(AuditEvent::BadIdentity).await;
            Err(Denied)
        }
    }

    /// Journal a terminal failure event.
    pub async fn reject(&mut self, event: AuditEvent) {
        self.terminate(event).await;
    }

    /// Journal the terminal `Ok` event.
    pub async fn ok(&mut self) {
        self.terminate(AuditEvent::Ok).await;
    }

    /// The correlation id this gate was opened with.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// The verified peer identity this gate was opened with.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Whether a terminal event has been journaled.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    async fn terminate(&mut self, event: AuditEvent) {
        if self.terminal {
            return;
        }
        self.terminal = true;
        self.write(event).await;
    }

    async fn write(&self, event: AuditEvent) {
        self.journal
            .log(JournalEntry {
                correlation_id: self.correlation_id.clone(),
                method: self.method.clone(),
                url: self.url.clone(),
                identity: self.identity.clone(),
                event,
                at: Utc::now(),
            })
            .await;
    }
}

impl std::fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGate")
            .field("correlation_id", &self.correlation_id)
            .field("terminal", &self.terminal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::journal::{JournalSink, MemoryJournalSink};
    use crate::rootkey::RootKeyMaterial;

    const SENTINEL_ID: &str = "spiffe://test.local/sa/sentinel/i0";

    fn matcher() -> IdentityMatcher {
        IdentityMatcher::new(
            "spiffe://test.local/sa/sentinel",
            "spiffe://test.local/sa/safe",
            "spiffe://test.local/workload/",
        )
    }

    async fn journal_with_sink() -> (Arc<Journal>, Arc<MemoryJournalSink>) {
        let journal = Arc::new(Journal::new());
        let sink = Arc::new(MemoryJournalSink::new());
        journal
            .add_sink(Arc::clone(&sink) as Arc<dyn JournalSink>)
            .await;
        (journal, sink)
    }

    async fn unlocked_key() -> RootKeyCell {
        let cell = RootKeyCell::new();
        cell.init(RootKeyMaterial::generate()).await.unwrap();
        cell
    }

    async fn open(
        journal: &Arc<Journal>,
        root_key: &RootKeyCell,
        identity: &str,
    ) -> Result<RequestGate, NotReady> {
        RequestGate::open(
            Arc::clone(journal),
            root_key,
            "cid-1",
            "DELETE",
            "/v1/sentinel/secrets",
            identity,
        )
        .await
    }

    #[tokio::test]
    async fn unready_root_key_journals_nothing() {
        let (journal, sink) = journal_with_sink().await;
        let root_key = RootKeyCell::new();

        let gate = open(&journal, &root_key, SENTINEL_ID).await;
        assert!(gate.is_err());
        assert!(sink.entries().await.is_empty());
    }

    #[tokio::test]
    async fn happy_path_journals_enter_then_ok() {
        let (journal, sink) = journal_with_sink().await;
        let root_key = unlocked_key().await;

        let mut gate = open(&journal, &root_key, SENTINEL_ID).await.unwrap();
        gate.require_role(&matcher(), Role::Sentinel).await.unwrap();
        gate.ok().await;

        let entries = sink.entries_for("cid-1").await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, AuditEvent::Enter);
        assert_eq!(entries[1].event, AuditEvent::Ok);
    }

    #[tokio::test]
    async fn bad_identity_is_the_single_terminal_event() {
        let (journal, sink) = journal_with_sink().await;
        let root_key = unlocked_key().await;

        let mut gate = open(&journal, &root_key, "spiffe://test.local/workload/w1")
            .await
            .unwrap();
        let denied = gate.require_role(&matcher(), Role::Sentinel).await;
        assert!(denied.is_err());
        assert!(gate.is_terminal());

        // A later ok() must not produce a second terminal event.
        gate.ok().await;

        let entries = sink.entries_for("cid-1").await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, AuditEvent::Enter);
        assert_eq!(entries[1].event, AuditEvent::BadIdentity);
    }

    #[tokio::test]
    async fn reject_after_reject_is_ignored() {
        let (journal, sink) = journal_with_sink().await;
        let root_key = unlocked_key().await;

        let mut gate = open(&journal, &root_key, SENTINEL_ID).await.unwrap();
        gate.reject(AuditEvent::BrokenBody).await;
        gate.reject(AuditEvent::RequestTypeMismatch).await;
        gate.ok().await;

        let entries = sink.entries_for("cid-1").await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].event, AuditEvent::BrokenBody);
    }

    #[tokio::test]
    async fn unknown_identity_is_denied_without_detail() {
        let (journal, _sink) = journal_with_sink().await;
        let root_key = unlocked_key().await;

        let mut gate = open(&journal, &root_key, "").await.unwrap();
        let denied = gate.require_role(&matcher(), Role::Sentinel).await;
        assert!(denied.is_err());
        // The error exposes no reason beyond "not authorized".
        assert_eq!(denied.unwrap_err().to_string(), "not authorized");
    }
}
