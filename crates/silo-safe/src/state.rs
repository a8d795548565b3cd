//! Shared application state for the Safe server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. It holds the secret store, root key cell,
//! audit journal, identity matcher, and keystone tracker.

use std::sync::Arc;

use silo_core::identity::IdentityMatcher;
use silo_core::journal::Journal;
use silo_core::keystone::KeystoneTracker;
use silo_core::rootkey::RootKeyCell;
use silo_core::store::SecretStore;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// The keyed secret store.
    pub store: Arc<SecretStore>,
    /// Root key precondition cell.
    pub root_key: Arc<RootKeyCell>,
    /// Append-only audit journal.
    pub journal: Arc<Journal>,
    /// Identity role classifier.
    pub matcher: IdentityMatcher,
    /// Keystone readiness tracker.
    pub keystone: KeystoneTracker,
}

impl AppState {
    /// Wire up the state graph over a root key cell and identity matcher.
    #[must_use]
    pub fn new(root_key: Arc<RootKeyCell>, journal: Arc<Journal>, matcher: IdentityMatcher) -> Self {
        let store = Arc::new(SecretStore::new(Arc::clone(&root_key)));
        let keystone = KeystoneTracker::new(Arc::clone(&store));
        Self {
            store,
            root_key,
            journal,
            matcher,
            keystone,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
