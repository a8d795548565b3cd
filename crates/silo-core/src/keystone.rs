//! Keystone bootstrap readiness tracker.
//!
//! Sentinel runs an "init commands" flow once per cluster bootstrap. When
//! that flow completes it writes a reserved secret; the mere presence of
//! that secret is the readiness signal. Status is derived on demand from
//! the store — there is no persistent status record that could drift out
//! of sync.
//!
//! Once `Ready`, the status never reverts during normal operation: the
//! gateway's delete operation refuses to remove the reserved secret, so a
//! Sentinel that crashes and restarts can trust `Ready` and skip
//! re-initialization.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::SecretStore;

/// Reserved secret name whose presence marks bootstrap as complete.
pub const KEYSTONE_SECRET_NAME: &str = "keystone-init";

/// Derived bootstrap state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeystoneStatus {
    /// The init flow has not completed yet.
    Pending,
    /// The init flow completed at least once.
    Ready,
}

/// Computes the keystone status from the secret store.
#[derive(Debug, Clone)]
pub struct KeystoneTracker {
    store: Arc<SecretStore>,
}

impl KeystoneTracker {
    /// Create a tracker over the given store.
    #[must_use]
    pub fn new(store: Arc<SecretStore>) -> Self {
        Self { store }
    }

    /// Compute the current status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RootKeyNotSet`] while the root key is unset —
    /// readiness cannot be determined before the store is operational.
    pub async fn status(&self) -> Result<KeystoneStatus, StoreError> {
        if self.store.exists(KEYSTONE_SECRET_NAME).await? {
            Ok(KeystoneStatus::Ready)
        } else {
            Ok(KeystoneStatus::Pending)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rootkey::{RootKeyCell, RootKeyMaterial};
    use crate::secret::SecretMeta;
    use crate::store::SecretUpsert;

    async fn store() -> Arc<SecretStore> {
        let root_key = Arc::new(RootKeyCell::new());
        root_key.init(RootKeyMaterial::generate()).await.unwrap();
        Arc::new(SecretStore::new(root_key))
    }

    fn upsert(name: &str) -> SecretUpsert {
        SecretUpsert {
            name: name.to_owned(),
            value: "marker".to_owned(),
            meta: SecretMeta::default(),
            not_before: None,
            expires_after: None,
        }
    }

    #[tokio::test]
    async fn pending_until_keystone_secret_exists() {
        let store = store().await;
        let tracker = KeystoneTracker::new(Arc::clone(&store));
        assert_eq!(tracker.status().await.unwrap(), KeystoneStatus::Pending);

        store.put(upsert(KEYSTONE_SECRET_NAME)).await.unwrap();
        assert_eq!(tracker.status().await.unwrap(), KeystoneStatus::Ready);
    }

    #[tokio::test]
    async fn ready_survives_unrelated_deletes() {
        let store = store().await;
        let tracker = KeystoneTracker::new(Arc::clone(&store));

        store.put(upsert(KEYSTONE_SECRET_NAME)).await.unwrap();
        store.put(upsert("workload-a")).await.unwrap();
        store.put(upsert("workload-b")).await.unwrap();
        assert_eq!(tracker.status().await.unwrap(), KeystoneStatus::Ready);

        store.delete("workload-a").await.unwrap();
        store.delete("workload-b").await.unwrap();
        assert_eq!(tracker.status().await.unwrap(), KeystoneStatus::Ready);
    }

    #[tokio::test]
    async fn status_requires_root_key() {
        let store = Arc::new(SecretStore::new(Arc::new(RootKeyCell::new())));
        let tracker = KeystoneTracker::new(store);
        assert!(matches!(
            tracker.status().await,
            Err(StoreError::RootKeyNotSet)
        ));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&KeystoneStatus::Ready).unwrap();
        assert_eq!(json, "\"ready\"");
        let json = serde_json::to_string(&KeystoneStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
