//! Concurrency-safe keyed collection of stored secrets.
//!
//! The store holds all records behind a single `tokio` `RwLock` over a
//! `BTreeMap`, which gives name-ordered listing for free and makes every
//! mutation atomic: readers can never observe a record whose `value` and
//! `value_transformed` belong to different writes.
//!
//! Every operation checks the root key precondition first. While the root
//! key is unset the store performs no work and answers with
//! [`StoreError::RootKeyNotSet`] — a "not ready" outcome, distinct from
//! authorization failures.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::StoreError;
use crate::rootkey::RootKeyCell;
use crate::secret::{SecretMeta, SecretStored};
use crate::transform;

/// Payload for a create-or-overwrite operation.
#[derive(Debug, Clone)]
pub struct SecretUpsert {
    /// Workload identifier the secret belongs to.
    pub name: String,
    /// Raw secret content.
    pub value: String,
    /// Rendering hints.
    pub meta: SecretMeta,
    /// Optional validity window lower bound.
    pub not_before: Option<DateTime<Utc>>,
    /// Optional validity window upper bound.
    pub expires_after: Option<DateTime<Utc>>,
}

/// The keyed secret store owned by Safe.
pub struct SecretStore {
    root_key: Arc<RootKeyCell>,
    secrets: RwLock<BTreeMap<String, SecretStored>>,
}

impl SecretStore {
    /// Create an empty store gated by the given root key cell.
    #[must_use]
    pub fn new(root_key: Arc<RootKeyCell>) -> Self {
        Self {
            root_key,
            secrets: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create or overwrite the secret for `upsert.name`.
    ///
    /// The transformed cache is recomputed through the transformation
    /// engine before the record becomes visible; a degraded render is
    /// still a success and is reported on the diagnostic channel. On
    /// overwrite, `created` is preserved and `updated` refreshed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::RootKeyNotSet`] while the root key is unset.
    /// - [`StoreError::Render`] when the incoming value is empty.
    pub async fn put(&self, upsert: SecretUpsert) -> Result<SecretStored, StoreError> {
        self.require_root_key().await?;

        let now = Utc::now();
        let mut record = SecretStored {
            name: upsert.name,
            value: upsert.value,
            value_transformed: String::new(),
            meta: upsert.meta,
            created: now,
            updated: now,
            not_before: upsert.not_before,
            expires_after: upsert.expires_after,
        };

        let rendered = transform::render(&record)?;
        if !rendered.is_clean() {
            warn!(
                name = %record.name,
                correlation_id = %record.meta.correlation_id,
                fallbacks = ?rendered.fallbacks,
                "secret stored with degraded rendering"
            );
        }
        record.value_transformed = rendered.output;

        let mut secrets = self.secrets.write().await;
        if let Some(existing) = secrets.get(&record.name) {
            record.created = existing.created;
        }
        secrets.insert(record.name.clone(), record.clone());
        Ok(record)
    }

    /// Remove the secret stored under `name`.
    ///
    /// Deleting an absent name is a no-op success — delete is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RootKeyNotSet`] while the root key is unset.
    pub async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.require_root_key().await?;
        self.secrets.write().await.remove(name);
        Ok(())
    }

    /// Look up the secret stored under `name`.
    ///
    /// A record outside its validity window is inapplicable to readers and
    /// reported as [`StoreError::NotFound`]; it is not physically deleted.
    ///
    /// # Errors
    ///
    /// - [`StoreError::RootKeyNotSet`] while the root key is unset.
    /// - [`StoreError::NotFound`] for absent or inactive names.
    pub async fn get(&self, name: &str) -> Result<SecretStored, StoreError> {
        self.require_root_key().await?;
        let secrets = self.secrets.read().await;
        secrets
            .get(name)
            .filter(|s| s.is_active(Utc::now()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_owned(),
            })
    }

    /// All stored secrets, ordered by name for determinism.
    ///
    /// With `transformed_only`, records whose transformed cache is empty
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RootKeyNotSet`] while the root key is unset.
    pub async fn list(&self, transformed_only: bool) -> Result<Vec<SecretStored>, StoreError> {
        self.require_root_key().await?;
        let secrets = self.secrets.read().await;
        Ok(secrets
            .values()
            .filter(|s| !transformed_only || !s.value_transformed.is_empty())
            .cloned()
            .collect())
    }

    /// Whether a secret exists under `name`, regardless of its validity
    /// window. Used by the keystone tracker.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RootKeyNotSet`] while the root key is unset.
    pub async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        self.require_root_key().await?;
        Ok(self.secrets.read().await.contains_key(name))
    }

    /// Number of stored secrets (diagnostics).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RootKeyNotSet`] while the root key is unset.
    pub async fn count(&self) -> Result<usize, StoreError> {
        self.require_root_key().await?;
        Ok(self.secrets.read().await.len())
    }

    async fn require_root_key(&self) -> Result<(), StoreError> {
        if self.root_key.is_initialized().await {
            Ok(())
        } else {
            Err(StoreError::RootKeyNotSet)
        }
    }
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore").finish_non_exhaustive()
    }
}
