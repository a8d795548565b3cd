//! Root encryption key manager.
//!
//! The root key is process-wide, write-once shared state: it is set exactly
//! once during bootstrap and lives for the process lifetime. Every secret
//! operation checks [`RootKeyCell::is_initialized`] first; while unset, the
//! store refuses all work with a distinct "not ready" outcome.
//!
//! Key material never leaves this module. It is zeroized from memory when
//! dropped.

use tokio::sync::RwLock;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::RootKeyError;

/// Opaque root key material.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RootKeyMaterial(Vec<u8>);

impl RootKeyMaterial {
    /// Wrap externally supplied key material.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Generate 32 bytes of fresh random material.
    ///
    /// Two UUID v4s give 32 bytes of OS CSPRNG randomness without pulling
    /// in a dedicated RNG dependency.
    #[must_use]
    pub fn generate() -> Self {
        let a = uuid::Uuid::new_v4();
        let b = uuid::Uuid::new_v4();
        let mut bytes = Vec::with_capacity(32);
        bytes.extend_from_slice(a.as_bytes());
        bytes.extend_from_slice(b.as_bytes());
        Self(bytes)
    }

    /// Whether the material is non-empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for RootKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RootKeyMaterial").field(&"[REDACTED]").finish()
    }
}

/// Holds the process-wide root key.
///
/// Read-mostly after the one-time initialization; a `tokio` `RwLock` keeps
/// the happens-before edge between the bootstrap write and every reader.
pub struct RootKeyCell {
    material: RwLock<Option<RootKeyMaterial>>,
}

impl RootKeyCell {
    /// Create an uninitialized cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            material: RwLock::new(None),
        }
    }

    /// Set the root key. May only succeed once per process lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`RootKeyError::AlreadyInitialized`] on any call after the
    /// first successful one.
    pub async fn init(&self, material: RootKeyMaterial) -> Result<(), RootKeyError> {
        let mut guard = self.material.write().await;
        if guard.is_some() {
            return Err(RootKeyError::AlreadyInitialized);
        }
        *guard = Some(material);
        Ok(())
    }

    /// Whether the root key has been set.
    pub async fn is_initialized(&self) -> bool {
        self.material.read().await.is_some()
    }
}

impl Default for RootKeyCell {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RootKeyCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootKeyCell").finish_non_exhaustive()
    }
}
