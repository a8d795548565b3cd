//! Error types for `silo-core`.
//!
//! Each error variant carries enough context to diagnose the problem without
//! a debugger. No variant ever includes secret values — only names and
//! operation descriptions.

/// Errors from the root key manager.
#[derive(Debug, thiserror::Error)]
pub enum RootKeyError {
    /// The root key has already been initialized — it is set exactly once
    /// at process bootstrap.
    #[error("root key is already initialized")]
    AlreadyInitialized,
}

/// Errors from the secret store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The root key precondition does not hold — no secret operation may
    /// proceed. Distinct from an authorization failure.
    #[error("root key not set")]
    RootKeyNotSet,

    /// No secret is stored under the requested name, or the stored secret
    /// is outside its validity window.
    #[error("secret not found: {name}")]
    NotFound { name: String },

    /// The incoming secret could not be rendered at all.
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Errors from the transformation engine.
///
/// Only an empty value is a hard failure; every other degradation produces
/// a fallback string alongside a [`crate::transform::Fallback`] marker so
/// callers can still display something.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The secret has no value at all.
    #[error("no value for secret {name}")]
    EmptyValue { name: String },
}

/// Errors from journal sinks.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// A specific journal sink failed to persist an entry.
    #[error("journal sink '{name}' failed: {reason}")]
    SinkFailure { name: String, reason: String },

    /// Serialization of the journal entry failed.
    #[error("journal serialization failed: {reason}")]
    Serialization { reason: String },
}
