//! Stored secret model.
//!
//! A [`SecretStored`] is keyed by the workload identifier it belongs to.
//! The raw `value` may itself encode multiple values (a JSON object);
//! `value_transformed` is the rendering consumers see — a cache derived
//! purely from `value` + `meta`, recomputed on every mutation, never a
//! source of truth of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output format for a rendered secret value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretFormat {
    /// Emit the pre-transformation string unchanged.
    Raw,
    /// Emit only if the pre-transformation string is valid JSON.
    #[default]
    Json,
    /// Re-encode as YAML, using valid JSON as the accepted intermediate.
    Yaml,
}

/// Template, format, and correlation context used for rendering.
///
/// Owned by its [`SecretStored`], never shared between records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretMeta {
    /// Template applied to the raw value before format checks. Empty means
    /// no transformation.
    #[serde(default)]
    pub template: String,
    /// Target output format.
    #[serde(default)]
    pub format: SecretFormat,
    /// Correlation id of the request that last touched this secret.
    #[serde(default)]
    pub correlation_id: String,
}

/// A secret persisted in the Safe store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretStored {
    /// Unique key — the associated workload identifier.
    pub name: String,
    /// Raw secret content.
    pub value: String,
    /// Cached rendering seen by consumers (template + format applied).
    pub value_transformed: String,
    /// Rendering hints.
    pub meta: SecretMeta,
    /// When the secret was first created.
    pub created: DateTime<Utc>,
    /// When the secret was last written.
    pub updated: DateTime<Utc>,
    /// Invalid before this time. `None` means no lower bound.
    #[serde(default)]
    pub not_before: Option<DateTime<Utc>>,
    /// Invalid after this time. `None` means it never expires.
    #[serde(default)]
    pub expires_after: Option<DateTime<Utc>>,
}

impl SecretStored {
    /// Whether the secret is inside its validity window at `now`.
    ///
    /// A secret outside the window is inapplicable to readers — it is not
    /// physically deleted.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if let Some(nb) = self.not_before {
            if now < nb {
                return false;
            }
        }
        if let Some(exp) = self.expires_after {
            if now > exp {
                return false;
            }
        }
        true
    }
}
