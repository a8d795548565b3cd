//! Workload identity classification.
//!
//! Identities arrive as verified strings from the mutual-TLS handshake —
//! this module never issues or validates certificates, it only classifies
//! an already-trusted identity into a role by structural prefix matching.
//!
//! A mismatch is a rejection, never an error: callers learn "not
//! authorized" and nothing else, so an attacker cannot enumerate which
//! part of an identity failed to match.

use serde::{Deserialize, Serialize};

/// The role a verified identity resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The privileged operator ("Sentinel").
    Sentinel,
    /// The secret-store service itself ("Safe").
    Safe,
    /// An ordinary workload consuming its own secret.
    Workload,
    /// Anything that matches no configured namespace.
    Unknown,
}

/// Classifies identity strings against configured namespace prefixes.
///
/// Prefixes are injected configuration, read once at startup — never
/// hard-coded pattern literals. Tests construct matchers with synthetic
/// prefixes.
#[derive(Debug, Clone)]
pub struct IdentityMatcher {
    sentinel_prefix: String,
    safe_prefix: String,
    workload_prefix: String,
}

impl IdentityMatcher {
    /// Create a matcher from the three configured namespace prefixes.
    #[must_use]
    pub fn new(
        sentinel_prefix: impl Into<String>,
        safe_prefix: impl Into<String>,
        workload_prefix: impl Into<String>,
    ) -> Self {
        Self {
            sentinel_prefix: sentinel_prefix.into(),
            safe_prefix: safe_prefix.into(),
            workload_prefix: workload_prefix.into(),
        }
    }

    /// Classify an identity string. Pure and total — unmatched identities
    /// resolve to [`Role::Unknown`].
    #[must_use]
    pub fn role_of(&self, identity: &str) -> Role {
        if identity.is_empty() {
            return Role::Unknown;
        }
        if identity.starts_with(&self.sentinel_prefix) {
            return Role::Sentinel;
        }
        if identity.starts_with(&self.safe_prefix) {
            return Role::Safe;
        }
        if identity.starts_with(&self.workload_prefix) {
            return Role::Workload;
        }
        Role::Unknown
    }

    /// Whether the identity belongs to the operator namespace.
    #[must_use]
    pub fn is_sentinel(&self, identity: &str) -> bool {
        self.role_of(identity) == Role::Sentinel
    }

    /// Whether the identity belongs to the store-service namespace.
    #[must_use]
    pub fn is_safe(&self, identity: &str) -> bool {
        self.role_of(identity) == Role::Safe
    }

    /// The part of a sentinel identity after the namespace prefix.
    ///
    /// Returns `None` for identities outside the sentinel namespace or with
    /// nothing after the prefix — the latter is a malformed peer SVID.
    #[must_use]
    pub fn sentinel_suffix<'a>(&self, identity: &'a str) -> Option<&'a str> {
        let rest = identity.strip_prefix(&self.sentinel_prefix)?;
        if rest.is_empty() { None } else { Some(rest) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> IdentityMatcher {
        IdentityMatcher::new(
            "spiffe://test.local/ns/silo-system/sa/sentinel",
            "spiffe://test.local/ns/silo-system/sa/safe",
            "spiffe://test.local/workload/",
        )
    }

    #[test]
    fn sentinel_identity_resolves() {
        let m = matcher();
        assert_eq!(
            m.role_of("spiffe://test.local/ns/silo-system/sa/sentinel/instance/0"),
            Role::Sentinel
        );
        assert!(m.is_sentinel("spiffe://test.local/ns/silo-system/sa/sentinel/x"));
    }

    #[test]
    fn safe_identity_resolves() {
        let m = matcher();
        assert_eq!(
            m.role_of("spiffe://test.local/ns/silo-system/sa/safe/instance/0"),
            Role::Safe
        );
    }

    #[test]
    fn workload_identity_resolves() {
        let m = matcher();
        assert_eq!(
            m.role_of("spiffe://test.local/workload/billing"),
            Role::Workload
        );
    }

    #[test]
    fn unmatched_identity_is_unknown() {
        let m = matcher();
        assert_eq!(m.role_of("spiffe://evil.example/sa/sentinel"), Role::Unknown);
        assert_eq!(m.role_of(""), Role::Unknown);
        assert_eq!(m.role_of("not-an-identity"), Role::Unknown);
    }

    #[test]
    fn sentinel_suffix_requires_remainder() {
        let m = matcher();
        assert_eq!(
            m.sentinel_suffix("spiffe://test.local/ns/silo-system/sa/sentinel/i0"),
            Some("/i0")
        );
        assert_eq!(
            m.sentinel_suffix("spiffe://test.local/ns/silo-system/sa/sentinel"),
            None
        );
        assert_eq!(m.sentinel_suffix("spiffe://other/thing"), None);
    }
}
