//! Server configuration for Safe.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Settings are read once at startup and treated as immutable for the
//! process lifetime.

use std::net::SocketAddr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Path to the audit journal file (if file journaling is enabled).
    pub journal_file_path: Option<String>,
    /// Identity namespace prefix recognized as the Sentinel operator role.
    pub sentinel_id_prefix: String,
    /// Identity namespace prefix recognized as the Safe store role.
    pub safe_id_prefix: String,
    /// Identity namespace prefix recognized as an ordinary workload.
    pub workload_id_prefix: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SILO_BIND_ADDR` — bind address (default: `127.0.0.1:8443`)
    /// - `SILO_LOG_LEVEL` — log filter (default: `info`)
    /// - `SILO_JOURNAL_FILE` — path to the audit journal file (optional)
    /// - `SILO_TRUST_DOMAIN` — trust domain used to derive the default
    ///   identity prefixes (default: `silo.local`)
    /// - `SILO_SENTINEL_ID_PREFIX`, `SILO_SAFE_ID_PREFIX`,
    ///   `SILO_WORKLOAD_ID_PREFIX` — explicit namespace prefixes,
    ///   overriding the trust-domain-derived defaults
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("SILO_BIND_ADDR")
            .ok()
            .and_then(|addr| addr.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8443)));

        let log_level = std::env::var("SILO_LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());

        let journal_file_path = std::env::var("SILO_JOURNAL_FILE").ok();

        let trust_domain =
            std::env::var("SILO_TRUST_DOMAIN").unwrap_or_else(|_| "silo.local".to_owned());

        let sentinel_id_prefix = std::env::var("SILO_SENTINEL_ID_PREFIX")
            .unwrap_or_else(|_| format!("spiffe://{trust_domain}/ns/silo-system/sa/sentinel"));
        let safe_id_prefix = std::env::var("SILO_SAFE_ID_PREFIX")
            .unwrap_or_else(|_| format!("spiffe://{trust_domain}/ns/silo-system/sa/safe"));
        let workload_id_prefix = std::env::var("SILO_WORKLOAD_ID_PREFIX")
            .unwrap_or_else(|_| format!("spiffe://{trust_domain}/workload/"));

        Self {
            bind_addr,
            log_level,
            journal_file_path,
            sentinel_id_prefix,
            safe_id_prefix,
            workload_id_prefix,
        }
    }
}
