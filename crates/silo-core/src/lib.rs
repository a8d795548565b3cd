//! Core library for Silo.
//!
//! Contains the identity validator, root key manager, secret model and
//! transformation engine, the keyed secret store, the keystone readiness
//! tracker, the append-only audit journal, and the per-request gateway
//! state machine. This crate knows nothing about HTTP or process wiring —
//! the `silo-safe` server and `silo-sentinel` CLI sit on top of it.

pub mod error;
pub mod gateway;
pub mod identity;
pub mod journal;
pub mod keystone;
pub mod rootkey;
pub mod secret;
pub mod store;
pub mod transform;
