//! Library surface of the Safe server.
//!
//! Exposes the config, state, middleware, routes, and error mapping so the
//! binary entry point (and tests) can assemble the router.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
