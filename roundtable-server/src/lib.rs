//! Server library for Roundtable.
//!
//! Exposes the HTTP surface so both the `roundtable` binary and the
//! integration tests can build the router with their own state.

pub mod http;
