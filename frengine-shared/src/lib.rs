//! # Frengine Shared Library
//!
//! Domain types, storage and the identity/freshness core shared by the
//! Frengine API server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: Account, project and revision rows
//! - `store`: Storage capability traits with PostgreSQL and in-memory backends
//! - `db`: Connection pool and migrations
//! - `auth`: Credential vault, session tokens, identity resolution, ownership checks
//! - `freshness`: Last-modified reconciliation and conditional GET decisions

pub mod auth;
pub mod db;
pub mod freshness;
pub mod models;
pub mod store;

/// Current version of the Frengine shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
