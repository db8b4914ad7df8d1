//! # Frengine API Server Library
//!
//! HTTP surface for accounts, projects and revisions.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `conditional`: Conditional GET (`Last-Modified` / `304`)
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Response-side layers
//! - `routes`: API route handlers

pub mod app;
pub mod conditional;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
