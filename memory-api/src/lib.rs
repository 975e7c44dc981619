//! # memory-api
//!
//! External interfaces — the JSON-RPC tool surface, the REST
//! surface, the operation layer shared between them, and the
//! configuration/auth/error/health seams both surfaces depend on.
//! The three binaries in `src/bin/` assemble a concrete [`AppState`]
//! over Postgres and serve one surface each.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod ops;
pub mod rest;
pub mod state;
pub mod tool_catalog;

pub use config::{AppConfig, ConfigError};
pub use error::ApiError;
pub use state::AppState;
