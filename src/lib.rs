//! jsrelay - Minifying JavaScript relay
//!
//! Serves upstream scripts minified by the Closure Compiler service from an
//! in-memory cache that is flushed hourly and on GitHub push webhooks.

pub mod cache;
pub mod capture;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod decode;
pub mod error;
pub mod server;
pub mod source;
pub mod webhook;

pub use error::{RelayError, RelayResult};
