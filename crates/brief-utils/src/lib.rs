//! Shared utilities for market-brief
//!
//! This crate holds the pieces every binary in the workspace needs before the
//! pipeline itself is built: tracing setup and typed environment lookups.

pub mod config;
pub mod logging;

pub use config::{env_flag, env_or, env_string};
pub use logging::{init_json_tracing, init_tracing};
