//! Core building blocks for simplegen.
//!
//! - [`types`] — chat messages, system-prompt placement, typed model parameters
//! - [`config`] — settings schema and loader (`~/.simplegen/config.json` + env vars)
//! - [`store`] — model configurations and the request audit log
//! - [`error`] — store error type

pub mod config;
pub mod error;
pub mod store;
pub mod types;
pub mod utils;

pub use error::StoreError;
