//! Settings system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use simplegen_core::config;
//!
//! let settings = config::load_settings(None);
//! println!("API base: {}", settings.api_base);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_settings_path, load_settings, save_settings};
pub use schema::Settings;
