//! Configuration management for the review pipeline
//!
//! This module handles all configuration loading from environment variables
//! and TOML files, validation, and default values.

pub mod app;
pub mod engine;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, NotificationSettings, ServiceSettings};
pub use engine::EngineConfig;

/// Serializes tests that read or write process environment variables
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
