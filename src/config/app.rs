//! Main application configuration
//!
//! This module defines the primary configuration structures for the review
//! pipeline, including environment variable and TOML file loading and validation.

use crate::config::engine::{config_error, read_env, EngineConfig};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub engine: EngineConfig,
    pub notifications: NotificationSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit a progress line every N applications during bulk recalculation
    pub progress_interval: usize,
}

/// Confirmation notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Send a confirmation on the first save of an application
    pub enabled: bool,
    /// Sender address used in confirmations
    pub from_address: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "review-pipeline".to_string(),
            log_level: "info".to_string(),
            progress_interval: 20,
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            from_address: "no-reply@localhost".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            config_error(&format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut config: AppConfig = toml::from_str(&raw)
            .map_err(|e| config_error(&format!("{}: {}", path.display(), e)))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        read_env("PROGRESS_INTERVAL", &mut self.service.progress_interval)?;

        // Notification settings
        read_env("SEND_EMAILS", &mut self.notifications.enabled)?;
        if let Ok(from) = env::var("DEFAULT_FROM_EMAIL") {
            self.notifications.from_address = from;
        }

        // Engine thresholds
        self.engine.apply_env()?;

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => {
            return Err(config_error(&format!(
                "Invalid log level: {}",
                config.service.log_level
            )))
        }
    }

    if config.service.name.is_empty() {
        return Err(config_error("Service name cannot be empty"));
    }
    if config.service.progress_interval == 0 {
        return Err(config_error("Progress interval must be greater than 0"));
    }

    if config.notifications.enabled && config.notifications.from_address.is_empty() {
        return Err(config_error(
            "Sender address is required when notifications are enabled",
        ));
    }

    config.engine.validate()?;

    Ok(())
}
