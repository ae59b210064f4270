// ABOUTME: Application configuration loaded from environment variables
// ABOUTME: Combines database settings, save retry policy, and logging settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::database::{env_var_or, DatabaseConfig};
use crate::constants::defaults;
use crate::errors::{AppError, AppResult};
use crate::logging::LoggingConfig;
use tracing::info;

/// Top-level configuration for the recipe book
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database location and pool sizing
    pub database: DatabaseConfig,
    /// Attempts for a recipe save that hits a transient storage error
    pub save_max_retries: u32,
    /// Logging setup
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            save_max_retries: defaults::SAVE_MAX_RETRIES,
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed
    pub fn from_env() -> AppResult<Self> {
        let save_max_retries: u32 = env_var_or(
            "RECIPE_SAVE_MAX_RETRIES",
            &defaults::SAVE_MAX_RETRIES.to_string(),
        )
        .parse()
        .map_err(|e| {
            AppError::config_invalid(format!("Invalid RECIPE_SAVE_MAX_RETRIES value: {e}"))
        })?;

        Ok(Self {
            database: DatabaseConfig::from_env()?,
            save_max_retries: save_max_retries.max(1),
            logging: LoggingConfig::from_env(),
        })
    }

    /// Log a one-line summary of the effective configuration
    pub fn log_summary(&self) {
        info!(
            database.url = %self.database.url,
            database.max_connections = self.database.max_connections,
            save.max_retries = self.save_max_retries,
            "Configuration loaded"
        );
    }
}
