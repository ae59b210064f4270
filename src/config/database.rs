// ABOUTME: Database configuration types for the local SQLite recipe store
// ABOUTME: Parses DATABASE_URL and pool sizing from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::{database, defaults};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

/// Type-safe database location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to `SQLite` database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string
    ///
    /// `sqlite::memory:` selects an in-memory database, `sqlite:<path>` a file,
    /// and anything else is treated as a bare file path.
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        s.strip_prefix("sqlite:").map_or_else(
            || Self::SQLite {
                path: PathBuf::from(s),
            },
            |path_str| {
                if path_str == ":memory:" {
                    Self::Memory
                } else {
                    Self::SQLite {
                        path: PathBuf::from(path_str.trim_start_matches("//")),
                    }
                }
            },
        )
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".into(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::SQLite {
            path: base
                .join(defaults::APP_DATA_DIR)
                .join(defaults::DATABASE_FILE),
        }
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database location
    pub url: DatabaseUrl,
    /// Maximum pooled connections (always 1 for in-memory databases)
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DatabaseUrl::default(),
            max_connections: database::POOL_MAX_SIZE,
        }
    }
}

impl DatabaseConfig {
    /// In-memory configuration used by tests and dry runs
    #[must_use]
    pub const fn memory() -> Self {
        Self {
            url: DatabaseUrl::Memory,
            max_connections: 1,
        }
    }

    /// Load database configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_MAX_CONNECTIONS` is not a positive integer
    pub fn from_env() -> AppResult<Self> {
        let url = env::var("DATABASE_URL")
            .map(|value| DatabaseUrl::parse_url(&value))
            .unwrap_or_default();

        let max_connections: u32 = env_var_or(
            "DATABASE_MAX_CONNECTIONS",
            &database::POOL_MAX_SIZE.to_string(),
        )
        .parse()
        .map_err(|e| {
            AppError::config_invalid(format!("Invalid DATABASE_MAX_CONNECTIONS value: {e}"))
        })?;

        if max_connections == 0 {
            return Err(AppError::config_invalid(
                "DATABASE_MAX_CONNECTIONS must be at least 1",
            ));
        }

        Ok(Self {
            max_connections: if url.is_memory() { 1 } else { max_connections },
            url,
        })
    }
}

/// Get environment variable or default value
pub(crate) fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_variants() {
        assert_eq!(DatabaseUrl::parse_url("sqlite::memory:"), DatabaseUrl::Memory);
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:./data/recipes.db"),
            DatabaseUrl::SQLite {
                path: PathBuf::from("./data/recipes.db")
            }
        );
        assert_eq!(
            DatabaseUrl::parse_url("/tmp/recipes.db").to_connection_string(),
            "sqlite:/tmp/recipes.db"
        );
    }

    #[test]
    fn test_memory_config_uses_single_connection() {
        let config = DatabaseConfig::memory();
        assert!(config.url.is_memory());
        assert_eq!(config.max_connections, 1);
    }
}
