// ABOUTME: Database management for the local recipe store
// ABOUTME: Opens the SQLite pool, enforces foreign keys, and creates the recipe tree schema
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! A recipe tree is stored in four tables, one per level, each child table
//! holding a cascading foreign key to its parent. Deleting a recipe row is
//! enough to remove every chapter, step, and ingredient below it.

/// SQL operations on the recipe tree tables
pub mod recipes;
/// Persistence port traits and the `SQLite` implementation
pub mod repositories;
/// Transaction guard and retry helpers
pub mod transactions;

pub use recipe_core::errors::DatabaseError;
pub use recipes::RecipeManager;

use crate::config::DatabaseConfig;
use crate::constants::database;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Database manager owning the connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened or the schema cannot be created
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let connection_string = config.url.to_connection_string();
        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| DatabaseError::ConnectionError {
                context: format!("Invalid database URL {connection_string}: {e}"),
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        if let crate::config::DatabaseUrl::SQLite { path } = &config.url {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DatabaseError::ConnectionError {
                        context: format!("Cannot create {}: {e}", parent.display()),
                    }
                })?;
            }
        }

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(database::CONNECTION_TIMEOUT_SECS));

        // Every connection to `sqlite::memory:` is a separate database, so the
        // pool must keep exactly one connection alive for the whole run.
        pool_options = if config.url.is_memory() {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionError {
                context: format!("Failed to open {connection_string}: {e}"),
            })?;

        let db = Self { pool };
        db.migrate().await?;

        info!(database.url = %config.url, "Recipe database ready");
        Ok(db)
    }

    /// Open a fresh in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created
    pub async fn new_in_memory() -> Result<Self, DatabaseError> {
        Self::new(&DatabaseConfig::memory()).await
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a schema statement fails
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        self.migrate_recipes().await?;
        self.migrate_tree().await?;
        debug!("Recipe schema migrated");
        Ok(())
    }

    async fn migrate_recipes(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS recipes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK (length(name) > 0),
                category TEXT NOT NULL CHECK (length(category) > 0),
                sub_category TEXT NOT NULL DEFAULT '',
                servings INTEGER NOT NULL CHECK (servings >= 1),
                note TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipes_category ON recipes(category, name)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn migrate_tree(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chapters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                name TEXT NOT NULL DEFAULT '',
                note TEXT NOT NULL DEFAULT '',
                order_number INTEGER NOT NULL CHECK (order_number >= 1)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS steps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chapter_id INTEGER NOT NULL REFERENCES chapters(id) ON DELETE CASCADE,
                description TEXT NOT NULL CHECK (length(description) > 0),
                timer_minutes INTEGER CHECK (timer_minutes IS NULL OR timer_minutes > 0),
                note TEXT NOT NULL DEFAULT '',
                order_number INTEGER NOT NULL CHECK (order_number >= 1)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                step_id INTEGER NOT NULL REFERENCES steps(id) ON DELETE CASCADE,
                name TEXT NOT NULL CHECK (length(name) > 0),
                quantity REAL NOT NULL DEFAULT 0 CHECK (quantity >= 0),
                unit TEXT NOT NULL DEFAULT '',
                order_number INTEGER NOT NULL CHECK (order_number >= 1)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chapters_recipe ON chapters(recipe_id, order_number)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_steps_chapter ON steps(chapter_id, order_number)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_ingredients_step ON ingredients(step_id, order_number)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
