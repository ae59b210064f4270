// ABOUTME: Main library entry point for the Recipe Book editor
// ABOUTME: Multi-level recipe drafts, tree reconciliation, and local SQLite persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Recipe Book
//!
//! Edits a four-level recipe tree (recipe, chapters, steps, ingredients)
//! through isolated per-level drafts and persists it with a single save.
//! The save reconciles the drafted tree against the stored tree inside one
//! transaction: removed children are deleted, every remaining child is
//! upserted with an order number taken from its position, and children are
//! always written against the key their parent's upsert produced.
//!
//! ## Architecture
//!
//! - **Editor**: `Draft` state holders and the `EditSession` save orchestrator
//! - **Reconcile**: level planning and the transactional engine
//! - **Database**: the persistence port and its `SQLite` implementation
//! - **Services**: recipe list stream, JSON import/export, cooking progress
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use recipe_book::database::{repositories::SqliteRecipeStore, Database};
//! use recipe_book::editor::{EditSession, FieldChange, RecipeField};
//! use recipe_book::errors::AppResult;
//! use recipe_book::models::EditLevel;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let store = Arc::new(SqliteRecipeStore::new(Database::new_in_memory().await?));
//!     let mut session = EditSession::open(store, None).await?;
//!
//!     session.update_field(FieldChange::Recipe(RecipeField::Name("Focaccia".into())))?;
//!     session.update_field(FieldChange::Recipe(RecipeField::Category("Bread".into())))?;
//!     session.save(EditLevel::Recipe).await?;
//!     Ok(())
//! }
//! ```

/// Configuration loaded from environment variables
pub mod config;

/// Application constants
pub mod constants;

/// `SQLite` storage and the persistence port
pub mod database;

/// Drafts, field changes, and the save orchestrator
pub mod editor;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Recipe entity tree
pub mod models;

/// Reconciliation of drafted trees against storage
pub mod reconcile;

/// Read-path and interchange services
pub mod services;
