// ABOUTME: SQLite implementation of the recipe persistence port
// ABOUTME: Wraps each save in one guarded transaction and publishes change notifications
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{
    AssignedIds, LevelBatch, RecipeChange, RecipeRow, ReconcileTransaction, RecipeStore,
};
use crate::constants::database::CHANGE_CHANNEL_CAPACITY;
use crate::database::recipes::{delete_children, upsert_child, upsert_recipe};
use crate::database::transactions::SqliteTransactionGuard;
use crate::database::{Database, DatabaseError, RecipeManager};
use crate::logging::AppLogger;
use crate::models::{EditLevel, EntityId, Recipe, RecipeSummary};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::debug;

/// `SQLite`-backed recipe store
#[derive(Clone)]
pub struct SqliteRecipeStore {
    db: Database,
    changes: broadcast::Sender<RecipeChange>,
}

impl SqliteRecipeStore {
    /// Create a store over an opened, migrated database
    #[must_use]
    pub fn new(db: Database) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { db, changes }
    }

    /// Underlying database handle
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    fn manager(&self) -> RecipeManager {
        RecipeManager::new(self.db.pool().clone())
    }
}

#[async_trait]
impl RecipeStore for SqliteRecipeStore {
    async fn load_full_tree(&self, recipe_id: i64) -> Result<Option<Recipe>, DatabaseError> {
        self.manager().load_full_tree(recipe_id).await
    }

    async fn begin(&self) -> Result<Box<dyn ReconcileTransaction>, DatabaseError> {
        let tx = self.db.pool().begin().await.map_err(|e| {
            DatabaseError::transaction(format!("Failed to begin transaction: {e}"))
        })?;

        Ok(Box::new(SqliteReconcileTransaction {
            guard: Some(SqliteTransactionGuard::new(tx)),
            changes: self.changes.clone(),
            recipe_id: None,
        }))
    }

    async fn delete_recipe(&self, recipe_id: i64) -> Result<bool, DatabaseError> {
        let start = Instant::now();
        let deleted = self.manager().delete_recipe(recipe_id).await?;
        AppLogger::log_database_operation(
            "delete",
            "recipes",
            deleted,
            u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        );
        if deleted {
            // No subscribers is fine
            let _ = self.changes.send(RecipeChange::Deleted { recipe_id });
        }
        Ok(deleted)
    }

    async fn list_recipes(&self) -> Result<Vec<RecipeSummary>, DatabaseError> {
        self.manager().list_recipes().await
    }

    async fn search_recipes(&self, query: &str) -> Result<Vec<RecipeSummary>, DatabaseError> {
        self.manager().search_recipes(query).await
    }

    async fn list_categories(&self) -> Result<Vec<String>, DatabaseError> {
        self.manager().list_categories().await
    }

    fn subscribe(&self) -> broadcast::Receiver<RecipeChange> {
        self.changes.subscribe()
    }
}

/// One save against `SQLite`; rolled back when dropped uncommitted
pub struct SqliteReconcileTransaction {
    guard: Option<SqliteTransactionGuard<'static>>,
    changes: broadcast::Sender<RecipeChange>,
    recipe_id: Option<i64>,
}

impl SqliteReconcileTransaction {
    fn guard(&mut self) -> Result<&mut SqliteTransactionGuard<'static>, DatabaseError> {
        self.guard
            .as_mut()
            .ok_or_else(|| DatabaseError::transaction("Transaction already committed"))
    }
}

fn check_batch(batch: &LevelBatch) -> Result<(), DatabaseError> {
    if batch.level == EditLevel::Recipe {
        return Err(DatabaseError::InvalidData {
            field: "level".to_owned(),
            reason: "a batch holds children, not recipes".to_owned(),
        });
    }

    if let Some(upsert) = batch.upserts.iter().find(|u| u.row.level() != batch.level) {
        return Err(DatabaseError::InvalidData {
            field: "row".to_owned(),
            reason: format!(
                "{} row in a {} batch",
                upsert.row.level(),
                batch.level
            ),
        });
    }

    Ok(())
}

#[async_trait]
impl ReconcileTransaction for SqliteReconcileTransaction {
    async fn upsert_recipe(&mut self, id: EntityId, row: &RecipeRow) -> Result<i64, DatabaseError> {
        let conn = self.guard()?.executor()?;
        let recipe_id = upsert_recipe(conn, id, row, Utc::now()).await?;
        self.recipe_id = Some(recipe_id);
        Ok(recipe_id)
    }

    async fn reconcile(&mut self, batch: &LevelBatch) -> Result<AssignedIds, DatabaseError> {
        check_batch(batch)?;
        let start = Instant::now();
        let conn = self.guard()?.executor()?;

        let removed = delete_children(conn, batch.level, batch.parent_id, &batch.deletions).await?;

        let mut assigned = AssignedIds::new();
        for upsert in &batch.upserts {
            let id = upsert_child(conn, batch.parent_id, upsert).await?;
            if upsert.id.is_new() {
                assigned.insert(upsert.temp_id, id);
            }
        }

        debug!(
            level = %batch.level,
            parent_id = batch.parent_id,
            deleted = removed,
            upserted = batch.upserts.len(),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Level reconciled"
        );
        Ok(assigned)
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        let guard = self
            .guard
            .take()
            .ok_or_else(|| DatabaseError::transaction("Transaction already committed"))?;
        guard.commit().await?;

        if let Some(recipe_id) = self.recipe_id {
            let _ = self.changes.send(RecipeChange::Saved { recipe_id });
        }
        Ok(())
    }
}
