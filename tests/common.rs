// ABOUTME: Shared test utilities and fixtures for recipe book integration tests
// ABOUTME: In-memory store setup, fixture trees, and recording/failing store wrappers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `recipe_book`

use async_trait::async_trait;
use recipe_book::database::repositories::{
    AssignedIds, LevelBatch, RecipeChange, RecipeRow, ReconcileTransaction, RecipeStore,
    SqliteRecipeStore,
};
use recipe_book::database::{Database, DatabaseError};
use recipe_book::models::{
    Chapter, EditLevel, EntityId, Ingredient, Recipe, RecipeSummary, Step,
};
use recipe_book::reconcile::{ReconcileOutcome, ReconciliationEngine};
use sqlx::Row;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tokio::sync::broadcast;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Fresh in-memory store with the schema applied
pub async fn create_test_store() -> Arc<SqliteRecipeStore> {
    init_test_logging();
    let db = Database::new_in_memory()
        .await
        .expect("Failed to create in-memory database");
    Arc::new(SqliteRecipeStore::new(db))
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn ingredient(name: &str, quantity: f64, unit: &str) -> Ingredient {
    Ingredient {
        name: name.to_owned(),
        quantity,
        unit: unit.to_owned(),
        ..Ingredient::default()
    }
}

pub fn step(description: &str, ingredients: Vec<Ingredient>) -> Step {
    Step {
        description: description.to_owned(),
        ingredients,
        ..Step::default()
    }
}

pub fn chapter(name: &str, steps: Vec<Step>) -> Chapter {
    Chapter {
        name: name.to_owned(),
        steps,
        ..Chapter::default()
    }
}

pub fn recipe(name: &str, category: &str, chapters: Vec<Chapter>) -> Recipe {
    Recipe {
        name: name.to_owned(),
        category: category.to_owned(),
        chapters,
        ..Recipe::default()
    }
}

/// New recipe with 2 chapters, each with 1 step holding 1 ingredient
pub fn two_chapter_recipe() -> Recipe {
    recipe(
        "Pancakes",
        "Breakfast",
        vec![
            chapter(
                "Batter",
                vec![step("Whisk eggs and milk", vec![ingredient("milk", 250.0, "ml")])],
            ),
            chapter(
                "Frying",
                vec![step("Fry in butter", vec![ingredient("butter", 20.0, "g")])],
            ),
        ],
    )
}

/// New recipe with one chapter holding the given steps
pub fn single_chapter_recipe(step_names: &[&str]) -> Recipe {
    recipe(
        "Soup",
        "Dinner",
        vec![chapter(
            "Cooking",
            step_names.iter().map(|name| step(name, Vec::new())).collect(),
        )],
    )
}

/// Save a tree through the engine with no persisted snapshot
pub async fn save_new(store: &dyn RecipeStore, recipe: &Recipe) -> ReconcileOutcome {
    ReconciliationEngine::save_tree(store, recipe, None)
        .await
        .expect("Failed to save fixture recipe")
}

/// Load a stored tree, failing the test if it is missing
pub async fn load(store: &dyn RecipeStore, recipe_id: i64) -> Recipe {
    store
        .load_full_tree(recipe_id)
        .await
        .expect("Failed to load recipe")
        .expect("Recipe missing")
}

/// Row count of a table
pub async fn count_rows(store: &SqliteRecipeStore, table: &str) -> i64 {
    sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
        .fetch_one(store.database().pool())
        .await
        .expect("Failed to count rows")
        .get("n")
}

/// `(description, order_number)` of every step of a chapter as stored
pub async fn stored_steps(store: &SqliteRecipeStore, chapter_id: i64) -> Vec<(String, i64)> {
    sqlx::query(
        "SELECT description, order_number FROM steps WHERE chapter_id = $1 ORDER BY order_number",
    )
    .bind(chapter_id)
    .fetch_all(store.database().pool())
    .await
    .expect("Failed to read steps")
    .iter()
    .map(|row| (row.get("description"), row.get("order_number")))
    .collect()
}

pub fn persisted_id(id: EntityId) -> i64 {
    id.persisted().expect("entity has no persisted id")
}

// ============================================================================
// Recording store
// ============================================================================

/// One call made on a recorded transaction
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    UpsertRecipe { id: EntityId, assigned: i64 },
    Reconcile { batch: LevelBatch, assigned: AssignedIds },
    Commit,
}

/// Store wrapper recording every transactional call
#[derive(Clone)]
pub struct RecordingStore {
    inner: Arc<dyn RecipeStore>,
    ops: Arc<Mutex<Vec<RecordedOp>>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<dyn RecipeStore>) -> Self {
        Self {
            inner,
            ops: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ops(&self) -> Vec<RecordedOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// Every child upsert batch, in call order
    pub fn batches(&self) -> Vec<LevelBatch> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Reconcile { batch, .. } => Some(batch),
                _ => None,
            })
            .collect()
    }

    /// Total upserts, recipe rows included
    pub fn upsert_count(&self) -> usize {
        self.ops()
            .iter()
            .map(|op| match op {
                RecordedOp::UpsertRecipe { .. } => 1,
                RecordedOp::Reconcile { batch, .. } => batch.upserts.len(),
                RecordedOp::Commit => 0,
            })
            .sum()
    }

    pub fn delete_count(&self) -> usize {
        self.batches().iter().map(|b| b.deletions.len()).sum()
    }
}

struct RecordingTransaction {
    inner: Box<dyn ReconcileTransaction>,
    ops: Arc<Mutex<Vec<RecordedOp>>>,
}

#[async_trait]
impl ReconcileTransaction for RecordingTransaction {
    async fn upsert_recipe(&mut self, id: EntityId, row: &RecipeRow) -> Result<i64, DatabaseError> {
        let assigned = self.inner.upsert_recipe(id, row).await?;
        self.ops
            .lock()
            .unwrap()
            .push(RecordedOp::UpsertRecipe { id, assigned });
        Ok(assigned)
    }

    async fn reconcile(&mut self, batch: &LevelBatch) -> Result<AssignedIds, DatabaseError> {
        let assigned = self.inner.reconcile(batch).await?;
        self.ops.lock().unwrap().push(RecordedOp::Reconcile {
            batch: batch.clone(),
            assigned: assigned.clone(),
        });
        Ok(assigned)
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.inner.commit().await?;
        self.ops.lock().unwrap().push(RecordedOp::Commit);
        Ok(())
    }
}

#[async_trait]
impl RecipeStore for RecordingStore {
    async fn load_full_tree(&self, recipe_id: i64) -> Result<Option<Recipe>, DatabaseError> {
        self.inner.load_full_tree(recipe_id).await
    }

    async fn begin(&self) -> Result<Box<dyn ReconcileTransaction>, DatabaseError> {
        Ok(Box::new(RecordingTransaction {
            inner: self.inner.begin().await?,
            ops: Arc::clone(&self.ops),
        }))
    }

    async fn delete_recipe(&self, recipe_id: i64) -> Result<bool, DatabaseError> {
        self.inner.delete_recipe(recipe_id).await
    }

    async fn list_recipes(&self) -> Result<Vec<RecipeSummary>, DatabaseError> {
        self.inner.list_recipes().await
    }

    async fn search_recipes(&self, query: &str) -> Result<Vec<RecipeSummary>, DatabaseError> {
        self.inner.search_recipes(query).await
    }

    async fn list_categories(&self) -> Result<Vec<String>, DatabaseError> {
        self.inner.list_categories().await
    }

    fn subscribe(&self) -> broadcast::Receiver<RecipeChange> {
        self.inner.subscribe()
    }
}

// ============================================================================
// Failing store
// ============================================================================

/// Store wrapper that fails a chosen upsert inside the transaction
///
/// The batch containing the failing upsert is forwarded up to (not including)
/// that upsert, so earlier writes really happen before the error.
#[derive(Clone)]
pub struct FailingStore {
    inner: Arc<dyn RecipeStore>,
    level: EditLevel,
    upsert_index: usize,
    message: &'static str,
    remaining_failures: Arc<AtomicUsize>,
}

impl FailingStore {
    /// Fail the `upsert_index`-th upsert of the first batch at `level`, `failures` times
    pub fn new(
        inner: Arc<dyn RecipeStore>,
        level: EditLevel,
        upsert_index: usize,
        failures: usize,
    ) -> Self {
        Self {
            inner,
            level,
            upsert_index,
            message: "CHECK constraint failed: injected failure",
            remaining_failures: Arc::new(AtomicUsize::new(failures)),
        }
    }

    /// Use a transient error message instead of a constraint violation
    pub const fn transient(mut self) -> Self {
        self.message = "database is locked";
        self
    }

    pub fn remaining_failures(&self) -> usize {
        self.remaining_failures.load(Ordering::SeqCst)
    }
}

struct FailingTransaction {
    inner: Box<dyn ReconcileTransaction>,
    level: EditLevel,
    upsert_index: usize,
    message: &'static str,
    remaining_failures: Arc<AtomicUsize>,
}

#[async_trait]
impl ReconcileTransaction for FailingTransaction {
    async fn upsert_recipe(&mut self, id: EntityId, row: &RecipeRow) -> Result<i64, DatabaseError> {
        self.inner.upsert_recipe(id, row).await
    }

    async fn reconcile(&mut self, batch: &LevelBatch) -> Result<AssignedIds, DatabaseError> {
        let armed = batch.level == self.level
            && batch.upserts.len() > self.upsert_index
            && self.remaining_failures.load(Ordering::SeqCst) > 0;
        if !armed {
            return self.inner.reconcile(batch).await;
        }

        self.remaining_failures.fetch_sub(1, Ordering::SeqCst);
        let mut partial = batch.clone();
        partial.upserts.truncate(self.upsert_index);
        self.inner.reconcile(&partial).await?;
        Err(DatabaseError::query(self.message))
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.inner.commit().await
    }
}

#[async_trait]
impl RecipeStore for FailingStore {
    async fn load_full_tree(&self, recipe_id: i64) -> Result<Option<Recipe>, DatabaseError> {
        self.inner.load_full_tree(recipe_id).await
    }

    async fn begin(&self) -> Result<Box<dyn ReconcileTransaction>, DatabaseError> {
        Ok(Box::new(FailingTransaction {
            inner: self.inner.begin().await?,
            level: self.level,
            upsert_index: self.upsert_index,
            message: self.message,
            remaining_failures: Arc::clone(&self.remaining_failures),
        }))
    }

    async fn delete_recipe(&self, recipe_id: i64) -> Result<bool, DatabaseError> {
        self.inner.delete_recipe(recipe_id).await
    }

    async fn list_recipes(&self) -> Result<Vec<RecipeSummary>, DatabaseError> {
        self.inner.list_recipes().await
    }

    async fn search_recipes(&self, query: &str) -> Result<Vec<RecipeSummary>, DatabaseError> {
        self.inner.search_recipes(query).await
    }

    async fn list_categories(&self) -> Result<Vec<String>, DatabaseError> {
        self.inner.list_categories().await
    }

    fn subscribe(&self) -> broadcast::Receiver<RecipeChange> {
        self.inner.subscribe()
    }
}
