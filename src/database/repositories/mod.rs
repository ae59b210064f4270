// ABOUTME: Persistence port for the recipe editor: store and reconciliation transaction traits
// ABOUTME: Defines the batch types the reconciliation engine sends to storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Persistence Port
//!
//! The editor core never writes SQL. It reads whole trees through
//! [`RecipeStore`] and writes through a [`ReconcileTransaction`], one level
//! batch at a time, inside a single transaction per save.

/// `SQLite` implementation of the persistence port
pub mod recipe_repository;

pub use recipe_repository::{SqliteReconcileTransaction, SqliteRecipeStore};

use crate::database::DatabaseError;
use crate::models::{EditLevel, EntityId, Recipe, RecipeSummary};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Position of an upsert inside its batch, used to report assigned keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(pub usize);

/// Keys assigned to the new entities of one batch
pub type AssignedIds = HashMap<TempId, i64>;

/// Own fields of a recipe row
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRow {
    /// Display name
    pub name: String,
    /// Category
    pub category: String,
    /// Sub-category
    pub sub_category: String,
    /// Servings count
    pub servings: u32,
    /// Free text
    pub note: String,
}

impl From<&Recipe> for RecipeRow {
    fn from(recipe: &Recipe) -> Self {
        Self {
            name: recipe.name.clone(),
            category: recipe.category.clone(),
            sub_category: recipe.sub_category.clone(),
            servings: recipe.servings,
            note: recipe.note.clone(),
        }
    }
}

/// Own fields of a child row, without its children
#[derive(Debug, Clone, PartialEq)]
pub enum ChildRow {
    /// Chapter fields
    Chapter {
        /// Display name
        name: String,
        /// Free text
        note: String,
    },
    /// Step fields
    Step {
        /// What to do
        description: String,
        /// Optional timer
        timer_minutes: Option<u32>,
        /// Free text
        note: String,
    },
    /// Ingredient fields
    Ingredient {
        /// Name
        name: String,
        /// Quantity, 0 for none
        quantity: f64,
        /// Unit label
        unit: String,
    },
}

impl ChildRow {
    /// Level this row belongs to
    #[must_use]
    pub const fn level(&self) -> EditLevel {
        match self {
            Self::Chapter { .. } => EditLevel::Chapter,
            Self::Step { .. } => EditLevel::Step,
            Self::Ingredient { .. } => EditLevel::Ingredient,
        }
    }
}

/// Insert-or-update of one child with its freshly computed order number
#[derive(Debug, Clone, PartialEq)]
pub struct ChildUpsert {
    /// Position in the batch, key of the assigned id for new rows
    pub temp_id: TempId,
    /// Existing key, or `New` to insert
    pub id: EntityId,
    /// 1-based order number within the parent
    pub order_number: u32,
    /// Own fields
    pub row: ChildRow,
}

/// All operations for the children of one parent at one level
///
/// Storage applies every deletion before any upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelBatch {
    /// Level of the children
    pub level: EditLevel,
    /// Persisted key of the parent, never a sentinel
    pub parent_id: i64,
    /// Keys of children to delete (with their descendants)
    pub deletions: Vec<i64>,
    /// Children to write, in draft order
    pub upserts: Vec<ChildUpsert>,
}

impl LevelBatch {
    /// Number of upserts that will insert a new row
    #[must_use]
    pub fn insert_count(&self) -> usize {
        self.upserts.iter().filter(|u| u.id.is_new()).count()
    }
}

/// Notification sent after a committed change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeChange {
    /// A recipe tree was saved
    Saved {
        /// Key of the saved recipe
        recipe_id: i64,
    },
    /// A recipe and its descendants were deleted
    Deleted {
        /// Key of the deleted recipe
        recipe_id: i64,
    },
}

/// Write side of one save: every call runs inside the same transaction
///
/// Dropping the transaction without calling [`ReconcileTransaction::commit`]
/// rolls back every operation it performed.
#[async_trait]
pub trait ReconcileTransaction: Send {
    /// Insert or update the recipe row, returning its key
    async fn upsert_recipe(&mut self, id: EntityId, row: &RecipeRow) -> Result<i64, DatabaseError>;

    /// Apply the deletions, then the upserts, of one level batch
    ///
    /// Returns the key assigned to every `New` upsert, keyed by its `temp_id`.
    async fn reconcile(&mut self, batch: &LevelBatch) -> Result<AssignedIds, DatabaseError>;

    /// Make every operation durable
    async fn commit(&mut self) -> Result<(), DatabaseError>;
}

/// Read side and entry point of the persistence port
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Load a recipe with all chapters, steps, and ingredients in order
    async fn load_full_tree(&self, recipe_id: i64) -> Result<Option<Recipe>, DatabaseError>;

    /// Start the transaction for one save
    async fn begin(&self) -> Result<Box<dyn ReconcileTransaction>, DatabaseError>;

    /// Delete a recipe and every descendant, returning whether it existed
    async fn delete_recipe(&self, recipe_id: i64) -> Result<bool, DatabaseError>;

    /// All recipes ordered by category, then name
    async fn list_recipes(&self) -> Result<Vec<RecipeSummary>, DatabaseError>;

    /// Recipes whose name contains `query`, case-insensitively
    async fn search_recipes(&self, query: &str) -> Result<Vec<RecipeSummary>, DatabaseError>;

    /// Distinct categories in alphabetical order
    async fn list_categories(&self) -> Result<Vec<String>, DatabaseError>;

    /// Receive a notification after every committed change
    fn subscribe(&self) -> broadcast::Receiver<RecipeChange>;
}
