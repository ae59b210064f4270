// ABOUTME: Recipe aggregate tree: Recipe, Chapter, Step, and Ingredient entities
// ABOUTME: Identifiers are a tagged New/Persisted variant assigned by the store on first insert
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::defaults;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tree entity
///
/// Serialized as `null` for `New` and as the integer key for `Persisted`,
/// so a JSON tree without ids imports as entirely new entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum EntityId {
    /// Not yet written to storage
    #[default]
    New,
    /// Key assigned by storage
    Persisted(i64),
}

impl EntityId {
    /// Storage key, if any
    #[must_use]
    pub const fn persisted(self) -> Option<i64> {
        match self {
            Self::New => None,
            Self::Persisted(id) => Some(id),
        }
    }

    /// True for entities that were never written
    #[must_use]
    pub const fn is_new(self) -> bool {
        matches!(self, Self::New)
    }
}

impl From<Option<i64>> for EntityId {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Self::New, Self::Persisted)
    }
}

impl From<EntityId> for Option<i64> {
    fn from(value: EntityId) -> Self {
        value.persisted()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str("new"),
            Self::Persisted(id) => write!(f, "{id}"),
        }
    }
}

/// Aggregate root: a recipe with its ordered chapters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Storage identifier
    #[serde(default)]
    pub id: EntityId,
    /// Display name, required
    pub name: String,
    /// Category, required
    pub category: String,
    /// Optional finer grouping inside the category
    #[serde(default)]
    pub sub_category: String,
    /// Number of servings, at least 1
    pub servings: u32,
    /// Free text
    #[serde(default)]
    pub note: String,
    /// Ordered chapters
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Default for Recipe {
    fn default() -> Self {
        Self {
            id: EntityId::New,
            name: String::new(),
            category: String::new(),
            sub_category: String::new(),
            servings: defaults::SERVINGS,
            note: String::new(),
            chapters: Vec::new(),
        }
    }
}

impl Recipe {
    /// Reset every identifier in the tree to `New`
    pub fn clear_ids(&mut self) {
        self.id = EntityId::New;
        for chapter in &mut self.chapters {
            chapter.id = EntityId::New;
            for step in &mut chapter.steps {
                step.id = EntityId::New;
                for ingredient in &mut step.ingredients {
                    ingredient.id = EntityId::New;
                }
            }
        }
    }

    /// Iterate all steps in reading order
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.chapters.iter().flat_map(|chapter| chapter.steps.iter())
    }

    /// Number of entities in the tree, the recipe included
    #[must_use]
    pub fn entity_count(&self) -> usize {
        1 + self
            .chapters
            .iter()
            .map(|chapter| {
                1 + chapter
                    .steps
                    .iter()
                    .map(|step| 1 + step.ingredients.len())
                    .sum::<usize>()
            })
            .sum::<usize>()
    }
}

/// A named section of a recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Storage identifier
    #[serde(default)]
    pub id: EntityId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Free text
    #[serde(default)]
    pub note: String,
    /// 1-based position in the recipe, recomputed on every save
    #[serde(default)]
    pub order_number: u32,
    /// Ordered steps, at least one for the chapter to be complete
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One preparation step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Storage identifier
    #[serde(default)]
    pub id: EntityId,
    /// What to do, required
    pub description: String,
    /// Optional timer in minutes
    #[serde(default)]
    pub timer_minutes: Option<u32>,
    /// Free text
    #[serde(default)]
    pub note: String,
    /// 1-based position in the chapter, recomputed on every save
    #[serde(default)]
    pub order_number: u32,
    /// Ingredients used by this step
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

/// Ingredient used by a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Storage identifier
    #[serde(default)]
    pub id: EntityId,
    /// Name, required
    pub name: String,
    /// Quantity, 0 means "no quantity shown"
    #[serde(default)]
    pub quantity: f64,
    /// Unit label
    #[serde(default)]
    pub unit: String,
    /// 1-based position in the step, recomputed on every save
    #[serde(default)]
    pub order_number: u32,
}

/// Row shown on recipe list screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSummary {
    /// Storage identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Category
    pub category: String,
    /// Sub-category
    pub sub_category: String,
    /// Number of servings
    pub servings: u32,
    /// Number of chapters
    pub chapter_count: u32,
    /// Last save time
    pub updated_at: DateTime<Utc>,
}
