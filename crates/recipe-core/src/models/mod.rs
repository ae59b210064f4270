// ABOUTME: Core data models for the Recipe Book editor
// ABOUTME: Recipe aggregate tree, entity identifiers, edit levels, and list summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

mod level;
mod recipe;

pub use level::EditLevel;
pub use recipe::{Chapter, EntityId, Ingredient, Recipe, RecipeSummary, Step};
