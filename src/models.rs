// ABOUTME: Re-export of the recipe entity tree from recipe-core
// ABOUTME: Recipe, Chapter, Step, Ingredient, identifiers, and edit levels
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use recipe_core::models::*;
