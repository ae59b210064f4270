// ABOUTME: Multi-level recipe editor: drafts, field changes, save orchestration, navigation
// ABOUTME: Edits stay in memory until the recipe level is saved
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Recipe Editor
//!
//! Each level of the tree is edited through a [`Draft`]. An [`EditSession`]
//! stacks the open drafts (recipe, then chapter, step, ingredient), folds a
//! saved sub-editor back into its parent draft, and commits the whole tree
//! through the reconciliation engine when the recipe itself is saved.

/// Draft state holder
pub mod draft;
/// Typed field changes and required-field rules
pub mod fields;
/// Navigation requests for the UI router
pub mod navigation;
/// Save orchestrator
pub mod session;

pub use draft::{Draft, DraftStatus, SavePhase};
pub use fields::{
    ChapterField, Editable, FieldChange, IngredientField, Parent, RecipeField, StepField,
};
pub use navigation::NavigationRequest;
pub use session::{EditSession, SaveOutcome};
