// ABOUTME: Navigation requests emitted by the edit session for the UI router
// ABOUTME: Signals which sub-editor to open and when a level is left
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::models::EditLevel;
use serde::Serialize;

/// Request for the UI to show another editor
///
/// An `index` equal to the parent's child count means "new item appended".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationRequest {
    /// Open the chapter editor
    EditChapter {
        /// Position in the recipe
        index: usize,
    },
    /// Open the step editor
    EditStep {
        /// Position in the open chapter
        index: usize,
    },
    /// Open the ingredient editor
    EditIngredient {
        /// Position in the open step
        index: usize,
    },
    /// Leave the editor of `level`
    Back {
        /// Level that was saved or closed
        level: EditLevel,
    },
}

impl NavigationRequest {
    /// Request to open the editor for `level` at `index`, `None` for the root
    #[must_use]
    pub const fn edit(level: EditLevel, index: usize) -> Option<Self> {
        match level {
            EditLevel::Recipe => None,
            EditLevel::Chapter => Some(Self::EditChapter { index }),
            EditLevel::Step => Some(Self::EditStep { index }),
            EditLevel::Ingredient => Some(Self::EditIngredient { index }),
        }
    }
}
