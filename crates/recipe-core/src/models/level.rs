// ABOUTME: Edit level enumeration for the four-level recipe hierarchy
// ABOUTME: Names each level and navigates parent/child relationships between them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt;

/// One level of the Recipe → Chapter → Step → Ingredient hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditLevel {
    /// Recipe information (aggregate root)
    Recipe,
    /// Chapter of a recipe
    Chapter,
    /// Preparation step of a chapter
    Step,
    /// Ingredient used by a step
    Ingredient,
}

impl EditLevel {
    /// All levels from the root downwards
    pub const ALL: [Self; 4] = [Self::Recipe, Self::Chapter, Self::Step, Self::Ingredient];

    /// Level owning this one, `None` for the root
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Recipe => None,
            Self::Chapter => Some(Self::Recipe),
            Self::Step => Some(Self::Chapter),
            Self::Ingredient => Some(Self::Step),
        }
    }

    /// Level owned by this one, `None` for leaves
    #[must_use]
    pub const fn child(self) -> Option<Self> {
        match self {
            Self::Recipe => Some(Self::Chapter),
            Self::Chapter => Some(Self::Step),
            Self::Step => Some(Self::Ingredient),
            Self::Ingredient => None,
        }
    }

    /// Stable lowercase name, also used as the storage table stem
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recipe => "recipe",
            Self::Chapter => "chapter",
            Self::Step => "step",
            Self::Ingredient => "ingredient",
        }
    }
}

impl fmt::Display for EditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_child_are_inverse() {
        for level in EditLevel::ALL {
            if let Some(child) = level.child() {
                assert_eq!(child.parent(), Some(level));
            }
        }
        assert_eq!(EditLevel::Recipe.parent(), None);
        assert_eq!(EditLevel::Ingredient.child(), None);
    }
}
