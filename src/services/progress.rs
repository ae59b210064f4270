// ABOUTME: In-memory cooking progress over the steps of a recipe
// ABOUTME: Tracks checked steps in reading order and reports completion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::models::Recipe;
use serde::Serialize;

/// Checked state of every step of a recipe, in reading order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookingProgress {
    checked: Vec<bool>,
}

impl CookingProgress {
    /// Progress with no step checked
    #[must_use]
    pub fn new(recipe: &Recipe) -> Self {
        Self {
            checked: vec![false; recipe.steps().count()],
        }
    }

    /// Toggle the step at `index`, returning its new state
    ///
    /// Out-of-range indices are ignored and report `false`.
    pub fn toggle(&mut self, index: usize) -> bool {
        self.checked.get_mut(index).is_some_and(|checked| {
            *checked = !*checked;
            *checked
        })
    }

    /// Whether the step at `index` is checked
    #[must_use]
    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    /// Number of checked steps
    #[must_use]
    pub fn checked_count(&self) -> usize {
        self.checked.iter().filter(|c| **c).count()
    }

    /// Number of steps
    #[must_use]
    pub fn total(&self) -> usize {
        self.checked.len()
    }

    /// Share of checked steps between 0 and 1; a recipe without steps is complete
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_ratio(&self) -> f64 {
        if self.checked.is_empty() {
            return 1.0;
        }
        self.checked_count() as f64 / self.checked.len() as f64
    }

    /// First unchecked step
    #[must_use]
    pub fn next_unchecked(&self) -> Option<usize> {
        self.checked.iter().position(|c| !c)
    }

    /// Uncheck everything
    pub fn reset(&mut self) {
        self.checked.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chapter, Step};

    fn recipe_with_steps(count: usize) -> Recipe {
        Recipe {
            chapters: vec![Chapter {
                steps: (0..count)
                    .map(|i| Step {
                        description: format!("step {i}"),
                        ..Step::default()
                    })
                    .collect(),
                ..Chapter::default()
            }],
            ..Recipe::default()
        }
    }

    #[test]
    fn test_toggle_and_next_unchecked() {
        let mut progress = CookingProgress::new(&recipe_with_steps(3));

        assert!(progress.toggle(0));
        assert!(progress.toggle(2));
        assert_eq!(progress.next_unchecked(), Some(1));
        assert!(!progress.toggle(2));
        assert!(!progress.toggle(9));
        assert_eq!(progress.checked_count(), 1);
    }

    #[test]
    fn test_completion_ratio() {
        let mut progress = CookingProgress::new(&recipe_with_steps(4));
        progress.toggle(1);
        assert!((progress.completion_ratio() - 0.25).abs() < f64::EPSILON);

        progress.reset();
        assert_eq!(progress.checked_count(), 0);
        assert!((CookingProgress::new(&Recipe::default()).completion_ratio() - 1.0).abs() < f64::EPSILON);
    }
}
