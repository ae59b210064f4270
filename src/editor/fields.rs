// ABOUTME: Typed field changes and required-field rules for each recipe tree level
// ABOUTME: Rejects out-of-range values locally instead of raising errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::models::{Chapter, EditLevel, EntityId, Ingredient, Recipe, Step};
use std::fmt::Debug;

/// Field change on the recipe information form
#[derive(Debug, Clone, PartialEq)]
pub enum RecipeField {
    /// Display name
    Name(String),
    /// Category
    Category(String),
    /// Sub-category
    SubCategory(String),
    /// Servings count, at least 1
    Servings(u32),
    /// Free text
    Note(String),
}

/// Field change on the chapter form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterField {
    /// Display name
    Name(String),
    /// Free text
    Note(String),
}

/// Field change on the step form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepField {
    /// What to do
    Description(String),
    /// Timer in minutes; `Some(0)` clears the timer
    TimerMinutes(Option<u32>),
    /// Free text
    Note(String),
}

/// Field change on the ingredient form
#[derive(Debug, Clone, PartialEq)]
pub enum IngredientField {
    /// Name
    Name(String),
    /// Non-negative quantity, 0 for none
    Quantity(f64),
    /// Unit label
    Unit(String),
}

/// Field change addressed to one level of an edit session
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    /// Recipe information change
    Recipe(RecipeField),
    /// Open chapter change
    Chapter(ChapterField),
    /// Open step change
    Step(StepField),
    /// Open ingredient change
    Ingredient(IngredientField),
}

impl FieldChange {
    /// Level the change applies to
    #[must_use]
    pub const fn level(&self) -> EditLevel {
        match self {
            Self::Recipe(_) => EditLevel::Recipe,
            Self::Chapter(_) => EditLevel::Chapter,
            Self::Step(_) => EditLevel::Step,
            Self::Ingredient(_) => EditLevel::Ingredient,
        }
    }
}

/// An entity that can be edited through a draft
pub trait Editable: Clone + Debug + Send + Sync + 'static {
    /// Field change type for this level
    type Field: Debug;

    /// Level of this entity
    const LEVEL: EditLevel;

    /// Storage identifier
    fn entity_id(&self) -> EntityId;

    /// Apply a change, returning `false` if the value was rejected
    fn apply(&mut self, change: Self::Field) -> bool;

    /// First required own field that is empty or out of range
    fn missing_field(&self) -> Option<&'static str>;

    /// Number of drafted children
    fn child_count(&self) -> usize {
        0
    }

    /// Whether a draft of this entity may be saved
    fn is_complete(&self) -> bool {
        self.missing_field().is_none()
    }
}

/// An editable entity with an ordered child list
pub trait Parent: Editable {
    /// Child entity type
    type Child: Editable;

    /// Drafted children in order
    fn children(&self) -> &[Self::Child];

    /// Mutable drafted children
    fn children_mut(&mut self) -> &mut Vec<Self::Child>;
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl Editable for Recipe {
    type Field = RecipeField;
    const LEVEL: EditLevel = EditLevel::Recipe;

    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, change: RecipeField) -> bool {
        match change {
            RecipeField::Name(name) => self.name = name,
            RecipeField::Category(category) => self.category = category,
            RecipeField::SubCategory(sub_category) => self.sub_category = sub_category,
            RecipeField::Servings(0) => return false,
            RecipeField::Servings(servings) => self.servings = servings,
            RecipeField::Note(note) => self.note = note,
        }
        true
    }

    fn missing_field(&self) -> Option<&'static str> {
        if is_blank(&self.name) {
            Some("name")
        } else if is_blank(&self.category) {
            Some("category")
        } else if self.servings == 0 {
            Some("servings")
        } else {
            None
        }
    }

    fn child_count(&self) -> usize {
        self.chapters.len()
    }

    fn is_complete(&self) -> bool {
        tree_problem(self).is_none()
    }
}

impl Parent for Recipe {
    type Child = Chapter;

    fn children(&self) -> &[Chapter] {
        &self.chapters
    }

    fn children_mut(&mut self) -> &mut Vec<Chapter> {
        &mut self.chapters
    }
}

impl Editable for Chapter {
    type Field = ChapterField;
    const LEVEL: EditLevel = EditLevel::Chapter;

    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, change: ChapterField) -> bool {
        match change {
            ChapterField::Name(name) => self.name = name,
            ChapterField::Note(note) => self.note = note,
        }
        true
    }

    fn missing_field(&self) -> Option<&'static str> {
        None
    }

    fn child_count(&self) -> usize {
        self.steps.len()
    }
}

impl Parent for Chapter {
    type Child = Step;

    fn children(&self) -> &[Step] {
        &self.steps
    }

    fn children_mut(&mut self) -> &mut Vec<Step> {
        &mut self.steps
    }
}

impl Editable for Step {
    type Field = StepField;
    const LEVEL: EditLevel = EditLevel::Step;

    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, change: StepField) -> bool {
        match change {
            StepField::Description(description) => self.description = description,
            StepField::TimerMinutes(minutes) => {
                self.timer_minutes = minutes.filter(|m| *m > 0);
            }
            StepField::Note(note) => self.note = note,
        }
        true
    }

    fn missing_field(&self) -> Option<&'static str> {
        is_blank(&self.description).then_some("description")
    }

    fn child_count(&self) -> usize {
        self.ingredients.len()
    }
}

impl Parent for Step {
    type Child = Ingredient;

    fn children(&self) -> &[Ingredient] {
        &self.ingredients
    }

    fn children_mut(&mut self) -> &mut Vec<Ingredient> {
        &mut self.ingredients
    }
}

impl Editable for Ingredient {
    type Field = IngredientField;
    const LEVEL: EditLevel = EditLevel::Ingredient;

    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, change: IngredientField) -> bool {
        match change {
            IngredientField::Name(name) => self.name = name,
            IngredientField::Quantity(quantity) if quantity.is_finite() && quantity >= 0.0 => {
                self.quantity = quantity;
            }
            IngredientField::Quantity(_) => return false,
            IngredientField::Unit(unit) => self.unit = unit,
        }
        true
    }

    fn missing_field(&self) -> Option<&'static str> {
        if is_blank(&self.name) {
            Some("name")
        } else if !self.quantity.is_finite() || self.quantity < 0.0 {
            Some("quantity")
        } else {
            None
        }
    }
}

/// First reason the whole tree cannot be persisted, if any
///
/// Covers every level's required fields plus the rule that each chapter
/// holds at least one step.
#[must_use]
pub fn tree_problem(recipe: &Recipe) -> Option<String> {
    if let Some(field) = recipe.missing_field() {
        return Some(format!("recipe {field} is required"));
    }

    for (chapter_index, chapter) in recipe.chapters.iter().enumerate() {
        let chapter_no = chapter_index + 1;
        if chapter.steps.is_empty() {
            return Some(format!("chapter {chapter_no} has no steps"));
        }
        for (step_index, step) in chapter.steps.iter().enumerate() {
            let step_no = step_index + 1;
            if let Some(field) = step.missing_field() {
                return Some(format!("chapter {chapter_no} step {step_no}: {field} is required"));
            }
            for (ingredient_index, ingredient) in step.ingredients.iter().enumerate() {
                if let Some(field) = ingredient.missing_field() {
                    return Some(format!(
                        "chapter {chapter_no} step {step_no} ingredient {}: {field} is invalid",
                        ingredient_index + 1
                    ));
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_and_nan_quantities_are_rejected() {
        let mut ingredient = Ingredient {
            name: "flour".into(),
            quantity: 200.0,
            ..Ingredient::default()
        };

        assert!(!ingredient.apply(IngredientField::Quantity(-1.0)));
        assert!(!ingredient.apply(IngredientField::Quantity(f64::NAN)));
        assert!((ingredient.quantity - 200.0).abs() < f64::EPSILON);
        assert!(ingredient.apply(IngredientField::Quantity(0.0)));
    }

    #[test]
    fn test_zero_servings_rejected() {
        let mut recipe = Recipe::default();
        assert!(!recipe.apply(RecipeField::Servings(0)));
        assert_eq!(recipe.servings, 1);
    }

    #[test]
    fn test_zero_timer_clears_timer() {
        let mut step = Step {
            timer_minutes: Some(5),
            ..Step::default()
        };
        assert!(step.apply(StepField::TimerMinutes(Some(0))));
        assert_eq!(step.timer_minutes, None);
    }

    #[test]
    fn test_tree_problem_flags_empty_chapter() {
        let recipe = Recipe {
            name: "Bread".into(),
            category: "Baking".into(),
            chapters: vec![Chapter::default()],
            ..Recipe::default()
        };

        assert_eq!(tree_problem(&recipe).as_deref(), Some("chapter 1 has no steps"));
        assert!(!recipe.is_complete());
        assert_eq!(recipe.missing_field(), None);
    }
}
