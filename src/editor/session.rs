// ABOUTME: Save orchestrator owning the recipe draft and its open sub-editors
// ABOUTME: Folds child saves into parent drafts and commits the tree through reconciliation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::draft::{Draft, DraftStatus, SavePhase};
use super::fields::{FieldChange, Parent};
use super::navigation::NavigationRequest;
use crate::constants::{database::NAVIGATION_CHANNEL_CAPACITY, defaults};
use crate::database::repositories::RecipeStore;
use crate::database::transactions::retry_transaction;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{Chapter, EditLevel, Ingredient, Recipe, Step};
use crate::reconcile::{ReconcileStats, ReconciliationEngine};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// What a successful save did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A sub-editor was folded into its parent draft; nothing was written
    Folded {
        /// Level that was saved
        level: EditLevel,
        /// Position of the child in the parent draft
        index: usize,
    },
    /// The recipe tree was committed to storage
    Committed {
        /// Key of the saved recipe
        recipe_id: i64,
        /// Operation counters
        stats: ReconcileStats,
    },
}

/// Editing session for one recipe
///
/// Holds the recipe draft and at most one open chapter, step, and ingredient
/// editor, each nested in the one above. Only the recipe level writes to
/// storage; saving a sub-editor folds it into its parent draft.
pub struct EditSession {
    store: Arc<dyn RecipeStore>,
    recipe: Draft<Recipe>,
    chapter: Option<Draft<Chapter>>,
    step: Option<Draft<Step>>,
    ingredient: Option<Draft<Ingredient>>,
    persisted: Option<Recipe>,
    max_retries: u32,
    navigation: broadcast::Sender<NavigationRequest>,
}

impl EditSession {
    /// Start a session on a brand-new recipe
    #[must_use]
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self::from_parts(store, Draft::new(None, 0), None)
    }

    /// Start a session on a stored recipe, or a new one when `recipe_id` is `None`
    ///
    /// A recipe that no longer exists opens as a new recipe.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored tree cannot be read
    pub async fn open(store: Arc<dyn RecipeStore>, recipe_id: Option<i64>) -> AppResult<Self> {
        let Some(recipe_id) = recipe_id else {
            return Ok(Self::new(store));
        };

        match store.load_full_tree(recipe_id).await? {
            Some(recipe) => {
                debug!(recipe.id = recipe_id, "Opened recipe for editing");
                Ok(Self::from_parts(
                    store,
                    Draft::new(Some(recipe.clone()), 0),
                    Some(recipe),
                ))
            }
            None => {
                warn!(recipe.id = recipe_id, "Recipe not found, editing a new recipe instead");
                Ok(Self::new(store))
            }
        }
    }

    /// Start a session on an externally supplied tree, saved as a new recipe
    #[must_use]
    pub fn import(store: Arc<dyn RecipeStore>, mut recipe: Recipe) -> Self {
        recipe.clear_ids();
        Self::from_parts(store, Draft::new(Some(recipe), 0), None)
    }

    fn from_parts(
        store: Arc<dyn RecipeStore>,
        recipe: Draft<Recipe>,
        persisted: Option<Recipe>,
    ) -> Self {
        let (navigation, _) = broadcast::channel(NAVIGATION_CHANNEL_CAPACITY);
        Self {
            store,
            recipe,
            chapter: None,
            step: None,
            ingredient: None,
            persisted,
            max_retries: defaults::SAVE_MAX_RETRIES,
            navigation,
        }
    }

    /// Attempts for a recipe save that hits a transient storage error
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Recipe draft
    #[must_use]
    pub const fn recipe(&self) -> &Draft<Recipe> {
        &self.recipe
    }

    /// Open chapter editor
    #[must_use]
    pub const fn chapter(&self) -> Option<&Draft<Chapter>> {
        self.chapter.as_ref()
    }

    /// Open step editor
    #[must_use]
    pub const fn step(&self) -> Option<&Draft<Step>> {
        self.step.as_ref()
    }

    /// Open ingredient editor
    #[must_use]
    pub const fn ingredient(&self) -> Option<&Draft<Ingredient>> {
        self.ingredient.as_ref()
    }

    /// Tree as of the last successful load or save
    #[must_use]
    pub const fn persisted(&self) -> Option<&Recipe> {
        self.persisted.as_ref()
    }

    /// Receive navigation requests
    #[must_use]
    pub fn subscribe_navigation(&self) -> broadcast::Receiver<NavigationRequest> {
        self.navigation.subscribe()
    }

    /// Status of the editor at `level`, `None` if it is not open
    #[must_use]
    pub fn status(&self, level: EditLevel) -> Option<DraftStatus> {
        match level {
            EditLevel::Recipe => Some(self.recipe.status()),
            EditLevel::Chapter => self.chapter.as_ref().map(Draft::status),
            EditLevel::Step => self.step.as_ref().map(Draft::status),
            EditLevel::Ingredient => self.ingredient.as_ref().map(Draft::status),
        }
    }

    /// Whether an editor is open at `level`
    #[must_use]
    pub fn is_open(&self, level: EditLevel) -> bool {
        self.status(level).is_some()
    }

    /// Deepest open editor
    #[must_use]
    pub fn deepest_level(&self) -> EditLevel {
        EditLevel::ALL
            .into_iter()
            .rev()
            .find(|level| self.is_open(*level))
            .unwrap_or(EditLevel::Recipe)
    }

    /// Apply a field change to the editor it addresses
    ///
    /// Returns `Ok(false)` when the value was rejected and the field kept.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if no editor is open at that level
    pub fn update_field(&mut self, change: FieldChange) -> AppResult<bool> {
        let level = change.level();
        let applied = match change {
            FieldChange::Recipe(field) => Some(self.recipe.update_field(field)),
            FieldChange::Chapter(field) => self.chapter.as_mut().map(|d| d.update_field(field)),
            FieldChange::Step(field) => self.step.as_mut().map(|d| d.update_field(field)),
            FieldChange::Ingredient(field) => {
                self.ingredient.as_mut().map(|d| d.update_field(field))
            }
        };
        applied.ok_or_else(|| not_open(level))
    }

    /// Open the chapter editor on the chapter at `index`
    ///
    /// Any `index` at or past the end opens a new chapter to be appended.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a chapter editor is already open
    pub fn open_chapter(&mut self, index: usize) -> AppResult<()> {
        if self.chapter.is_some() {
            return Err(already_open(EditLevel::Chapter));
        }
        let (draft, index) = open_child(&self.recipe, index);
        self.chapter = Some(draft);
        self.announce_open(EditLevel::Chapter, index);
        Ok(())
    }

    /// Open the step editor on the step at `index` of the open chapter
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if no chapter is open or a step editor already is
    pub fn open_step(&mut self, index: usize) -> AppResult<()> {
        if self.step.is_some() {
            return Err(already_open(EditLevel::Step));
        }
        let chapter = self
            .chapter
            .as_ref()
            .ok_or_else(|| not_open(EditLevel::Chapter))?;
        let (draft, index) = open_child(chapter, index);
        self.step = Some(draft);
        self.announce_open(EditLevel::Step, index);
        Ok(())
    }

    /// Open the ingredient editor on the ingredient at `index` of the open step
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if no step is open or an ingredient editor already is
    pub fn open_ingredient(&mut self, index: usize) -> AppResult<()> {
        if self.ingredient.is_some() {
            return Err(already_open(EditLevel::Ingredient));
        }
        let step = self.step.as_ref().ok_or_else(|| not_open(EditLevel::Step))?;
        let (draft, index) = open_child(step, index);
        self.ingredient = Some(draft);
        self.announce_open(EditLevel::Ingredient, index);
        Ok(())
    }

    /// Delete a child of the editor at `level`
    ///
    /// Returns `Ok(false)` when `index` is out of range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless `level` is the deepest open editor and has children
    pub fn delete_child(&mut self, level: EditLevel, index: usize) -> AppResult<bool> {
        self.ensure_child_list_editable(level)?;
        match level {
            EditLevel::Recipe => Ok(self.recipe.delete_child(index)),
            EditLevel::Chapter => Ok(self
                .chapter
                .as_mut()
                .is_some_and(|d| d.delete_child(index))),
            EditLevel::Step => Ok(self.step.as_mut().is_some_and(|d| d.delete_child(index))),
            EditLevel::Ingredient => Err(no_children(level)),
        }
    }

    /// Swap two children of the editor at `level`
    ///
    /// Returns `Ok(false)` when either index is out of range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless `level` is the deepest open editor and has children
    pub fn swap_children(&mut self, level: EditLevel, a: usize, b: usize) -> AppResult<bool> {
        self.ensure_child_list_editable(level)?;
        match level {
            EditLevel::Recipe => Ok(self.recipe.swap_children(a, b)),
            EditLevel::Chapter => Ok(self
                .chapter
                .as_mut()
                .is_some_and(|d| d.swap_children(a, b))),
            EditLevel::Step => Ok(self.step.as_mut().is_some_and(|d| d.swap_children(a, b))),
            EditLevel::Ingredient => Err(no_children(level)),
        }
    }

    fn ensure_child_list_editable(&self, level: EditLevel) -> AppResult<()> {
        if level.child().is_none() {
            return Err(no_children(level));
        }
        let deepest = self.deepest_level();
        if level == deepest {
            Ok(())
        } else if self.is_open(level) {
            Err(AppError::invalid_input(format!(
                "Close the {deepest} editor before changing the {level} list"
            )))
        } else {
            Err(not_open(level))
        }
    }

    /// Whether the save control of `level` should be enabled
    ///
    /// Requires an open editor with every required field, no save already in
    /// progress, and no deeper editor left open.
    #[must_use]
    pub fn can_save(&self, level: EditLevel) -> bool {
        let deeper_open = level.child().is_some_and(|child| self.is_open(child));
        !deeper_open
            && self
                .status(level)
                .is_some_and(|s| s.can_be_saved && s.phase != SavePhase::Committing)
    }

    /// Whether leaving `level` would lose edits, at that level or below
    #[must_use]
    pub fn has_unsaved_changes(&self, level: EditLevel) -> bool {
        EditLevel::ALL
            .into_iter()
            .filter(|l| *l >= level)
            .any(|l| self.status(l).is_some_and(|s| s.phase != SavePhase::Clean))
    }

    /// Save the editor at `level`
    ///
    /// A sub-editor is folded into its parent draft and closed. The recipe
    /// level commits the whole tree; on failure the draft keeps every edit
    /// and returns to `Dirty`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `can_save(level)` is false, or the storage
    /// error that rolled the save back
    pub async fn save(&mut self, level: EditLevel) -> AppResult<SaveOutcome> {
        if !self.can_save(level) {
            return Err(AppError::invalid_input(format!(
                "The {level} editor cannot be saved in its current state"
            )));
        }

        let index = match level {
            EditLevel::Recipe => return self.commit_recipe().await,
            EditLevel::Chapter => {
                let draft = self.chapter.take().ok_or_else(|| not_open(level))?;
                fold_into(&mut self.recipe, draft)
            }
            EditLevel::Step => {
                let draft = self.step.take().ok_or_else(|| not_open(level))?;
                let chapter = self
                    .chapter
                    .as_mut()
                    .ok_or_else(|| not_open(EditLevel::Chapter))?;
                fold_into(chapter, draft)
            }
            EditLevel::Ingredient => {
                let draft = self.ingredient.take().ok_or_else(|| not_open(level))?;
                let step = self.step.as_mut().ok_or_else(|| not_open(EditLevel::Step))?;
                fold_into(step, draft)
            }
        };

        debug!(level = %level, index = index, "Folded sub-editor into parent draft");
        self.navigate(NavigationRequest::Back { level });
        Ok(SaveOutcome::Folded { level, index })
    }

    async fn commit_recipe(&mut self) -> AppResult<SaveOutcome> {
        self.recipe.begin_commit();

        let store = Arc::clone(&self.store);
        let draft = self.recipe.entity().clone();
        let persisted = self.persisted.clone();
        let result = retry_transaction(
            || ReconciliationEngine::save_tree(store.as_ref(), &draft, persisted.as_ref()),
            self.max_retries,
        )
        .await;

        match result {
            Ok(outcome) => {
                let recipe_id = outcome.recipe.id.persisted().unwrap_or_default();
                self.recipe.finish_commit(outcome.recipe.clone());
                self.persisted = Some(outcome.recipe);
                Ok(SaveOutcome::Committed {
                    recipe_id,
                    stats: outcome.stats,
                })
            }
            Err(e) => {
                self.recipe.commit_failed();
                AppLogger::log_save_failure(EditLevel::Recipe, &e);
                Err(e)
            }
        }
    }

    /// Discard the editor at `level` and every editor below it
    ///
    /// Closing the recipe level reverts the recipe draft to the last
    /// persisted tree.
    pub fn close(&mut self, level: EditLevel) {
        if level <= EditLevel::Ingredient {
            self.ingredient = None;
        }
        if level <= EditLevel::Step {
            self.step = None;
        }
        if level <= EditLevel::Chapter {
            self.chapter = None;
        }

        if level == EditLevel::Recipe {
            self.recipe.initialize(self.persisted.clone(), 0);
        } else {
            self.navigate(NavigationRequest::Back { level });
        }
    }

    /// Delete the recipe from storage and start over on a new recipe
    ///
    /// Returns whether a stored recipe was removed.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the delete failed; the session is unchanged
    pub async fn delete_recipe(&mut self) -> AppResult<bool> {
        let deleted = match self.recipe.entity().id.persisted() {
            Some(recipe_id) => self.store.delete_recipe(recipe_id).await?,
            None => false,
        };

        self.ingredient = None;
        self.step = None;
        self.chapter = None;
        self.persisted = None;
        self.recipe.initialize(None, 0);
        info!(deleted = deleted, "Edit session reset after recipe delete");
        Ok(deleted)
    }

    fn announce_open(&self, level: EditLevel, index: usize) {
        if let Some(request) = NavigationRequest::edit(level, index) {
            self.navigate(request);
        }
    }

    fn navigate(&self, request: NavigationRequest) {
        if self.navigation.send(request).is_err() {
            debug!(?request, "No navigation listener");
        }
    }
}

/// Open a child draft of `parent` at `index`, returning it with its position
fn open_child<P>(parent: &Draft<P>, index: usize) -> (Draft<P::Child>, usize)
where
    P: Parent,
    P::Child: Default,
{
    let children = parent.children();
    match children.get(index) {
        Some(existing) => (Draft::new(Some(existing.clone()), index), index),
        None => (Draft::new(None, children.len()), children.len()),
    }
}

/// Fold a child draft into its parent, returning the child's position
///
/// An existing child that was never edited is already in the parent's list,
/// so the parent keeps its phase.
fn fold_into<P: Parent>(parent: &mut Draft<P>, child: Draft<P::Child>) -> usize {
    let index = child.position().min(parent.children().len());
    if child.phase() == SavePhase::Clean && !child.is_new() {
        return index;
    }
    parent.add_or_replace_child(child.into_entity(), index);
    index
}

fn not_open(level: EditLevel) -> AppError {
    AppError::invalid_input(format!("No {level} editor is open"))
}

fn already_open(level: EditLevel) -> AppError {
    AppError::invalid_input(format!("A {level} editor is already open"))
}

fn no_children(level: EditLevel) -> AppError {
    AppError::invalid_input(format!("A {level} has no child list"))
}
