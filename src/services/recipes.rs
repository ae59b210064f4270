// ABOUTME: Recipe read-path and interchange services built on the persistence port
// ABOUTME: Live list stream, JSON import/export, and ingredient display formatting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::database::repositories::RecipeStore;
use crate::editor::{EditSession, SaveOutcome};
use crate::errors::{AppError, AppResult};
use crate::models::{EditLevel, Ingredient, Recipe, RecipeSummary};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// Live list of recipe summaries
///
/// Yields the current list immediately, then a fresh list after every
/// committed save or delete. A lagging receiver simply re-queries; the stream
/// ends when the store's change channel closes.
pub fn stream_recipes(
    store: Arc<dyn RecipeStore>,
) -> impl Stream<Item = AppResult<Vec<RecipeSummary>>> + Send {
    let mut changes = store.subscribe();

    async_stream::stream! {
        yield store.list_recipes().await.map_err(AppError::from);

        loop {
            match changes.recv().await {
                Ok(change) => {
                    debug!(?change, "Recipe list changed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Recipe list stream lagged, refreshing");
                }
                Err(RecvError::Closed) => break,
            }
            yield store.list_recipes().await.map_err(AppError::from);
        }
    }
}

/// Stored recipe as pretty-printed JSON
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown recipe, or a storage error
pub async fn export_json(store: &dyn RecipeStore, recipe_id: i64) -> AppResult<String> {
    let recipe = store
        .load_full_tree(recipe_id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe").with_resource_id(recipe_id.to_string()))?;

    Ok(serde_json::to_string_pretty(&recipe)?)
}

/// Save a JSON recipe tree as a new recipe, returning the committed tree
///
/// Identifiers in the document are ignored.
///
/// # Errors
///
/// Returns a serialization error for malformed JSON, `InvalidInput` for an
/// incomplete tree, or the storage error that rolled the save back
pub async fn import_json(
    store: Arc<dyn RecipeStore>,
    json: &str,
    max_retries: u32,
) -> AppResult<Recipe> {
    let recipe: Recipe = serde_json::from_str(json)?;
    let mut session = EditSession::import(store, recipe).with_max_retries(max_retries);

    if !session.can_save(EditLevel::Recipe) {
        return Err(AppError::invalid_input(
            "Imported recipe is missing required fields",
        ));
    }

    match session.save(EditLevel::Recipe).await? {
        SaveOutcome::Committed { .. } => session
            .persisted()
            .cloned()
            .ok_or_else(|| AppError::internal("Committed recipe missing from session")),
        SaveOutcome::Folded { .. } => Err(AppError::internal("Recipe save did not commit")),
    }
}

/// Quantity scaled by `factor`, without trailing zeros; `None` for no quantity
#[must_use]
pub fn format_quantity(quantity: f64, factor: f64) -> Option<String> {
    if quantity <= 0.0 || !quantity.is_finite() {
        return None;
    }

    let scaled = quantity * factor;
    let text = format!("{scaled:.2}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    Some(trimmed.to_owned())
}

/// Ingredient line such as `"200 g flour"`, scaled from `base_servings` to `servings`
///
/// A quantity of 0 shows only the name.
#[must_use]
pub fn format_ingredient(ingredient: &Ingredient, base_servings: u32, servings: u32) -> String {
    let factor = f64::from(servings.max(1)) / f64::from(base_servings.max(1));

    match format_quantity(ingredient.quantity, factor) {
        Some(quantity) if ingredient.unit.is_empty() => format!("{quantity} {}", ingredient.name),
        Some(quantity) => format!("{quantity} {} {}", ingredient.unit, ingredient.name),
        None => ingredient.name.clone(),
    }
}
