// ABOUTME: Transactional reconciliation of a drafted recipe tree against storage
// ABOUTME: Upserts parents before children and commits the whole tree at once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::plan::{plan_level, TreeChild};
use crate::database::repositories::{RecipeRow, ReconcileTransaction, RecipeStore, TempId};
use crate::editor::fields::tree_problem;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{EntityId, Recipe};
use std::time::Instant;

/// Counters for one committed save
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Upserts issued, the recipe row included
    pub upserts: usize,
    /// Upserts that created a new row
    pub inserts: usize,
    /// Child rows deleted (descendants removed by cascade are not counted)
    pub deletes: usize,
}

/// Result of a committed save
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    /// Committed tree with assigned identifiers and dense order numbers
    pub recipe: Recipe,
    /// Operation counters
    pub stats: ReconcileStats,
}

/// A child committed at one level, with what is needed to reconcile below it
struct Reconciled<'a, T> {
    committed: T,
    id: i64,
    draft: &'a T,
    persisted: Option<&'a T>,
}

/// Reconciles a drafted recipe tree against the last persisted tree
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Reject a tree that cannot be persisted
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` naming the first incomplete entity
    pub fn validate(recipe: &Recipe) -> AppResult<()> {
        match tree_problem(recipe) {
            Some(problem) => Err(AppError::invalid_input(format!(
                "Recipe cannot be saved: {problem}"
            ))),
            None => Ok(()),
        }
    }

    /// Save `draft` in one transaction, diffing each level against `persisted`
    ///
    /// `persisted` is ignored unless it is the stored version of the same
    /// recipe. On error nothing is committed and `draft` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an incomplete tree, or the storage error
    /// that aborted the transaction
    pub async fn save_tree(
        store: &dyn RecipeStore,
        draft: &Recipe,
        persisted: Option<&Recipe>,
    ) -> AppResult<ReconcileOutcome> {
        Self::validate(draft)?;
        let start = Instant::now();
        let persisted = persisted.filter(|p| !draft.id.is_new() && p.id == draft.id);

        let mut tx = store.begin().await?;
        let recipe_id = tx.upsert_recipe(draft.id, &RecipeRow::from(draft)).await?;

        let mut stats = ReconcileStats {
            upserts: 1,
            inserts: usize::from(draft.id.is_new()),
            deletes: 0,
        };

        let mut committed = Recipe {
            id: EntityId::Persisted(recipe_id),
            chapters: Vec::with_capacity(draft.chapters.len()),
            ..draft.clone()
        };

        let persisted_chapters = persisted.map_or(&[][..], |p| p.chapters.as_slice());
        let chapters =
            reconcile_level(tx.as_mut(), recipe_id, &draft.chapters, persisted_chapters, &mut stats)
                .await?;

        for chapter in chapters {
            let mut committed_chapter = chapter.committed;
            let persisted_steps = chapter.persisted.map_or(&[][..], |c| c.steps.as_slice());
            let steps = reconcile_level(
                tx.as_mut(),
                chapter.id,
                &chapter.draft.steps,
                persisted_steps,
                &mut stats,
            )
            .await?;

            committed_chapter.steps = Vec::with_capacity(steps.len());
            for step in steps {
                let mut committed_step = step.committed;
                let persisted_ingredients =
                    step.persisted.map_or(&[][..], |s| s.ingredients.as_slice());
                committed_step.ingredients = reconcile_level(
                    tx.as_mut(),
                    step.id,
                    &step.draft.ingredients,
                    persisted_ingredients,
                    &mut stats,
                )
                .await?
                .into_iter()
                .map(|ingredient| ingredient.committed)
                .collect();
                committed_chapter.steps.push(committed_step);
            }

            committed.chapters.push(committed_chapter);
        }

        tx.commit().await?;

        AppLogger::log_reconciliation(
            recipe_id,
            stats.upserts,
            stats.inserts,
            stats.deletes,
            u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        );

        Ok(ReconcileOutcome {
            recipe: committed,
            stats,
        })
    }
}

/// Plan and apply one level under `parent_id`
///
/// The committed copies keep the draft's own children; the caller replaces
/// them once the level below is reconciled.
async fn reconcile_level<'a, T: TreeChild>(
    tx: &mut dyn ReconcileTransaction,
    parent_id: i64,
    draft: &'a [T],
    persisted: &'a [T],
    stats: &mut ReconcileStats,
) -> AppResult<Vec<Reconciled<'a, T>>> {
    let plan = plan_level(draft, persisted);
    let batch = plan.to_batch(parent_id);
    let assigned = tx.reconcile(&batch).await?;

    stats.upserts += batch.upserts.len();
    stats.inserts += batch.insert_count();
    stats.deletes += batch.deletions.len();

    let mut reconciled = Vec::with_capacity(plan.upserts.len());
    for (index, planned) in plan.upserts.into_iter().enumerate() {
        let id = match planned.child.id() {
            EntityId::Persisted(id) => id,
            EntityId::New => assigned.get(&TempId(index)).copied().ok_or_else(|| {
                AppError::internal(format!(
                    "Storage assigned no id to new {} at position {}",
                    T::LEVEL,
                    index + 1
                ))
            })?,
        };

        let mut committed = planned.child.clone();
        committed.set_id(EntityId::Persisted(id));
        committed.set_order_number(planned.order_number);
        reconciled.push(Reconciled {
            committed,
            id,
            draft: planned.child,
            persisted: planned.persisted,
        });
    }

    Ok(reconciled)
}
