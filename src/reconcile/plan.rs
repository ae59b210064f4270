// ABOUTME: Pure per-level reconciliation planning for recipe tree children
// ABOUTME: Computes deletions, dense order numbers, and the duplicate-id tie-break
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::database::repositories::{ChildRow, ChildUpsert, LevelBatch, TempId};
use crate::models::{Chapter, EditLevel, EntityId, Ingredient, Step};
use std::collections::{HashMap, HashSet};

/// A child entity that is reconciled against its parent's persisted list
pub trait TreeChild: Clone + Send + Sync {
    /// Level of this child
    const LEVEL: EditLevel;

    /// Storage identifier
    fn id(&self) -> EntityId;

    /// Set the storage identifier after an upsert
    fn set_id(&mut self, id: EntityId);

    /// Set the 1-based order number
    fn set_order_number(&mut self, order_number: u32);

    /// Own fields as a storage row
    fn to_row(&self) -> ChildRow;
}

impl TreeChild for Chapter {
    const LEVEL: EditLevel = EditLevel::Chapter;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn set_order_number(&mut self, order_number: u32) {
        self.order_number = order_number;
    }

    fn to_row(&self) -> ChildRow {
        ChildRow::Chapter {
            name: self.name.clone(),
            note: self.note.clone(),
        }
    }
}

impl TreeChild for Step {
    const LEVEL: EditLevel = EditLevel::Step;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn set_order_number(&mut self, order_number: u32) {
        self.order_number = order_number;
    }

    fn to_row(&self) -> ChildRow {
        ChildRow::Step {
            description: self.description.clone(),
            timer_minutes: self.timer_minutes.filter(|minutes| *minutes > 0),
            note: self.note.clone(),
        }
    }
}

impl TreeChild for Ingredient {
    const LEVEL: EditLevel = EditLevel::Ingredient;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn set_order_number(&mut self, order_number: u32) {
        self.order_number = order_number;
    }

    fn to_row(&self) -> ChildRow {
        ChildRow::Ingredient {
            name: self.name.clone(),
            quantity: self.quantity,
            unit: self.unit.clone(),
        }
    }
}

/// One draft child scheduled for upsert
#[derive(Debug)]
pub struct PlannedChild<'a, T> {
    /// Draft entity, including its own drafted children
    pub child: &'a T,
    /// Order number computed from the effective draft position
    pub order_number: u32,
    /// Persisted counterpart with the same identifier, if known
    pub persisted: Option<&'a T>,
}

/// Operations for one parent at one level
#[derive(Debug)]
pub struct LevelPlan<'a, T> {
    /// Persisted identifiers absent from the draft
    pub deletions: Vec<i64>,
    /// Effective draft children in order
    pub upserts: Vec<PlannedChild<'a, T>>,
}

impl<T: TreeChild> LevelPlan<'_, T> {
    /// Storage batch for this plan under `parent_id`
    ///
    /// The `temp_id` of every upsert is its index in [`LevelPlan::upserts`].
    #[must_use]
    pub fn to_batch(&self, parent_id: i64) -> LevelBatch {
        LevelBatch {
            level: T::LEVEL,
            parent_id,
            deletions: self.deletions.clone(),
            upserts: self
                .upserts
                .iter()
                .enumerate()
                .map(|(index, planned)| ChildUpsert {
                    temp_id: TempId(index),
                    id: planned.child.id(),
                    order_number: planned.order_number,
                    row: planned.child.to_row(),
                })
                .collect(),
        }
    }
}

/// Plan the reconciliation of `draft` against `persisted` for one parent
///
/// When two draft children carry the same persisted identifier, the later one
/// is kept and the earlier one is dropped together with its subtree. Order
/// numbers are dense over the kept children, starting at 1.
#[must_use]
pub fn plan_level<'a, T: TreeChild>(draft: &'a [T], persisted: &'a [T]) -> LevelPlan<'a, T> {
    let mut last_position: HashMap<i64, usize> = HashMap::new();
    for (position, child) in draft.iter().enumerate() {
        if let Some(id) = child.id().persisted() {
            last_position.insert(id, position);
        }
    }

    let persisted_by_id: HashMap<i64, &T> = persisted
        .iter()
        .filter_map(|child| child.id().persisted().map(|id| (id, child)))
        .collect();

    let mut seen = HashSet::new();
    let deletions = persisted
        .iter()
        .filter_map(|child| child.id().persisted())
        .filter(|id| !last_position.contains_key(id) && seen.insert(*id))
        .collect();

    let mut upserts = Vec::with_capacity(draft.len());
    for (position, child) in draft.iter().enumerate() {
        let persisted = match child.id().persisted() {
            Some(id) if last_position.get(&id) != Some(&position) => continue,
            Some(id) => persisted_by_id.get(&id).copied(),
            None => None,
        };
        let order_number = u32::try_from(upserts.len() + 1).unwrap_or(u32::MAX);
        upserts.push(PlannedChild {
            child,
            order_number,
            persisted,
        });
    }

    LevelPlan { deletions, upserts }
}
