// ABOUTME: Draft state holder for one level of the recipe tree
// ABOUTME: Tracks the save phase and publishes status snapshots on a watch channel
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::fields::{Editable, Parent};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

/// Save state of one draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePhase {
    /// Matches what it was initialized from
    Clean,
    /// Edited since initialization
    Dirty,
    /// Save in progress
    Committing,
}

/// Snapshot published after every change to a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DraftStatus {
    /// Current save phase
    pub phase: SavePhase,
    /// All required fields are present
    pub can_be_saved: bool,
    /// The entity has never been persisted
    pub is_new: bool,
    /// Number of drafted children
    pub child_count: usize,
}

/// In-memory editable copy of one entity and its drafted children
#[derive(Debug)]
pub struct Draft<E: Editable> {
    entity: E,
    position: usize,
    is_new: bool,
    phase: SavePhase,
    status: watch::Sender<DraftStatus>,
}

impl<E: Editable> Draft<E> {
    /// Create a draft from an existing entity, or from defaults when `None`
    ///
    /// `position` is where the entity sits in its parent's list; for a new
    /// child it is the parent's child count, meaning "append".
    #[must_use]
    pub fn new(existing: Option<E>, position: usize) -> Self
    where
        E: Default,
    {
        let (entity, is_new) = Self::seed(existing);
        let (status, _) = watch::channel(DraftStatus {
            phase: SavePhase::Clean,
            can_be_saved: entity.is_complete(),
            is_new,
            child_count: entity.child_count(),
        });

        Self {
            entity,
            position,
            is_new,
            phase: SavePhase::Clean,
            status,
        }
    }

    /// Reload the draft, discarding edits and returning to `Clean`
    pub fn initialize(&mut self, existing: Option<E>, position: usize)
    where
        E: Default,
    {
        let (entity, is_new) = Self::seed(existing);
        self.entity = entity;
        self.position = position;
        self.is_new = is_new;
        self.phase = SavePhase::Clean;
        self.publish();
    }

    fn seed(existing: Option<E>) -> (E, bool)
    where
        E: Default,
    {
        match existing {
            Some(entity) => {
                let is_new = entity.entity_id().is_new();
                (entity, is_new)
            }
            None => (E::default(), true),
        }
    }

    /// Apply a field change; rejected values leave the draft untouched
    pub fn update_field(&mut self, change: E::Field) -> bool {
        let description = format!("{change:?}");
        if self.entity.apply(change) {
            self.mark_dirty();
            true
        } else {
            debug!(level = %E::LEVEL, change = %description, "Rejected field change");
            false
        }
    }

    /// Entity as currently drafted
    #[must_use]
    pub const fn entity(&self) -> &E {
        &self.entity
    }

    /// Consume the draft, keeping the edited entity
    #[must_use]
    pub fn into_entity(self) -> E {
        self.entity
    }

    /// Position in the parent's list
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The entity has never been persisted
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }

    /// Current save phase
    #[must_use]
    pub const fn phase(&self) -> SavePhase {
        self.phase
    }

    /// Required fields are present and in range
    #[must_use]
    pub fn can_be_saved(&self) -> bool {
        self.entity.is_complete()
    }

    /// Edited since the last initialization or successful save
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.phase != SavePhase::Clean
    }

    /// Current status snapshot
    #[must_use]
    pub fn status(&self) -> DraftStatus {
        DraftStatus {
            phase: self.phase,
            can_be_saved: self.can_be_saved(),
            is_new: self.is_new,
            child_count: self.entity.child_count(),
        }
    }

    /// Receive a snapshot after every change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DraftStatus> {
        self.status.subscribe()
    }

    /// Enter `Committing`
    pub fn begin_commit(&mut self) {
        self.phase = SavePhase::Committing;
        self.publish();
    }

    /// Return to `Dirty` after a failed save, keeping every edit
    pub fn commit_failed(&mut self) {
        self.phase = SavePhase::Dirty;
        self.publish();
    }

    /// Reload from the committed entity, returning to `Clean`
    pub fn finish_commit(&mut self, committed: E)
    where
        E: Default,
    {
        self.initialize(Some(committed), self.position);
    }

    fn mark_dirty(&mut self) {
        if self.phase == SavePhase::Clean {
            self.phase = SavePhase::Dirty;
        }
        self.publish();
    }

    fn publish(&self) {
        self.status.send_replace(self.status());
    }
}

impl<E: Parent> Draft<E> {
    /// Drafted children in order
    #[must_use]
    pub fn children(&self) -> &[E::Child] {
        self.entity.children()
    }

    /// Replace the child at `index`, or append when `index` is past the end
    pub fn add_or_replace_child(&mut self, child: E::Child, index: usize) {
        let children = self.entity.children_mut();
        if let Some(slot) = children.get_mut(index) {
            *slot = child;
        } else {
            children.push(child);
        }
        self.mark_dirty();
    }

    /// Remove the child at `index`, returning `false` if out of range
    pub fn delete_child(&mut self, index: usize) -> bool {
        let children = self.entity.children_mut();
        if index >= children.len() {
            return false;
        }
        children.remove(index);
        self.mark_dirty();
        true
    }

    /// Swap two children, returning `false` if either index is out of range
    pub fn swap_children(&mut self, a: usize, b: usize) -> bool {
        let children = self.entity.children_mut();
        if a >= children.len() || b >= children.len() {
            return false;
        }
        children.swap(a, b);
        self.mark_dirty();
        true
    }
}
