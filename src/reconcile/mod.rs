// ABOUTME: Reconciliation of drafted recipe trees against persisted trees
// ABOUTME: Pure level planning plus the transactional apply across all four levels
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Reconciliation
//!
//! A save diffs each drafted child list against the persisted list of the
//! same parent. Persisted children missing from the draft are deleted, every
//! drafted child is upserted with an order number taken from its position,
//! and each level runs only after its parent's upsert has produced a key.
//! The whole tree is written in one transaction.

/// Transactional apply of a whole recipe tree
pub mod engine;
/// Pure per-level planning
pub mod plan;

pub use engine::{ReconcileOutcome, ReconcileStats, ReconciliationEngine};
pub use plan::{plan_level, LevelPlan, PlannedChild, TreeChild};
