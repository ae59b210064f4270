// ABOUTME: Recipe services built on top of the persistence port and editor
// ABOUTME: List streaming, JSON interchange, ingredient formatting, and cooking progress
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Recipe services
//!
//! Read-path and interchange helpers used by list screens and the CLI. None
//! of them write to storage except [`recipes::import_json`], which goes
//! through an edit session like any other save.

/// Cooking progress tracking
pub mod progress;

/// Recipe list stream, import/export, and display formatting
pub mod recipes;

pub use progress::CookingProgress;
pub use recipes::{export_json, format_ingredient, format_quantity, import_json, stream_recipes};
