// ABOUTME: Core types and constants for the Recipe Book editor
// ABOUTME: Foundation crate with error handling, the recipe entity tree, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Recipe Core
//!
//! Foundation crate providing shared types and constants for the Recipe Book
//! editor. This crate is designed to change infrequently, enabling incremental
//! compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `DatabaseError`
//! - **constants**: Defaults, database tuning, and service names
//! - **models**: The Recipe → Chapter → Step → Ingredient tree and list summaries

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Recipe entity tree and read-path summaries
pub mod models;
