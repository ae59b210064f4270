// ABOUTME: Re-export of the unified error types from recipe-core
// ABOUTME: Keeps `crate::errors` paths stable for the editor and storage modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use recipe_core::errors::*;
