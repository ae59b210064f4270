// ABOUTME: Re-export of application constants from recipe-core
// ABOUTME: Defaults, database tuning, and service names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use recipe_core::constants::*;
