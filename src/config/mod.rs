// ABOUTME: Configuration management module for the recipe book
// ABOUTME: Environment-only configuration for storage, save retries, and logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Database location and pool configuration
pub mod database;
/// Application configuration from environment variables
pub mod environment;

pub use database::{DatabaseConfig, DatabaseUrl};
pub use environment::AppConfig;
