// ABOUTME: Application-wide constants for the Recipe Book editor
// ABOUTME: Defaults for new entities, database tuning, and service identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Defaults applied to freshly created drafts and configuration
pub mod defaults {
    /// Servings count of a brand-new recipe
    pub const SERVINGS: u32 = 1;
    /// Retry attempts for a save that hits a transient storage error
    pub const SAVE_MAX_RETRIES: u32 = 3;
    /// Directory under the platform data dir holding the database
    pub const APP_DATA_DIR: &str = "recipe-book";
    /// Database file name inside `APP_DATA_DIR`
    pub const DATABASE_FILE: &str = "recipes.db";
}

/// Database configuration
pub mod database {
    /// Connection pool maximum size for file-backed databases
    pub const POOL_MAX_SIZE: u32 = 5;
    /// Connection acquire timeout in seconds
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
    /// Capacity of the recipe change broadcast channel
    pub const CHANGE_CHANNEL_CAPACITY: usize = 64;
    /// Capacity of the navigation request broadcast channel
    pub const NAVIGATION_CHANNEL_CAPACITY: usize = 32;
    /// Base backoff for transaction retries in milliseconds
    pub const RETRY_BASE_BACKOFF_MS: u64 = 10;
}

/// Service identifiers used in structured logs
pub mod service_names {
    /// Service name reported by the logging layer
    pub const RECIPE_BOOK: &str = "recipe-book";
}
