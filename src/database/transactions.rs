// ABOUTME: Transaction management with RAII guards and retry patterns for recipe saves.
// ABOUTME: Provides automatic rollback on drop and exponential backoff for SQLite lock contention.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Transaction management with RAII guards and retry patterns
//!
//! - `TransactionGuard`: wrapper ensuring automatic rollback if not committed
//! - `retry_transaction`: exponential backoff for "database is locked" / busy errors
//!
//! ```text
//! let tx = pool.begin().await?;
//! let mut guard = TransactionGuard::new(tx);
//!
//! sqlx::query("DELETE FROM chapters ...").execute(guard.executor()?).await?;
//! sqlx::query("INSERT INTO chapters ...").execute(guard.executor()?).await?;
//!
//! // If this line isn't reached, the transaction rolls back
//! guard.commit().await?;
//! ```

use std::future::Future;
use std::time::Duration;

use sqlx::{Database, Transaction};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::constants::database::RETRY_BASE_BACKOFF_MS;
use crate::database::DatabaseError;
use crate::errors::AppResult;

/// Retry an operation if it fails with a transient storage error
///
/// Lock and busy errors are retried with exponential backoff
/// (10ms, 20ms, 40ms, ...). Everything else, constraint violations included,
/// is returned immediately. Each attempt must be a complete transaction: a
/// failed attempt has already been rolled back when it is retried.
///
/// # Errors
///
/// Returns the last error once `max_retries` attempts have failed, or the
/// first non-retryable error
pub async fn retry_transaction<F, Fut, T>(mut f: F, max_retries: u32) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;
                if attempts >= max_retries {
                    error!(
                        attempts = attempts,
                        max_retries = max_retries,
                        error = %e,
                        "Transaction failed after max retries"
                    );
                    return Err(e);
                }

                if is_retryable_error(&e.to_string()) {
                    let backoff_ms = RETRY_BASE_BACKOFF_MS * (1 << attempts);
                    warn!(
                        attempt = attempts,
                        max_retries = max_retries,
                        backoff_ms = backoff_ms,
                        error = %e,
                        "Transaction failed with retryable error, retrying after backoff"
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                } else {
                    debug!(
                        attempts = attempts,
                        error = %e,
                        "Transaction failed with non-retryable error"
                    );
                    return Err(e);
                }
            }
        }
    }
}

/// Check if a storage error message describes a transient condition
fn is_retryable_error(error_msg: &str) -> bool {
    let error_lower = error_msg.to_lowercase();

    if error_lower.contains("constraint") {
        return false;
    }

    error_lower.contains("database is locked")
        || error_lower.contains("database table is locked")
        || error_lower.contains("busy")
        || error_lower.contains("timed out")
        || error_lower.contains("timeout")
}

/// Guard for database transactions ensuring automatic rollback on drop
///
/// Commit consumes the guard. Dropping it without a commit lets `SQLx` roll
/// the transaction back.
pub struct TransactionGuard<'c, DB: Database> {
    transaction: Option<Transaction<'c, DB>>,
    committed: bool,
}

impl<'c, DB: Database> TransactionGuard<'c, DB> {
    /// Create a new transaction guard from an existing `SQLx` transaction
    #[must_use]
    pub fn new(transaction: Transaction<'c, DB>) -> Self {
        debug!("TransactionGuard created - transaction will auto-rollback if not committed");
        Self {
            transaction: Some(transaction),
            committed: false,
        }
    }

    /// Commit the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction was already consumed or the commit fails
    pub async fn commit(mut self) -> Result<(), DatabaseError> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| DatabaseError::transaction("Transaction already consumed - cannot commit"))?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::transaction(format!("Transaction commit failed: {e}")))?;
        self.committed = true;
        debug!("TransactionGuard committed successfully");
        Ok(())
    }

    /// Explicitly rollback the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback operation fails
    pub async fn rollback(mut self) -> Result<(), DatabaseError> {
        let tx = self.transaction.take().ok_or_else(|| {
            DatabaseError::transaction("Transaction already consumed - cannot rollback")
        })?;

        tx.rollback()
            .await
            .map_err(|e| DatabaseError::transaction(format!("Transaction rollback failed: {e}")))?;
        debug!("TransactionGuard rolled back explicitly");
        Ok(())
    }

    /// Check if the transaction has been committed
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Connection for executing queries inside the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the guard is used after commit or rollback
    pub fn executor(&mut self) -> Result<&mut <DB as Database>::Connection, DatabaseError> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            DatabaseError::transaction("Transaction already consumed - guard used after commit/rollback")
        })
    }
}

impl<DB: Database> Drop for TransactionGuard<'_, DB> {
    fn drop(&mut self) {
        if self.transaction.is_some() && !self.committed {
            warn!("TransactionGuard dropped without commit - transaction will be rolled back");
        }
    }
}

/// Type alias for `SQLite` transaction guard
pub type SqliteTransactionGuard<'c> = TransactionGuard<'c, sqlx::Sqlite>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retryable_classification() {
        assert!(is_retryable_error("Query failed: database is locked"));
        assert!(is_retryable_error("pool timed out while waiting"));
        assert!(!is_retryable_error("UNIQUE constraint failed: chapters.id"));
        assert!(!is_retryable_error("disk I/O error"));
    }

    #[tokio::test]
    async fn test_retry_stops_on_non_retryable_error() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = retry_transaction(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::database("CHECK constraint failed")) }
            },
            5,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_lock() {
        let calls = AtomicU32::new(0);
        let result = retry_transaction(
            || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(AppError::database("database is locked"))
                    } else {
                        Ok(attempt)
                    }
                }
            },
            3,
        )
        .await;

        assert_eq!(result.unwrap(), 1);
    }
}
