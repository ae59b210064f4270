// ABOUTME: Structured error types for recipe storage operations
// ABOUTME: Provides domain-specific errors with context for the persistence port
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Errors raised by a recipe store or one of its transactions
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not open or configure the database
    #[error("Database connection failed: {context}")]
    ConnectionError {
        /// What was being attempted
        context: String,
    },

    /// A statement was rejected
    #[error("Query failed: {context}")]
    QueryError {
        /// What was being attempted
        context: String,
    },

    /// Begin, commit, or rollback failed, or the transaction was reused
    #[error("Transaction failed: {context}")]
    TransactionError {
        /// What was being attempted
        context: String,
    },

    /// The referenced row does not exist
    #[error("{entity_type} not found: {entity_id}")]
    NotFound {
        /// Kind of entity
        entity_type: &'static str,
        /// Identifier that was looked up
        entity_id: String,
    },

    /// Stored or submitted data does not fit the model
    #[error("Invalid data in {field}: {reason}")]
    InvalidData {
        /// Column or field name
        field: String,
        /// Why it was rejected
        reason: String,
    },
}

impl DatabaseError {
    /// Shorthand for a query failure with context
    pub fn query(context: impl Into<String>) -> Self {
        Self::QueryError {
            context: context.into(),
        }
    }

    /// Shorthand for a transaction failure with context
    pub fn transaction(context: impl Into<String>) -> Self {
        Self::TransactionError {
            context: context.into(),
        }
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::NotFound {
                entity_type: "row",
                entity_id: "unknown".to_owned(),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::ConnectionError {
                    context: error.to_string(),
                }
            }
            other => Self::QueryError {
                context: other.to_string(),
            },
        }
    }
}
