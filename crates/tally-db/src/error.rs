//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError (tally-service) ← The taxonomy callers see:              │
//! │       UniqueViolation → Conflict (recoverable per-row in bulk import)  │
//! │       NotFound        → NotFound                                       │
//! │       everything else → Internal (aborts the enclosing operation)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context for
/// debugging and caller-side classification.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate (tenant_id, code) product
    /// - Duplicate invoice_number (should be unreachable with the sequence
    ///   counter, but the index is kept as a backstop)
    #[error("duplicate value violates {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violation (e.g., ledger entry referencing a
    /// product that does not exist).
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database file could not be opened or the pool could not be built.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// The pool is exhausted or closed; the store is momentarily unavailable.
    #[error("database unavailable: {0}")]
    Unavailable(String),

    /// Any other query execution failure.
    #[error("query failed: {0}")]
    Query(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and lookup key.
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// True when the error is a unique-constraint conflict (the only
    /// recoverable write failure during bulk import).
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → inspect message for constraint kind
/// sqlx::Error::PoolTimedOut   → DbError::Unavailable
/// Other                       → DbError::Query
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "record".to_string(),
                key: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports constraints in the message text:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                if let Some(constraint) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        constraint: constraint.to_string(),
                    }
                } else if msg.contains("UNIQUE constraint failed") {
                    DbError::UniqueViolation {
                        constraint: msg.to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::Query(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::Unavailable("pool exhausted".to_string()),

            sqlx::Error::PoolClosed => DbError::Unavailable("pool is closed".to_string()),

            _ => DbError::Query(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
