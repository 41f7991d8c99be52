//! # Service Error Type
//!
//! The error taxonomy collaborators see.
//!
//! ## Error Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Service Error Taxonomy                               │
//! │                                                                         │
//! │  Validation        bad input shape; surfaced before any mutation       │
//! │  NotFound          unknown product/invoice for the tenant; no mutation │
//! │  InsufficientStock sale exceeds current stock; no mutation             │
//! │  Conflict          duplicate product code / invoice number             │
//! │  Internal          storage unavailable etc.; generic failure           │
//! │                                                                         │
//! │  Recovery policy: only row-level Conflict during bulk import is        │
//! │  recoverable-and-continue. Every other failure aborts the enclosing    │
//! │  operation with no partial effect.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use tally_core::{IntakeError, ValidationError};
use tally_db::DbError;

/// Errors returned by every service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input shape (quantity <= 0, unparseable numeric, missing
    /// mandatory field/column, unknown category on the strict path).
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown product or invoice for this tenant.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Requested sale quantity exceeds current stock.
    #[error("insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// Duplicate product code or invoice number, or a lost concurrent
    /// update. Recoverable per-row during bulk import only.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage unavailable or another non-classifiable failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// True for the one failure class bulk import tolerates per row.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Conflict(_))
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<IntakeError> for ServiceError {
    fn from(err: IntakeError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, key } => {
                // Repositories report reads that came up empty; the entity
                // name is informational only at this level.
                tracing::debug!(entity = %entity, key = %key, "Database lookup miss");
                ServiceError::Internal(format!("{entity} not found: {key}"))
            }
            DbError::UniqueViolation { .. } => ServiceError::Conflict(err.to_string()),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err: ServiceError = DbError::UniqueViolation {
            constraint: "products.tenant_id, products.code".to_string(),
        }
        .into();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_validation_error_maps_to_validation() {
        let err: ServiceError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_intake_error_maps_to_validation() {
        let err: ServiceError = IntakeError::MissingColumn { field: "quantity" }.into();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "validation error: mandatory column missing: quantity"
        );
    }
}
