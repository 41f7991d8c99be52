//! # Validation Module
//!
//! Input validation utilities for Tally Inventory.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Service entry points (tally-service)                         │
//! │  └── THIS MODULE: field checks, before any mutation                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE (tenant_id, code) / UNIQUE invoice_number                  │
//! │  └── CHECK (quantity >= 0)                                             │
//! │                                                                         │
//! │  Defense in depth: a failed validation means nothing was written       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_product_code, validate_quantity};
//!
//! validate_product_code("COKE-330").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::types::NewProduct;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code (the tenant-scoped business identifier).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Must contain only alphanumeric characters, hyphens, underscores
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a unit of measure ("pcs", "kg", ...). Non-empty, short.
pub fn validate_unit(unit: &str) -> ValidationResult<()> {
    let unit = unit.trim();

    if unit.is_empty() {
        return Err(ValidationError::Required {
            field: "unit".to_string(),
        });
    }

    if unit.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "unit".to_string(),
            max: 20,
        });
    }

    Ok(())
}

/// Validates a search query. Can be empty (returns all/default results).
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock-moving quantity. Must be positive (> 0).
///
/// Both intake and sale quantities flow through here; a zero or negative
/// quantity is rejected before any lookup or mutation happens.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price in cents. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a reorder threshold. Must be >= 0.
pub fn validate_threshold(threshold: i64) -> ValidationResult<()> {
    if threshold < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "threshold".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every field of a new-product spec except the category.
///
/// Category resolution is deliberately not part of this check: the two
/// intake paths disagree on what to do with an unknown category (reject vs.
/// default to Other), so the caller applies its own policy.
pub fn validate_new_product(spec: &NewProduct) -> ValidationResult<()> {
    validate_product_code(&spec.code)?;
    validate_product_name(&spec.name)?;
    validate_unit(&spec.unit)?;
    validate_quantity(spec.quantity)?;
    validate_price_cents(spec.price_cents)?;
    validate_threshold(spec.threshold)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> NewProduct {
        NewProduct {
            code: "COKE-330".to_string(),
            name: "Coca-Cola 330ml".to_string(),
            category: "Beverage".to_string(),
            price_cents: 250,
            quantity: 24,
            unit: "pcs".to_string(),
            expiry_date: None,
            threshold: 6,
        }
    }

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("COKE-330").is_ok());
        assert!(validate_product_code("ABC123").is_ok());
        assert!(validate_product_code("product_1").is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code("has space").is_err());
        assert!(validate_product_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Coca-Cola 330ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100_000).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_threshold() {
        assert!(validate_threshold(0).is_ok());
        assert!(validate_threshold(10).is_ok());
        assert!(validate_threshold(-1).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        assert!(validate_new_product(&spec()).is_ok());

        let mut bad = spec();
        bad.quantity = 0;
        assert!(validate_new_product(&bad).is_err());

        let mut bad = spec();
        bad.code = String::new();
        assert!(validate_new_product(&bad).is_err());
    }
}
