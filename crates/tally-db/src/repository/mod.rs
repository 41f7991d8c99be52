//! # Repository Module
//!
//! Repository implementations for database operations.
//!
//! ## Pattern
//! Each repository owns a pool handle for reads. Writes that must be atomic
//! with other writes (stock mutation + ledger entry + invoice) are
//! associated functions taking `&mut SqliteConnection`, so tally-service
//! composes them under a single transaction.

pub mod invoice;
pub mod ledger;
pub mod product;
