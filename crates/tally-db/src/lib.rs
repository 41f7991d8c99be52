//! # tally-db: Database Layer for Tally Inventory
//!
//! This crate provides database access for the Tally Inventory system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tally Inventory Data Flow                           │
//! │                                                                         │
//! │  tally-service operation (sell, create_purchase, import_bulk)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ product.rs    │    │  (embedded)  │  │   │
//! │  │   │               │    │ ledger.rs     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ invoice.rs    │    │ 001_init.sql │  │   │
//! │  │   │ begin() txns  │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, foreign keys on)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, ledger, invoice)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tally.db")).await?;
//!
//! // Reads go through pool-backed repositories
//! let product = db.products().get_by_code(tenant_id, "COKE-330").await?;
//!
//! // Writes compose under one transaction
//! let mut tx = db.begin().await?;
//! ProductRepository::insert(&mut tx, &product).await?;
//! LedgerRepository::record(&mut tx, &entry).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::invoice::InvoiceRepository;
pub use repository::ledger::{LedgerFilter, LedgerRepository};
pub use repository::product::ProductRepository;
