//! # Domain Types
//!
//! Core domain types used throughout Tally Inventory.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │    Product      │   │ StockTransaction │   │    Invoice      │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  id (UUID)      │   │  id (UUID)       │   │  id (UUID)      │      │
//! │  │  code (business)│   │  product_id (FK) │   │  invoice_number │      │
//! │  │  quantity       │   │  tx_type         │   │  status         │      │
//! │  │  status         │   │  amount_cents    │   │  amount_cents   │      │
//! │  └─────────────────┘   └──────────────────┘   └─────────────────┘      │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockStatus   │   │ TransactionType │   │  InvoiceStatus  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  InStock        │   │  Purchase       │   │  Unpaid         │       │
//! │  │  LowStock       │   │  Sale           │   │  Paid           │       │
//! │  │  OutOfStock     │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (code, invoice_number) - human-readable, tenant-facing
//!
//! ## Tenant Scoping
//! Product, StockTransaction, and Invoice all carry an explicit `tenant_id`.
//! Nothing in this workspace reads ambient caller identity; the tenant is a
//! required parameter on every operation that touches these types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// Product category, a fixed enumerated set.
///
/// Stored and serialized under the display labels below (`"Home Product"`,
/// not `HomeProduct`). Resolution is case-insensitive via
/// [`Category::resolve`].
///
/// ## Validation Asymmetry (intentional)
/// Single-item creation *rejects* unknown categories; bulk intake silently
/// falls back to [`Category::Other`]. Both paths share [`Category::resolve`];
/// only the fallback policy differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum Category {
    Beverage,
    Snack,
    Grocery,
    #[serde(rename = "Home Product")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Home Product"))]
    HomeProduct,
    #[serde(rename = "Personal Care")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Personal Care"))]
    PersonalCare,
    #[serde(rename = "Cleaning Supplies")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Cleaning Supplies"))]
    CleaningSupplies,
    Stationery,
    Electronics,
    Medicine,
    #[serde(rename = "Baby Products")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Baby Products"))]
    BabyProducts,
    #[serde(rename = "Pet Supplies")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Pet Supplies"))]
    PetSupplies,
    #[serde(rename = "Frozen Food")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Frozen Food"))]
    FrozenFood,
    Bakery,
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 14] = [
        Category::Beverage,
        Category::Snack,
        Category::Grocery,
        Category::HomeProduct,
        Category::PersonalCare,
        Category::CleaningSupplies,
        Category::Stationery,
        Category::Electronics,
        Category::Medicine,
        Category::BabyProducts,
        Category::PetSupplies,
        Category::FrozenFood,
        Category::Bakery,
        Category::Other,
    ];

    /// Returns the display label (also the stored form).
    pub const fn label(&self) -> &'static str {
        match self {
            Category::Beverage => "Beverage",
            Category::Snack => "Snack",
            Category::Grocery => "Grocery",
            Category::HomeProduct => "Home Product",
            Category::PersonalCare => "Personal Care",
            Category::CleaningSupplies => "Cleaning Supplies",
            Category::Stationery => "Stationery",
            Category::Electronics => "Electronics",
            Category::Medicine => "Medicine",
            Category::BabyProducts => "Baby Products",
            Category::PetSupplies => "Pet Supplies",
            Category::FrozenFood => "Frozen Food",
            Category::Bakery => "Bakery",
            Category::Other => "Other",
        }
    }

    /// Resolves a raw label case-insensitively.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::types::Category;
    ///
    /// assert_eq!(Category::resolve("beverage"), Some(Category::Beverage));
    /// assert_eq!(Category::resolve("FROZEN FOOD"), Some(Category::FrozenFood));
    /// assert_eq!(Category::resolve("gadgets"), None);
    /// ```
    pub fn resolve(raw: &str) -> Option<Category> {
        let raw = raw.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(raw))
    }

    /// Resolves a raw label, falling back to `Other` (bulk-intake policy).
    pub fn resolve_or_other(raw: &str) -> Category {
        Category::resolve(raw).unwrap_or(Category::Other)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Stock Status
// =============================================================================

/// Derived stock status of a product.
///
/// ## Single Source of Truth
/// `status` is a pure function of `(quantity, threshold)`. The *only*
/// producer of a status value in the entire workspace is
/// [`StockStatus::derive`]; repositories persist its result for reporting
/// queries but must recompute it at every quantity mutation, and the
/// periodic sweep re-derives it with the same function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum StockStatus {
    /// quantity > threshold
    #[serde(rename = "In Stock")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "In Stock"))]
    InStock,
    /// 0 < quantity <= threshold
    #[serde(rename = "Low Stock")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Low Stock"))]
    LowStock,
    /// quantity == 0
    #[serde(rename = "Out of Stock")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Out of Stock"))]
    OutOfStock,
}

impl StockStatus {
    /// Derives the status from current quantity and reorder threshold.
    ///
    /// `quantity == 0` → OutOfStock; `0 < quantity <= threshold` → LowStock;
    /// otherwise InStock.
    pub fn derive(quantity: i64, threshold: i64) -> StockStatus {
        if quantity == 0 {
            StockStatus::OutOfStock
        } else if quantity <= threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    /// Returns the display label (also the stored form).
    pub const fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Transaction Type
// =============================================================================

/// Direction of a ledger entry.
///
/// Quantities are stored positive; the sign is implied by the type
/// (PURCHASE adds stock, SALE removes it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Purchase,
    Sale,
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Payment status of an invoice. Unpaid on creation; the only permitted
/// transition is Unpaid → Paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Unpaid
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product, owned by exactly one tenant.
///
/// Created on first purchase intake (single or bulk); mutated by every
/// subsequent sale or restock. The core never deletes products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this product belongs to.
    pub tenant_id: String,

    /// Business identifier, unique per tenant (not globally).
    pub code: String,

    /// Display name.
    pub name: String,

    /// Category from the fixed enumerated set.
    pub category: Category,

    /// Unit price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Current stock level. Never negative.
    pub quantity: i64,

    /// Unit of measure ("pcs", "kg", ...).
    pub unit: String,

    /// Optional expiry date.
    pub expiry_date: Option<NaiveDate>,

    /// Reorder threshold; at or below it the product is LowStock.
    pub threshold: i64,

    /// Derived status, persisted for reporting. See [`StockStatus::derive`].
    pub status: StockStatus,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Re-derives the status from the canonical fields.
    #[inline]
    pub fn derived_status(&self) -> StockStatus {
        StockStatus::derive(self.quantity, self.threshold)
    }

    /// Checks whether a sale of `quantity` units can be filled from stock.
    pub fn can_fill(&self, quantity: i64) -> bool {
        quantity <= self.quantity
    }
}

// =============================================================================
// New Product Spec
// =============================================================================

/// Input for first-creation purchase intake.
///
/// The category arrives as a raw label: single-item creation resolves it
/// strictly, bulk intake resolves it with the `Other` fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub quantity: i64,
    pub unit: String,
    pub expiry_date: Option<NaiveDate>,
    pub threshold: i64,
}

// =============================================================================
// Stock Transaction (Ledger Entry)
// =============================================================================

/// One immutable ledger entry.
///
/// ## Append-Only Contract
/// Entries are created and read, never updated or deleted. For any product,
/// the sum of PURCHASE quantities minus SALE quantities over entries created
/// at or before time T equals the product's quantity as of T.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockTransaction {
    pub id: String,
    pub tenant_id: String,
    /// The product this entry moves stock for.
    pub product_id: String,
    /// Units moved; always stored positive.
    pub quantity: i64,
    /// quantity × unit price at transaction time.
    pub amount_cents: i64,
    pub tx_type: TransactionType,
    pub created_at: DateTime<Utc>,
}

impl StockTransaction {
    /// Returns the monetary amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Signed stock delta implied by this entry.
    pub fn stock_delta(&self) -> i64 {
        match self.tx_type {
            TransactionType::Purchase => self.quantity,
            TransactionType::Sale => -self.quantity,
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// An invoice minted as the side effect of exactly one SALE transaction.
///
/// Uses the snapshot pattern: unit price is frozen at sale time so later
/// price changes never rewrite an issued invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: String,
    pub tenant_id: String,
    /// Globally unique, strictly increasing: INV-1001, INV-1002, ...
    pub invoice_number: String,
    pub product_id: String,
    /// Units sold.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// quantity × unit_price_cents.
    pub amount_cents: i64,
    pub status: InvoiceStatus,
    /// created_at + the fixed due offset.
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns the invoiced amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
