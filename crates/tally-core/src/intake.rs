//! # Bulk Intake Parser
//!
//! Validates and normalizes tabular stock-intake data (header row + data
//! rows) into per-row purchase specs. Operates on in-memory text only; the
//! file-upload handler that produced the text is an external collaborator.
//!
//! ## Parsing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Intake Parsing Pipeline                            │
//! │                                                                         │
//! │  raw text                                                              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Header resolution (aliases, case/space/underscore-insensitive)        │
//! │     │   any mandatory column unresolved → MissingColumn, nothing runs  │
//! │     ▼                                                                   │
//! │  Per row, in file order:                                               │
//! │     1. mandatory fields non-empty    → else MissingRowField (abort)    │
//! │     2. quantity/threshold/price parse → else InvalidNumeric (abort)    │
//! │     3. expiry date: three shapes; unparseable → no expiry, no error    │
//! │     4. category: resolve or default to Other                           │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  IntakeRow (typed) → applied as a purchase by tally-service            │
//! │                                                                         │
//! │  Steps 1-2 are FAIL-FAST: they abort the remaining import.             │
//! │  Application failures (duplicate code) are per-row and recoverable;    │
//! │  that policy lives in tally-service, not here.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Accepted Header Spellings
//! Matching ignores case, spaces, and underscores ("Product ID" == "productid"):
//!
//! | logical column | spellings            | mandatory |
//! |----------------|----------------------|-----------|
//! | name           | name, productname    | yes       |
//! | product code   | productid, sku, code | yes       |
//! | price          | price, cost          | yes       |
//! | quantity       | quantity, qty        | yes       |
//! | unit           | unit                 | yes       |
//! | threshold      | threshold, minstock  | yes       |
//! | category       | category             | no        |
//! | expiry date    | expirydate, expiry   | no        |

use chrono::{Days, NaiveDate};
use csv::StringRecord;
use thiserror::Error;

use crate::money::Money;
use crate::types::{Category, NewProduct};

// =============================================================================
// Constants
// =============================================================================

/// A bare number above this value is treated as a day-count serial date.
/// Smaller numbers are ambiguous with plain integers and yield "no expiry".
const SERIAL_DATE_THRESHOLD: f64 = 30000.0;

/// Field labels used in error messages, paired with accepted spellings
/// (pre-normalized: lowercase, no spaces or underscores).
const HEADER_ALIASES: &[(&str, &[&str])] = &[
    ("name", &["name", "productname"]),
    ("product code", &["productid", "sku", "code"]),
    ("price", &["price", "cost"]),
    ("quantity", &["quantity", "qty"]),
    ("unit", &["unit"]),
    ("threshold", &["threshold", "minstock"]),
    ("category", &["category"]),
    ("expiry date", &["expirydate", "expiry"]),
];

// =============================================================================
// Errors
// =============================================================================

/// Structural intake failures. Every variant aborts the import; recoverable
/// per-row application failures are not represented here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    /// No header or no data rows.
    #[error("intake file is empty")]
    EmptyFile,

    /// A mandatory column could not be resolved from the header row.
    #[error("mandatory column missing: {field}")]
    MissingColumn { field: &'static str },

    /// A data row has an empty mandatory field.
    #[error("row {row} missing mandatory field: {field}")]
    MissingRowField { row: usize, field: &'static str },

    /// quantity, threshold, or price failed to parse as a number.
    #[error("row {row} has invalid numeric value")]
    InvalidNumeric { row: usize },

    /// The text is not parseable as tabular data at all.
    #[error("invalid intake data: {0}")]
    Malformed(String),
}

// =============================================================================
// Header Map
// =============================================================================

/// Resolved column positions for one intake file.
#[derive(Debug, Clone)]
struct HeaderMap {
    name: usize,
    code: usize,
    price: usize,
    quantity: usize,
    unit: usize,
    threshold: usize,
    category: Option<usize>,
    expiry: Option<usize>,
}

impl HeaderMap {
    /// Resolves the header row against the alias table.
    ///
    /// Fails with the *first* unresolvable mandatory column, in table order,
    /// before any data row is looked at.
    fn resolve(headers: &StringRecord) -> Result<HeaderMap, IntakeError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();

        let position = |field: &str| -> Option<usize> {
            let aliases = HEADER_ALIASES
                .iter()
                .find(|(label, _)| *label == field)
                .map(|(_, aliases)| *aliases)
                .unwrap_or(&[]);
            normalized
                .iter()
                .position(|h| aliases.contains(&h.as_str()))
        };

        let mandatory = |field: &'static str| -> Result<usize, IntakeError> {
            position(field).ok_or(IntakeError::MissingColumn { field })
        };

        Ok(HeaderMap {
            name: mandatory("name")?,
            code: mandatory("product code")?,
            price: mandatory("price")?,
            quantity: mandatory("quantity")?,
            unit: mandatory("unit")?,
            threshold: mandatory("threshold")?,
            category: position("category"),
            expiry: position("expiry date"),
        })
    }

    /// Mandatory columns in error-reporting order.
    fn mandatory(&self) -> [(&'static str, usize); 6] {
        [
            ("name", self.name),
            ("product code", self.code),
            ("price", self.price),
            ("quantity", self.quantity),
            ("unit", self.unit),
            ("threshold", self.threshold),
        ]
    }
}

/// Normalizes a header cell: lowercase, spaces and underscores stripped.
fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// Intake Row
// =============================================================================

/// One validated, normalized data row, ready to apply as a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeRow {
    /// 1-based file row number (the header is row 1).
    pub row: usize,
    pub code: String,
    pub name: String,
    pub category: Category,
    pub price_cents: i64,
    pub quantity: i64,
    pub unit: String,
    pub threshold: i64,
    pub expiry_date: Option<NaiveDate>,
}

impl IntakeRow {
    /// Converts into a new-product spec for the purchase path.
    pub fn into_spec(self) -> NewProduct {
        NewProduct {
            code: self.code,
            name: self.name,
            category: self.category.label().to_string(),
            price_cents: self.price_cents,
            quantity: self.quantity,
            unit: self.unit,
            expiry_date: self.expiry_date,
            threshold: self.threshold,
        }
    }
}

// =============================================================================
// Intake Sheet
// =============================================================================

/// A parsed intake file: resolved header plus raw data records.
///
/// Construction fails on header problems; row-level structural problems
/// surface lazily from [`IntakeSheet::rows`] so the caller can apply rows in
/// file order and stop at the first structural error, leaving earlier rows
/// applied (fail-fast, not rollback).
#[derive(Debug)]
pub struct IntakeSheet {
    header: HeaderMap,
    records: Vec<StringRecord>,
}

impl IntakeSheet {
    /// Parses raw tabular text and resolves the header row.
    ///
    /// ## Errors
    /// - [`IntakeError::EmptyFile`] - no header or no data rows
    /// - [`IntakeError::MissingColumn`] - a mandatory column is unresolvable
    /// - [`IntakeError::Malformed`] - the text is not tabular at all
    pub fn parse(raw: &str) -> Result<IntakeSheet, IntakeError> {
        if raw.trim().is_empty() {
            return Err(IntakeError::EmptyFile);
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(raw.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| IntakeError::Malformed(e.to_string()))?
            .clone();

        let header = HeaderMap::resolve(&headers)?;

        let records: Vec<StringRecord> = reader
            .records()
            .collect::<Result<_, _>>()
            .map_err(|e| IntakeError::Malformed(e.to_string()))?;

        if records.is_empty() {
            return Err(IntakeError::EmptyFile);
        }

        Ok(IntakeSheet { header, records })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates data rows in file order.
    ///
    /// Each item is either a normalized [`IntakeRow`] or the structural
    /// error that must abort the remaining import.
    pub fn rows(&self) -> impl Iterator<Item = Result<IntakeRow, IntakeError>> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| self.parse_row(i + 2, record))
    }

    /// Validates and normalizes one data row.
    fn parse_row(&self, row: usize, record: &StringRecord) -> Result<IntakeRow, IntakeError> {
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let optional_cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

        for (field, idx) in self.header.mandatory() {
            if cell(idx).is_empty() {
                return Err(IntakeError::MissingRowField { row, field });
            }
        }

        let quantity = parse_count(cell(self.header.quantity))
            .filter(|n| *n > 0)
            .ok_or(IntakeError::InvalidNumeric { row })?;
        let threshold = parse_count(cell(self.header.threshold))
            .ok_or(IntakeError::InvalidNumeric { row })?;
        let price = Money::parse(cell(self.header.price))
            .ok_or(IntakeError::InvalidNumeric { row })?;

        Ok(IntakeRow {
            row,
            code: cell(self.header.code).to_string(),
            name: cell(self.header.name).to_string(),
            category: Category::resolve_or_other(optional_cell(self.header.category)),
            price_cents: price.cents(),
            quantity,
            unit: cell(self.header.unit).to_string(),
            threshold,
            expiry_date: parse_expiry_date(optional_cell(self.header.expiry)),
        })
    }
}

/// Parses a non-negative integer count. Quantities are additionally
/// required to be positive at the call site; a zero intake row cannot
/// produce a ledger entry.
fn parse_count(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|n| *n >= 0)
}

// =============================================================================
// Expiry Date Parsing
// =============================================================================

/// Parses an optional expiry date from intake data.
///
/// Three input shapes are supported, tried in this order:
/// 1. A bare number above the serial threshold: day-count from the
///    1899-12-30 epoch (spreadsheet serial, e.g. `45291` → 2023-12-31).
///    Numbers at or below the threshold are plain integers, not dates.
/// 2. ISO `YYYY-MM-DD`.
/// 3. `DD-MM-YYYY` or `DD/MM/YYYY`.
///
/// Absent or unparseable values yield `None` - never an error.
pub fn parse_expiry_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(n) = raw.parse::<f64>() {
        if n.is_finite() && n > SERIAL_DATE_THRESHOLD {
            return from_day_serial(n.trunc() as i64);
        }
        return None;
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d-%m-%Y"))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

/// Converts a day-count serial into a calendar date.
///
/// Epoch 1899-12-30 absorbs the historical off-by-two of spreadsheet
/// serials (1900 leap-year bug plus 1-based counting).
fn from_day_serial(days: i64) -> Option<NaiveDate> {
    if days < 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_days(Days::new(days as u64)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
name,productId,category,price,quantity,unit,expiryDate,threshold
Coca-Cola 330ml,COKE-330,Beverage,0.99,48,pcs,2024-03-15,12
Basmati Rice 5kg,RICE-5K,Grocery,12.50,20,bag,,5
";

    #[test]
    fn test_happy_path() {
        let sheet = IntakeSheet::parse(SHEET).unwrap();
        assert_eq!(sheet.len(), 2);

        let rows: Vec<IntakeRow> = sheet.rows().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].code, "COKE-330");
        assert_eq!(rows[0].category, Category::Beverage);
        assert_eq!(rows[0].price_cents, 99);
        assert_eq!(rows[0].quantity, 48);
        assert_eq!(
            rows[0].expiry_date,
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );

        assert_eq!(rows[1].row, 3);
        assert_eq!(rows[1].price_cents, 1250);
        assert_eq!(rows[1].expiry_date, None);
    }

    #[test]
    fn test_header_aliases_are_insensitive() {
        let sheet = IntakeSheet::parse(
            "Product Name,SKU,Cost,QTY,Unit,min_stock\nWidget,W-1,1.00,5,pcs,2\n",
        )
        .unwrap();
        let rows: Vec<IntakeRow> = sheet.rows().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows[0].name, "Widget");
        assert_eq!(rows[0].code, "W-1");
        assert_eq!(rows[0].price_cents, 100);
        assert_eq!(rows[0].threshold, 2);
        // No category column resolved: defaults to Other
        assert_eq!(rows[0].category, Category::Other);
    }

    #[test]
    fn test_missing_mandatory_column_fails_before_rows() {
        // No quantity/qty column at all
        let err = IntakeSheet::parse("name,productId,price,unit,threshold\nA,B,1,pcs,0\n")
            .unwrap_err();
        assert_eq!(err, IntakeError::MissingColumn { field: "quantity" });
    }

    #[test]
    fn test_missing_row_field_is_fail_fast() {
        let sheet = IntakeSheet::parse(
            "name,productId,price,quantity,unit,threshold\nA,A-1,1.00,5,pcs,1\nB,,2.00,3,pcs,1\n",
        )
        .unwrap();

        let mut rows = sheet.rows();
        assert!(rows.next().unwrap().is_ok());
        assert_eq!(
            rows.next().unwrap().unwrap_err(),
            IntakeError::MissingRowField {
                row: 3,
                field: "product code"
            }
        );
    }

    #[test]
    fn test_invalid_numeric_aborts() {
        let sheet = IntakeSheet::parse(
            "name,productId,price,quantity,unit,threshold\nA,A-1,1.00,many,pcs,1\n",
        )
        .unwrap();
        assert_eq!(
            sheet.rows().next().unwrap().unwrap_err(),
            IntakeError::InvalidNumeric { row: 2 }
        );
    }

    #[test]
    fn test_zero_quantity_is_invalid() {
        let sheet = IntakeSheet::parse(
            "name,productId,price,quantity,unit,threshold\nA,A-1,1.00,0,pcs,1\n",
        )
        .unwrap();
        assert_eq!(
            sheet.rows().next().unwrap().unwrap_err(),
            IntakeError::InvalidNumeric { row: 2 }
        );
    }

    #[test]
    fn test_unknown_category_defaults_to_other() {
        let sheet = IntakeSheet::parse(
            "name,productId,category,price,quantity,unit,threshold\nA,A-1,Gadgets,1.00,5,pcs,1\n",
        )
        .unwrap();
        let row = sheet.rows().next().unwrap().unwrap();
        assert_eq!(row.category, Category::Other);
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(IntakeSheet::parse("").unwrap_err(), IntakeError::EmptyFile);
        assert_eq!(
            IntakeSheet::parse("name,productId,price,quantity,unit,threshold\n").unwrap_err(),
            IntakeError::EmptyFile
        );
    }

    #[test]
    fn test_expiry_iso() {
        assert_eq!(
            parse_expiry_date("2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn test_expiry_day_first() {
        assert_eq!(
            parse_expiry_date("15-03-2024"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(
            parse_expiry_date("15/03/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn test_expiry_serial() {
        // 45291 days past 1899-12-30
        assert_eq!(
            parse_expiry_date("45291"),
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
    }

    #[test]
    fn test_expiry_small_number_is_not_a_date() {
        assert_eq!(parse_expiry_date("123"), None);
        assert_eq!(parse_expiry_date("30000"), None);
    }

    #[test]
    fn test_expiry_garbage_is_no_expiry() {
        assert_eq!(parse_expiry_date("not-a-date"), None);
        assert_eq!(parse_expiry_date(""), None);
        assert_eq!(parse_expiry_date("2024-99-99"), None);
    }

    #[test]
    fn test_into_spec_carries_resolved_category_label() {
        let sheet = IntakeSheet::parse(SHEET).unwrap();
        let spec = sheet.rows().next().unwrap().unwrap().into_spec();
        assert_eq!(spec.category, "Beverage");
        assert_eq!(spec.price_cents, 99);
    }
}
