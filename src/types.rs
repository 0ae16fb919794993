//! Core types and data structures for the statement import system

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A single cell value as decoded from a CSV or spreadsheet file.
///
/// Spreadsheet cells can carry native numbers and dates; CSV cells are
/// always text. Absence is modeled by the key not being present in the
/// [`RawRow`] map, so every `CellValue` holds an actual value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Textual cell content, already trimmed
    Text(String),
    /// Numeric cell content (spreadsheet number cells)
    Number(f64),
    /// Calendar date (spreadsheet date cells)
    Date(NaiveDate),
}

/// One decoded file row: original header string → cell value.
///
/// Transient and request-scoped; rows never outlive a single import call.
pub type RawRow = HashMap<String, CellValue>;

/// One transaction line as produced by a [`crate::importers::BankImporter`].
///
/// Transient until re-validated and persisted by the import service.
/// The amount sign convention is bank-specific and left as parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// Transaction date
    pub date: NaiveDate,
    /// Free-text description, if the source provides one
    pub description: Option<String>,
    /// Bank reference or document number
    pub reference: Option<String>,
    /// Signed transaction amount
    pub amount: f64,
    /// Running balance after the transaction, if provided
    pub balance: Option<f64>,
    /// Source-provided dedup key, if provided
    pub external_id: Option<String>,
}

/// Lifecycle status of a persisted statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementStatus {
    /// Successfully imported; the only status this crate writes
    Imported,
    /// Reserved for the future reconciliation feature
    Reconciled,
}

/// One imported bank-account extract covering a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankStatement {
    /// Unique identifier for the statement
    pub id: Uuid,
    /// Display name of the importer that produced the statement
    pub bank: String,
    /// Account number, when the caller supplies it
    pub account_number: Option<String>,
    /// ISO currency code, when the caller supplies it
    pub currency: Option<String>,
    /// File name of the original upload
    pub original_file_name: String,
    /// SHA-256 hex digest of the raw uploaded bytes; globally unique,
    /// this is the idempotency key for duplicate uploads
    pub file_hash: String,
    /// Earliest line date (or caller override)
    pub start_date: NaiveDate,
    /// Latest line date (or caller override)
    pub end_date: NaiveDate,
    /// Lifecycle status
    pub status: StatementStatus,
    /// When the statement was imported
    pub uploaded_at: NaiveDateTime,
}

/// One transaction row belonging to a persisted statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankStatementLine {
    /// Unique identifier for the line
    pub id: Uuid,
    /// Owning statement; lines are cascade-deleted with their parent
    pub statement_id: Uuid,
    /// Transaction date
    pub date: NaiveDate,
    /// Free-text description
    pub description: Option<String>,
    /// Bank reference or document number
    pub reference: Option<String>,
    /// Signed transaction amount
    pub amount: BigDecimal,
    /// Running balance after the transaction
    pub balance: Option<BigDecimal>,
    /// Source-provided dedup key
    pub external_id: Option<String>,
    /// Reserved for the future reconciliation feature; never set here
    pub match_score: Option<f64>,
    /// Reserved for the future reconciliation feature; never set here
    pub matched_line_id: Option<Uuid>,
}

/// Caller-supplied knobs for a single import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Explicit bank name; when set, importer selection by name wins
    /// unconditionally over heuristic detection
    pub bank: Option<String>,
    /// Account number to stamp onto the statement
    pub account_number: Option<String>,
    /// Currency code to stamp onto the statement
    pub currency: Option<String>,
    /// Overrides the derived min-date of the statement
    pub start_date: Option<NaiveDate>,
    /// Overrides the derived max-date of the statement
    pub end_date: Option<NaiveDate>,
}

/// Result summary of a successful import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub statement_id: Uuid,
    pub bank: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub lines_imported: usize,
    pub status: StatementStatus,
}

/// One page of statements plus the total match count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementPage {
    pub statements: Vec<BankStatement>,
    pub total: usize,
}

/// A statement together with its lines, ordered by (date, id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementWithLines {
    pub statement: BankStatement,
    pub lines: Vec<BankStatementLine>,
}

/// Errors that can occur in the import system
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_for_transport() {
        let summary = ImportSummary {
            statement_id: Uuid::nil(),
            bank: "Generic".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            lines_imported: 2,
            status: StatementStatus::Imported,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["bank"], "Generic");
        assert_eq!(json["lines_imported"], 2);
        assert_eq!(json["start_date"], "2024-03-01");
    }

    #[test]
    fn test_cell_value_untagged_json() {
        let row: RawRow = serde_json::from_str(r#"{"Fecha":"2024-03-01","Valor":100.5}"#).unwrap();
        assert_eq!(
            row.get("Fecha"),
            Some(&CellValue::Text("2024-03-01".to_string()))
        );
        assert_eq!(row.get("Valor"), Some(&CellValue::Number(100.5)));
    }
}
