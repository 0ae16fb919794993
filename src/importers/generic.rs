//! Fallback importer for unrecognized header-based exports.
//!
//! Accepts any file whose headers look like they carry a date column and
//! an amount column, then resolves each logical field through an ordered
//! alias list covering the English and Spanish header names seen in the
//! wild.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::importers::BankImporter;
use crate::types::{CellValue, ImportError, ImportResult, ParsedLine, RawRow};
use crate::utils::{normalize_header, to_date, to_number};

// Token-boundary match inside the underscore-joined normalized header:
// "fecha_valor" is date-ish, "confecha" is not.
static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|_)(date|fecha)(_|$)").unwrap());
static AMOUNT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|_)(amount|monto|valor)(_|$)").unwrap());

const DATE_ALIASES: &[&str] = &["date", "fecha"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "descripcion", "detalle", "concepto"];
const REFERENCE_ALIASES: &[&str] = &["reference", "ref", "referencia", "nro_documento"];
const AMOUNT_ALIASES: &[&str] = &["amount", "monto", "valor", "importe", "debito_credito"];
const BALANCE_ALIASES: &[&str] = &["balance", "saldo"];

/// Header-driven fallback importer, registered last in the default
/// registry
pub struct GenericImporter;

impl GenericImporter {
    fn lookup<'a>(
        row: &'a HashMap<String, &'a CellValue>,
        aliases: &[&str],
    ) -> Option<&'a CellValue> {
        aliases.iter().find_map(|alias| row.get(*alias).copied())
    }

    fn parse_row(row: &RawRow) -> Option<ParsedLine> {
        let normalized: HashMap<String, &CellValue> = row
            .iter()
            .map(|(header, value)| (normalize_header(header), value))
            .collect();

        let date = Self::lookup(&normalized, DATE_ALIASES).and_then(to_date)?;
        let amount = Self::lookup(&normalized, AMOUNT_ALIASES).and_then(to_number)?;

        Some(ParsedLine {
            date,
            description: Self::lookup(&normalized, DESCRIPTION_ALIASES).and_then(cell_text),
            reference: Self::lookup(&normalized, REFERENCE_ALIASES).and_then(cell_text),
            amount,
            balance: Self::lookup(&normalized, BALANCE_ALIASES).and_then(to_number),
            external_id: None,
        })
    }
}

fn cell_text(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        CellValue::Number(n) => Some(n.to_string()),
        CellValue::Date(d) => Some(d.to_string()),
    }
}

impl BankImporter for GenericImporter {
    fn bank(&self) -> &str {
        "Generic"
    }

    fn can_handle(&self, _file_name: &str, sample: &[RawRow]) -> bool {
        let headers: Vec<String> = sample
            .iter()
            .flat_map(|row| row.keys())
            .map(|header| normalize_header(header))
            .collect();
        headers.iter().any(|h| DATE_TOKEN.is_match(h))
            && headers.iter().any(|h| AMOUNT_TOKEN.is_match(h))
    }

    fn parse(&self, rows: &[RawRow]) -> ImportResult<Vec<ParsedLine>> {
        let lines: Vec<ParsedLine> = rows.iter().filter_map(Self::parse_row).collect();
        if lines.is_empty() {
            return Err(ImportError::Validation(
                "no valid lines could be parsed from the file".to_string(),
            ));
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
            .collect()
    }

    #[test]
    fn test_can_handle_needs_date_and_amount_headers() {
        let importer = GenericImporter;
        assert!(importer.can_handle("f.csv", &[row(&[("Fecha", "x"), ("Valor", "y")])]));
        assert!(importer.can_handle("f.csv", &[row(&[("Date", "x"), ("Amount", "y")])]));
        assert!(!importer.can_handle("f.csv", &[row(&[("Id", "1"), ("Nombre", "a")])]));
        assert!(!importer.can_handle("f.csv", &[row(&[("Fecha", "x"), ("Nombre", "a")])]));
        assert!(!importer.can_handle("f.csv", &[]));
    }

    #[test]
    fn test_can_handle_token_boundaries() {
        let importer = GenericImporter;
        // "fecha_valor" satisfies both token patterns on its own
        assert!(importer.can_handle("f.csv", &[row(&[("Fecha Válor", "x")])]));
        // embedded tokens without a boundary do not count
        assert!(!importer.can_handle("f.csv", &[row(&[("confecha", "x"), ("disvalores", "y")])]));
    }

    #[test]
    fn test_parse_spanish_headers() {
        let importer = GenericImporter;
        let rows = vec![
            row(&[
                ("Fecha", "2024-03-01"),
                ("Descripcion", "Pago"),
                ("Valor", "100000"),
            ]),
            row(&[
                ("Fecha", "2024-03-02"),
                ("Descripcion", "Compra"),
                ("Valor", "-50000"),
            ]),
        ];
        let lines = importer.parse(&rows).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(lines[0].description.as_deref(), Some("Pago"));
        assert_eq!(lines[0].amount, 100000.0);
        assert_eq!(lines[1].amount, -50000.0);
    }

    #[test]
    fn test_parse_skips_unusable_rows() {
        let importer = GenericImporter;
        let rows = vec![
            row(&[("Date", "2024-01-05"), ("Amount", "10.50")]),
            row(&[("Date", "not-a-date"), ("Amount", "10.50")]),
            row(&[("Date", "2024-01-06"), ("Amount", "garbage")]),
        ];
        let lines = importer.parse(&rows).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].amount, 10.5);
    }

    #[test]
    fn test_parse_all_garbage_is_validation_error() {
        let importer = GenericImporter;
        let rows = vec![row(&[("Date", "nope"), ("Amount", "nope")])];
        let err = importer.parse(&rows).unwrap_err();
        assert!(matches!(err, ImportError::Validation(_)));
    }

    #[test]
    fn test_parse_optional_fields() {
        let importer = GenericImporter;
        let rows = vec![row(&[
            ("Fecha", "01/03/2024"),
            ("Referencia", "DOC-99"),
            ("Monto", "1.234,56"),
            ("Saldo", "10.000,00"),
        ])];
        let lines = importer.parse(&rows).unwrap();
        assert_eq!(lines[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(lines[0].reference.as_deref(), Some("DOC-99"));
        assert_eq!(lines[0].amount, 1234.56);
        assert_eq!(lines[0].balance, Some(10000.0));
        assert_eq!(lines[0].description, None);
        assert_eq!(lines[0].external_id, None);
    }
}
