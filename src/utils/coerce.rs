//! Total, non-throwing coercion of ambiguous cell values into typed ones.
//!
//! Bank exports mix locales freely: `1.234,56` and `1,234.56` are the same
//! amount, `31/01/2024` and `2024-01-31` the same date. Both coercers
//! return `None` instead of failing, so the caller decides whether a row
//! is usable.

use chrono::NaiveDate;

use crate::types::CellValue;

/// Coerce a cell into a finite number.
///
/// Strips everything except digits, `,`, `.` and `-`. When both `,` and
/// `.` occur, the rightmost occurrence is the decimal mark and all
/// occurrences of the other symbol are removed; a lone `,` is treated as
/// the decimal mark. Non-finite results are absent.
pub fn to_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) => n.is_finite().then_some(*n),
        CellValue::Date(_) => None,
        CellValue::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            let candidate = match (cleaned.rfind(','), cleaned.rfind('.')) {
                (Some(comma), Some(dot)) => {
                    if comma > dot {
                        cleaned.replace('.', "").replace(',', ".")
                    } else {
                        cleaned.replace(',', "")
                    }
                }
                (Some(_), None) => cleaned.replace(',', "."),
                _ => cleaned,
            };
            candidate.parse::<f64>().ok().filter(|n| n.is_finite())
        }
    }
}

// ISO forms first, then the explicit day-first reinterpretation of
// slash/dash dates, then a dotted fallback. Ambiguous DD/MM vs MM/DD is
// resolved day-first, matching the exports this crate targets; US-style
// files with both components <= 12 will misparse.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Coerce a cell into a calendar date.
///
/// Native date cells pass through unchanged; text is tried against ISO
/// and day-first formats. Unparseable or empty input is absent.
pub fn to_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(_) => None,
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        }
    }
}
