//! File ingestion: format detection and decoding of uploads into raw rows.
//!
//! The upload transport hands this module an already-decoded byte buffer
//! plus the original file name and mimetype; multipart parsing happens
//! upstream. Both the CSV and the spreadsheet path produce the same
//! `Vec<RawRow>` so every importer sees one uniform row shape.

use std::io::Cursor;

use calamine::{Data, Reader};

use crate::types::{CellValue, ImportError, ImportResult, RawRow};

/// An uploaded statement file as received from the transport layer
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Raw file content
    pub bytes: Vec<u8>,
    /// Original file name, used for extension-based detection
    pub file_name: String,
    /// Mimetype as reported by the transport
    pub mime_type: String,
}

impl UploadedFile {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Excel,
}

/// Detect the file kind: extension first, then mimetype substring,
/// defaulting to CSV.
pub fn detect_kind(file_name: &str, mime_type: &str) -> FileKind {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".csv") {
        return FileKind::Csv;
    }
    if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        return FileKind::Excel;
    }
    let mime = mime_type.to_lowercase();
    if mime.contains("spreadsheet") {
        FileKind::Excel
    } else {
        // csv and text mimetypes, and anything unknown, default to CSV
        FileKind::Csv
    }
}

/// Decode an uploaded file into a uniform sequence of raw rows.
///
/// The first row provides the headers. Rows with a column count that
/// differs from the header row are tolerated: extra cells are dropped and
/// missing cells are absent. Blank cells and blank lines are skipped.
pub fn read_rows(file: &UploadedFile) -> ImportResult<Vec<RawRow>> {
    match detect_kind(&file.file_name, &file.mime_type) {
        FileKind::Csv => read_csv_rows(&file.bytes),
        FileKind::Excel => read_excel_rows(&file.bytes),
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

fn read_csv_rows(bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
    let data = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        // Undecodable records are noise, not a fatal error
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(record = index, "skipping undecodable csv record: {e}");
                continue;
            }
        };
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        match &headers {
            None => {
                headers = Some(record.iter().map(|h| h.trim().to_string()).collect());
            }
            Some(names) => {
                let mut row = RawRow::new();
                for (name, cell) in names.iter().zip(record.iter()) {
                    let cell = cell.trim();
                    if !name.is_empty() && !cell.is_empty() {
                        row.insert(name.clone(), CellValue::Text(cell.to_string()));
                    }
                }
                rows.push(row);
            }
        }
    }
    Ok(rows)
}

fn read_excel_rows(bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| ImportError::Validation(format!("could not read workbook: {e}")))?;

    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::Validation("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| ImportError::Validation(format!("could not read worksheet: {e}")))?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for sheet_row in sheet_rows {
        let mut row = RawRow::new();
        for (name, cell) in headers.iter().zip(sheet_row.iter()) {
            if name.is_empty() {
                continue;
            }
            if let Some(value) = cell_value(cell) {
                row.insert(name.clone(), value);
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Convert a spreadsheet cell into the uniform `CellValue` shape.
///
/// Date cells are converted to calendar dates here so the downstream
/// coercers never see Excel serial numbers.
fn cell_value(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| CellValue::Text(trimmed.to_string()))
        }
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Text(b.to_string())),
        Data::DateTime(dt) => dt.as_datetime().map(|d| CellValue::Date(d.date())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_file(content: &str) -> UploadedFile {
        UploadedFile::new(content.as_bytes().to_vec(), "test.csv", "text/csv")
    }

    #[test]
    fn test_detect_kind_extension_wins() {
        assert_eq!(detect_kind("export.csv", "application/octet-stream"), FileKind::Csv);
        assert_eq!(detect_kind("export.XLSX", "text/csv"), FileKind::Excel);
        assert_eq!(detect_kind("export.xls", ""), FileKind::Excel);
    }

    #[test]
    fn test_detect_kind_mimetype_fallback() {
        assert_eq!(
            detect_kind(
                "export",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            FileKind::Excel
        );
        assert_eq!(detect_kind("export", "text/plain"), FileKind::Csv);
        assert_eq!(detect_kind("export", "application/unknown"), FileKind::Csv);
    }

    #[test]
    fn test_read_csv_basic() {
        let rows = read_rows(&csv_file("Fecha,Valor\n2024-03-01,100\n2024-03-02,-50\n")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("Fecha"),
            Some(&CellValue::Text("2024-03-01".to_string()))
        );
        assert_eq!(rows[1].get("Valor"), Some(&CellValue::Text("-50".to_string())));
    }

    #[test]
    fn test_read_csv_bom_and_blank_lines() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Date,Amount\n\n2024-01-01,10\n");
        let rows = read_rows(&UploadedFile::new(bytes, "test.csv", "text/csv")).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains_key("Date"));
    }

    #[test]
    fn test_read_csv_ragged_rows() {
        let rows = read_rows(&csv_file(
            "Date,Amount,Note\n2024-01-01,10\n2024-01-02,20,hello,extra\n",
        ))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].contains_key("Note"));
        assert_eq!(
            rows[1].get("Note"),
            Some(&CellValue::Text("hello".to_string()))
        );
    }

    #[test]
    fn test_read_csv_skips_undecodable_records() {
        let mut bytes = b"Date,Amount\n2024-01-01,10\n".to_vec();
        bytes.extend_from_slice(b"2024-01-02,\xff\xfe\n");
        bytes.extend_from_slice(b"2024-01-03,20\n");
        let rows = read_rows(&UploadedFile::new(bytes, "test.csv", "text/csv")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1].get("Amount"),
            Some(&CellValue::Text("20".to_string()))
        );
    }

    #[test]
    fn test_read_csv_empty_cells_absent() {
        let rows = read_rows(&csv_file("Date,Amount\n2024-01-01,\n")).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("Amount"));
    }

    const XLSX_MIME: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

    #[test]
    fn test_read_excel_first_sheet_only() {
        let bytes = include_bytes!("../../tests/fixtures/extracto.xlsx").to_vec();
        let rows = read_rows(&UploadedFile::new(bytes, "extracto.xlsx", XLSX_MIME)).unwrap();

        // two data rows from "Movimientos"; the "Resumen" sheet is ignored
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("Fecha"),
            Some(&CellValue::Date(
                chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            ))
        );
        assert_eq!(
            rows[0].get("Descripcion"),
            Some(&CellValue::Text("Pago".to_string()))
        );
        assert_eq!(rows[0].get("Valor"), Some(&CellValue::Number(100000.0)));
        assert_eq!(rows[1].get("Valor"), Some(&CellValue::Number(-50000.0)));
        assert!(rows
            .iter()
            .all(|row| row.get("Valor") != Some(&CellValue::Number(999999.0))));
    }

    #[test]
    fn test_read_excel_garbage_is_validation_error() {
        let file = UploadedFile::new(
            b"not a workbook".to_vec(),
            "test.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        );
        let err = read_rows(&file).unwrap_err();
        assert!(matches!(err, ImportError::Validation(_)));
    }
}
