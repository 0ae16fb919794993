//! Import orchestration and statement query/admin operations

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::importers::ImporterRegistry;
use crate::ingest::{read_rows, UploadedFile};
use crate::traits::StatementStore;
use crate::types::*;
use crate::utils::content_hash;

/// Sample size handed to importer heuristics
const DETECTION_SAMPLE_ROWS: usize = 10;

/// Upper bound for the `take` parameter of [`ImportService::list_statements`]
const MAX_PAGE_SIZE: usize = 200;

/// Drives the full import pipeline and the statement query operations.
///
/// Each import runs synchronously, start to finish: decode, select an
/// importer, parse, re-validate, hash, dedup, persist. There is no
/// partial visible state; a failed import leaves nothing behind and must
/// be resubmitted from scratch.
pub struct ImportService<S: StatementStore> {
    store: S,
    registry: ImporterRegistry,
}

impl<S: StatementStore> ImportService<S> {
    /// Create a service with the default registry (generic fallback only)
    pub fn new(store: S) -> Self {
        Self {
            store,
            registry: ImporterRegistry::with_defaults(),
        }
    }

    /// Create a service with a caller-built registry
    pub fn with_registry(store: S, registry: ImporterRegistry) -> Self {
        Self { store, registry }
    }

    /// Import one uploaded statement file.
    ///
    /// Rejects empty files, files that decode to no rows, files no
    /// importer recognizes, files yielding no valid lines, and re-uploads
    /// of byte-identical content (by SHA-256 of the raw bytes). On
    /// success the statement and all its lines are persisted as one
    /// logical unit and a summary is returned.
    pub async fn import_statement(
        &mut self,
        file: &UploadedFile,
        options: ImportOptions,
    ) -> ImportResult<ImportSummary> {
        if file.bytes.is_empty() {
            return Err(ImportError::Validation("uploaded file is empty".to_string()));
        }

        let rows = read_rows(file)?;
        if rows.is_empty() {
            return Err(ImportError::Validation(
                "file contains no data rows".to_string(),
            ));
        }

        let sample = &rows[..rows.len().min(DETECTION_SAMPLE_ROWS)];
        let importer = self
            .registry
            .select(options.bank.as_deref(), &file.file_name, sample)?;
        let bank = importer.bank().to_string();

        let parsed = importer.parse(&rows)?;
        let parsed_count = parsed.len();
        let lines = normalize_lines(parsed);
        if lines.is_empty() {
            return Err(ImportError::Validation(
                "no valid lines could be parsed from the file".to_string(),
            ));
        }
        if lines.len() < parsed_count {
            tracing::warn!(
                dropped = parsed_count - lines.len(),
                bank = %bank,
                "importer produced lines that failed re-validation"
            );
        }

        let file_hash = content_hash(&file.bytes);
        if self.store.find_by_hash(&file_hash).await?.is_some() {
            return Err(ImportError::Conflict(format!(
                "a statement with file hash {file_hash} already exists"
            )));
        }

        // min/max always exist: lines is non-empty here
        let derived_start = lines.iter().map(|l| l.date).min().unwrap();
        let derived_end = lines.iter().map(|l| l.date).max().unwrap();
        let start_date = options.start_date.unwrap_or(derived_start);
        let end_date = options.end_date.unwrap_or(derived_end);

        let statement = BankStatement {
            id: Uuid::new_v4(),
            bank: bank.clone(),
            account_number: options.account_number,
            currency: options.currency,
            original_file_name: file.file_name.clone(),
            file_hash,
            start_date,
            end_date,
            status: StatementStatus::Imported,
            uploaded_at: chrono::Utc::now().naive_utc(),
        };

        // The store enforces hash uniqueness; the lookup above is only an
        // optimization, so a concurrent identical upload surfaces here as
        // the same Conflict error.
        self.store.create_statement_if_absent(&statement).await?;

        let statement_lines: Vec<BankStatementLine> = lines
            .iter()
            .filter_map(|line| to_statement_line(statement.id, line))
            .collect();
        self.store.bulk_insert_lines(&statement_lines).await?;

        tracing::debug!(
            statement_id = %statement.id,
            bank = %statement.bank,
            lines = statement_lines.len(),
            "statement imported"
        );

        Ok(ImportSummary {
            statement_id: statement.id,
            bank: statement.bank,
            start_date: statement.start_date,
            end_date: statement.end_date,
            lines_imported: statement_lines.len(),
            status: statement.status,
        })
    }

    /// List statements, newest upload first.
    ///
    /// The bank filter is a case-insensitive substring match; `take` is
    /// clamped to `[1, 200]`.
    pub async fn list_statements(
        &self,
        bank: Option<&str>,
        skip: usize,
        take: usize,
    ) -> ImportResult<StatementPage> {
        let take = take.clamp(1, MAX_PAGE_SIZE);
        self.store.list(bank, skip, take).await
    }

    /// Get a statement and its lines ordered by (date, id); the id is the
    /// deterministic tie-break for same-date lines
    pub async fn get_statement_lines(&self, id: Uuid) -> ImportResult<StatementWithLines> {
        let statement = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ImportError::NotFound(format!("statement {id} does not exist")))?;
        let mut lines = self.store.lines_for_statement(id).await?;
        lines.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(StatementWithLines { statement, lines })
    }

    /// Delete a statement; its lines are cascade-deleted with it
    pub async fn delete_statement(&mut self, id: Uuid) -> ImportResult<()> {
        if self.store.delete_by_id(id).await? {
            Ok(())
        } else {
            Err(ImportError::NotFound(format!(
                "statement {id} does not exist"
            )))
        }
    }
}

/// Defensive re-validation of importer output.
///
/// Protects the persistence invariants even against a sloppy importer:
/// amounts must be finite, blank optional strings become absent, and any
/// line that still fails is dropped.
fn normalize_lines(lines: Vec<ParsedLine>) -> Vec<ParsedLine> {
    lines
        .into_iter()
        .filter(|line| line.amount.is_finite())
        .map(|line| ParsedLine {
            description: non_blank(line.description),
            reference: non_blank(line.reference),
            external_id: non_blank(line.external_id),
            balance: line.balance.filter(|b| b.is_finite()),
            ..line
        })
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn to_statement_line(statement_id: Uuid, line: &ParsedLine) -> Option<BankStatementLine> {
    Some(BankStatementLine {
        id: Uuid::new_v4(),
        statement_id,
        date: line.date,
        description: line.description.clone(),
        reference: line.reference.clone(),
        amount: BigDecimal::try_from(line.amount).ok()?,
        balance: line.balance.and_then(|b| BigDecimal::try_from(b).ok()),
        external_id: line.external_id.clone(),
        match_score: None,
        matched_line_id: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_normalize_lines_drops_non_finite_amounts() {
        let lines = vec![
            ParsedLine {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                description: Some("  ok  ".to_string()),
                reference: Some("   ".to_string()),
                amount: 10.0,
                balance: Some(f64::NAN),
                external_id: None,
            },
            ParsedLine {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                description: None,
                reference: None,
                amount: f64::INFINITY,
                balance: None,
                external_id: None,
            },
        ];
        let normalized = normalize_lines(lines);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].description.as_deref(), Some("ok"));
        assert_eq!(normalized[0].reference, None);
        assert_eq!(normalized[0].balance, None);
    }
}
