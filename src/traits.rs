//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::*;

/// Storage abstraction for imported statements.
///
/// This trait allows the import core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these
/// methods. Implementations must enforce a uniqueness constraint on
/// `file_hash` and cascade-delete lines with their statement: the import
/// service's own duplicate lookup is only an optimization, and two
/// concurrent uploads of identical bytes may both pass it.
#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Persist a statement, failing with [`ImportError::Conflict`] if a
    /// statement with the same `file_hash` already exists
    async fn create_statement_if_absent(&mut self, statement: &BankStatement) -> ImportResult<()>;

    /// Insert all lines of a statement as one logical unit
    async fn bulk_insert_lines(&mut self, lines: &[BankStatementLine]) -> ImportResult<()>;

    /// Get a statement by id
    async fn find_by_id(&self, id: Uuid) -> ImportResult<Option<BankStatement>>;

    /// Get a statement by its content hash
    async fn find_by_hash(&self, file_hash: &str) -> ImportResult<Option<BankStatement>>;

    /// List statements ordered by upload time descending, with the total
    /// match count. The bank filter is a case-insensitive substring match.
    async fn list(
        &self,
        bank: Option<&str>,
        skip: usize,
        take: usize,
    ) -> ImportResult<StatementPage>;

    /// Get all lines belonging to a statement (unordered)
    async fn lines_for_statement(&self, statement_id: Uuid) -> ImportResult<Vec<BankStatementLine>>;

    /// Delete a statement and all its lines as one operation; returns
    /// `false` if no statement with that id exists
    async fn delete_by_id(&mut self, id: Uuid) -> ImportResult<bool>;
}
