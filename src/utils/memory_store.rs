//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development.
///
/// Enforces the unique `file_hash` constraint inside a single write-lock
/// critical section and cascade-deletes lines with their statement, the
/// same guarantees a database backend provides via a unique index and a
/// foreign key with `ON DELETE CASCADE`.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    statements: Arc<RwLock<HashMap<Uuid, BankStatement>>>,
    lines: Arc<RwLock<HashMap<Uuid, Vec<BankStatementLine>>>>,
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self {
            statements: Arc::new(RwLock::new(HashMap::new())),
            lines: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.statements.write().unwrap().clear();
        self.lines.write().unwrap().clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatementStore for MemoryStore {
    async fn create_statement_if_absent(&mut self, statement: &BankStatement) -> ImportResult<()> {
        let mut statements = self.statements.write().unwrap();
        if statements
            .values()
            .any(|s| s.file_hash == statement.file_hash)
        {
            return Err(ImportError::Conflict(format!(
                "a statement with file hash {} already exists",
                statement.file_hash
            )));
        }
        statements.insert(statement.id, statement.clone());
        Ok(())
    }

    async fn bulk_insert_lines(&mut self, lines: &[BankStatementLine]) -> ImportResult<()> {
        let mut stored = self.lines.write().unwrap();
        for line in lines {
            stored
                .entry(line.statement_id)
                .or_default()
                .push(line.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> ImportResult<Option<BankStatement>> {
        Ok(self.statements.read().unwrap().get(&id).cloned())
    }

    async fn find_by_hash(&self, file_hash: &str) -> ImportResult<Option<BankStatement>> {
        Ok(self
            .statements
            .read()
            .unwrap()
            .values()
            .find(|s| s.file_hash == file_hash)
            .cloned())
    }

    async fn list(
        &self,
        bank: Option<&str>,
        skip: usize,
        take: usize,
    ) -> ImportResult<StatementPage> {
        let statements = self.statements.read().unwrap();
        let mut matched: Vec<BankStatement> = statements
            .values()
            .filter(|s| {
                bank.is_none_or(|needle| {
                    s.bank.to_lowercase().contains(&needle.to_lowercase())
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        let total = matched.len();
        let page: Vec<BankStatement> = matched.into_iter().skip(skip).take(take).collect();
        Ok(StatementPage {
            statements: page,
            total,
        })
    }

    async fn lines_for_statement(&self, statement_id: Uuid) -> ImportResult<Vec<BankStatementLine>> {
        Ok(self
            .lines
            .read()
            .unwrap()
            .get(&statement_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_by_id(&mut self, id: Uuid) -> ImportResult<bool> {
        let removed = self.statements.write().unwrap().remove(&id).is_some();
        if removed {
            self.lines.write().unwrap().remove(&id);
        }
        Ok(removed)
    }
}
