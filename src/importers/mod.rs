//! Pluggable per-bank parsing strategies and their registry

pub mod generic;

pub use generic::GenericImporter;

use crate::types::{ImportError, ImportResult, ParsedLine, RawRow};

/// A named strategy that recognizes and parses one bank's export format.
///
/// `can_handle` is a total capability probe: it must decide from the file
/// name and a small row sample whether this importer understands the
/// format, and it must not fail. `parse` may fail with a validation error
/// when the input is structurally unusable.
pub trait BankImporter: Send + Sync {
    /// Display name of the bank this importer handles
    fn bank(&self) -> &str;

    /// Heuristic format probe over the file name and a ≤10-row sample
    fn can_handle(&self, file_name: &str, sample: &[RawRow]) -> bool;

    /// Parse all rows into transaction lines. Rows that are individually
    /// unusable are skipped; a file yielding zero lines is an error.
    fn parse(&self, rows: &[RawRow]) -> ImportResult<Vec<ParsedLine>>;
}

/// Ordered collection of registered importers.
///
/// Owned by (or injected into) the import service rather than living in
/// global state, so tests can build isolated registries. Registration
/// order is selection order: bank-specific importers must be registered
/// ahead of the generic fallback so an exact format match wins.
pub struct ImporterRegistry {
    importers: Vec<Box<dyn BankImporter>>,
}

impl ImporterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            importers: Vec::new(),
        }
    }

    /// Registry with the built-in [`GenericImporter`] fallback.
    ///
    /// Callers adding bank-specific importers should start from
    /// [`ImporterRegistry::new`] and register the fallback last.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(GenericImporter);
        registry
    }

    /// Append an importer; selection scans in registration order
    pub fn register(&mut self, importer: impl BankImporter + 'static) {
        self.importers.push(Box::new(importer));
    }

    /// Select the importer for an upload.
    ///
    /// An explicit bank name matches `bank()` case-insensitively and wins
    /// unconditionally over heuristic detection; a name matching no
    /// registered importer is a validation error rather than a silent
    /// fallback. Without an explicit name, importers are probed in
    /// registration order against the sample.
    pub fn select(
        &self,
        explicit_bank: Option<&str>,
        file_name: &str,
        sample: &[RawRow],
    ) -> ImportResult<&dyn BankImporter> {
        if let Some(name) = explicit_bank {
            let needle = name.to_lowercase();
            return self
                .importers
                .iter()
                .find(|imp| imp.bank().to_lowercase() == needle)
                .map(|imp| imp.as_ref())
                .ok_or_else(|| {
                    ImportError::Validation(format!("no importer registered for bank '{name}'"))
                });
        }
        for importer in &self.importers {
            if importer.can_handle(file_name, sample) {
                tracing::debug!(bank = importer.bank(), "importer selected by heuristic");
                return Ok(importer.as_ref());
            }
        }
        Err(ImportError::Validation(
            "no importer found for this file".to_string(),
        ))
    }
}

impl std::fmt::Debug for dyn BankImporter + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankImporter")
            .field("bank", &self.bank())
            .finish()
    }
}

impl Default for ImporterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
