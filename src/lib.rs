//! # Statement Import Core
//!
//! A bank statement import library that turns heterogeneous export files
//! (CSV or spreadsheet, varying column names, locales and banks) into a
//! normalized, deduplicated ledger of transaction lines.
//!
//! ## Features
//!
//! - **Format detection**: CSV vs. spreadsheet by extension and mimetype
//! - **Locale-tolerant coercion**: `1.234,56` and `1,234.56` parse alike;
//!   ISO and day-first dates are both understood
//! - **Pluggable importers**: per-bank parsing strategies with heuristic
//!   format detection and a generic header-driven fallback
//! - **Idempotent imports**: content-hash deduplication of the raw bytes
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage
//!
//! ## Quick Start
//!
//! ```rust
//! use statement_import_core::{ImportOptions, ImportService, MemoryStore, UploadedFile};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let mut service = ImportService::new(MemoryStore::new());
//! let file = UploadedFile::new(
//!     b"Fecha,Descripcion,Valor\n2024-03-01,Pago,100000\n".to_vec(),
//!     "extracto.csv",
//!     "text/csv",
//! );
//! let summary = service
//!     .import_statement(&file, ImportOptions::default())
//!     .await
//!     .unwrap();
//! assert_eq!(summary.lines_imported, 1);
//! # });
//! ```

pub mod importers;
pub mod ingest;
pub mod service;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use importers::{BankImporter, GenericImporter, ImporterRegistry};
pub use ingest::{detect_kind, read_rows, FileKind, UploadedFile};
pub use service::ImportService;
pub use traits::*;
pub use types::*;
pub use utils::{content_hash, normalize_header, to_date, to_number, MemoryStore};
