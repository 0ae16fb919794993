//! Utility modules: value coercion, header normalization, hashing, and
//! in-memory storage

pub mod coerce;
pub mod hash;
pub mod headers;
pub mod memory_store;

pub use coerce::{to_date, to_number};
pub use hash::content_hash;
pub use headers::normalize_header;
pub use memory_store::MemoryStore;
