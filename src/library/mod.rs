//! The catalog domain: book records, the in-memory catalog, and the
//! durable store.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.shelf/
//! └── catalog.json    # full catalog, one JSON array of book records
//! ```
//!
//! The catalog file is rewritten in full on every mutation (add, remove,
//! availability change). Records carry a `kind` discriminant so each one
//! reconstructs into the correct variant on load.

use std::path::PathBuf;

use thiserror::Error;

pub mod book;
pub mod catalog;
pub mod store;

pub use book::{Book, BookKind, Isbn, Kind};
pub use catalog::{Catalog, SortKey};
pub use store::CatalogStore;

/// Errors that can occur against the catalog.
///
/// Every operation either fully succeeds (mutation plus persistence) or
/// fully fails with one of these; there is no partial state.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required field is missing or malformed
    #[error("{0}")]
    Validation(String),

    /// A book with this ISBN is already in the catalog
    #[error("book with ISBN {0} is already in the catalog")]
    Duplicate(Isbn),

    /// No book with this ISBN in the catalog
    #[error("no book with ISBN {0} in the catalog")]
    NotFound(Isbn),

    /// The metadata resolver could not produce fields for this ISBN
    #[error("metadata lookup failed for ISBN {isbn}: {reason}")]
    Lookup { isbn: Isbn, reason: String },

    /// The catalog file exists but cannot be parsed
    #[error("catalog file {} is corrupt: {source}", path.display())]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
