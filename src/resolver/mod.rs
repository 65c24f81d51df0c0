//! Metadata resolution for adding books by ISBN alone.
//!
//! A resolver maps an ISBN to descriptive fields (title, author, year).
//! The catalog treats every resolver failure uniformly and never retries;
//! retry or backoff, if any, belongs to the resolver implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::library::{BookKind, Isbn};

pub mod open_library;

pub use open_library::OpenLibraryResolver;

/// Descriptive fields a resolver produced for one ISBN
#[derive(Debug, Clone)]
pub struct ResolvedBook {
    pub title: String,
    pub author: String,
    pub publication_year: Option<i32>,

    /// Kind the resolver believes this edition is. Callers may override it
    /// with local knowledge (file format, narrator, shelf location).
    pub kind: BookKind,
}

/// Ways a resolution can fail
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The service answered but knows nothing about this ISBN
    #[error("no metadata found for ISBN {0}")]
    NotFound(Isbn),

    /// The service could not be reached or returned an error status
    #[error("metadata service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with something that is not a valid response
    #[error("malformed metadata response: {0}")]
    Malformed(String),
}

/// External collaborator that maps an ISBN to descriptive fields
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Human-readable resolver name
    fn name(&self) -> &str;

    /// Fetch descriptive fields for one ISBN
    async fn resolve(&self, isbn: &Isbn) -> Result<ResolvedBook, ResolveError>;
}
