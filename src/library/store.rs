//! Durable read/write adapter for the catalog file.
//!
//! The store is stateless: it owns nothing but the file path. A missing
//! file loads as an empty catalog (the expected first-run state), while a
//! present-but-unparseable file is a [`CatalogError::CorruptStore`] that
//! must surface to the operator.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::book::Book;
use super::CatalogError;

/// Stateless load/save adapter over one JSON file.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Create a store over the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full set of records.
    ///
    /// A missing file is not an error: it yields an empty set.
    pub async fn load(&self) -> Result<Vec<Book>, CatalogError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no catalog file yet, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        serde_json::from_str(&content).map_err(|source| CatalogError::CorruptStore {
            path: self.path.clone(),
            source,
        })
    }

    /// Serialize the full set and replace the catalog file.
    ///
    /// The write goes to a sibling temporary file first and is renamed over
    /// the target, so a crash mid-write never leaves a half-written catalog.
    pub async fn save(&self, books: &[&Book]) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(books)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), count = books.len(), "catalog saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::book::{BookKind, Isbn};
    use tempfile::TempDir;

    fn sample_book() -> Book {
        Book::new(
            Isbn::parse("9781444720723").unwrap(),
            "Dune",
            "Frank Herbert",
            BookKind::Physical { shelf_location: Some("A3".to_string()) },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::new(temp.path().join("catalog.json"));

        let books = store.load().await.unwrap();
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::new(temp.path().join("catalog.json"));

        let book = sample_book();
        store.save(&[&book]).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title(), "Dune");
        assert_eq!(loaded[0].details(), book.details());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::new(temp.path().join("deep").join("nested").join("catalog.json"));

        store.save(&[&sample_book()]).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        tokio::fs::write(&path, "{ this is not a catalog").await.unwrap();

        let store = CatalogStore::new(&path);
        match store.load().await {
            Err(CatalogError::CorruptStore { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected CorruptStore, got {:?}", other.map(|b| b.len())),
        }
    }

    #[tokio::test]
    async fn test_save_leaves_no_temporary_file() {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::new(temp.path().join("catalog.json"));

        store.save(&[&sample_book()]).await.unwrap();

        let mut entries = tokio::fs::read_dir(temp.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["catalog.json".to_string()]);
    }
}
