//! Open Library `search.json` client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::library::{BookKind, Isbn};

use super::{MetadataResolver, ResolveError, ResolvedBook};

/// Default public endpoint
pub const DEFAULT_ENDPOINT: &str = "https://openlibrary.org/search.json";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolver backed by the Open Library search API
pub struct OpenLibraryResolver {
    endpoint: String,
    client: reqwest::Client,
}

/// Response shape of `search.json` (only the fields we read)
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    first_publish_year: Option<i32>,
}

impl OpenLibraryResolver {
    /// Create a resolver against a specific endpoint
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Create a resolver from the resolved configuration
    pub fn from_config() -> Result<Self> {
        let lookup = &crate::config::config()?.lookup;
        Self::new(&lookup.endpoint, Duration::from_secs(lookup.timeout_seconds))
    }

    /// Parse a `search.json` body into resolved fields.
    ///
    /// The first matching document wins. Missing title/author fall back to
    /// placeholders the way the upstream API's own examples do.
    fn parse_response(body: &str, isbn: &Isbn) -> Result<ResolvedBook, ResolveError> {
        let response: SearchResponse = serde_json::from_str(body)
            .map_err(|err| ResolveError::Malformed(err.to_string()))?;

        let doc = response
            .docs
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NotFound(isbn.clone()))?;

        let title = doc
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Unknown Title".to_string());

        let author = if doc.author_name.is_empty() {
            "Unknown Author".to_string()
        } else {
            doc.author_name.join(", ")
        };

        Ok(ResolvedBook {
            title,
            author,
            publication_year: doc.first_publish_year,
            // search.json describes editions in print terms; the caller
            // overrides the kind when it knows better.
            kind: BookKind::Physical { shelf_location: None },
        })
    }
}

#[async_trait]
impl MetadataResolver for OpenLibraryResolver {
    fn name(&self) -> &str {
        "open-library"
    }

    async fn resolve(&self, isbn: &Isbn) -> Result<ResolvedBook, ResolveError> {
        debug!(isbn = %isbn, endpoint = %self.endpoint, "resolving metadata");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("isbn", isbn.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        Self::parse_response(&body, isbn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUNE_RESPONSE: &str = r#"{
        "numFound": 1,
        "docs": [
            {
                "title": "Dune",
                "author_name": ["Frank Herbert"],
                "first_publish_year": 1965,
                "edition_count": 120
            }
        ]
    }"#;

    fn isbn() -> Isbn {
        Isbn::parse("9781444720723").unwrap()
    }

    #[test]
    fn test_parse_response_takes_first_doc() {
        let resolved = OpenLibraryResolver::parse_response(DUNE_RESPONSE, &isbn()).unwrap();

        assert_eq!(resolved.title, "Dune");
        assert_eq!(resolved.author, "Frank Herbert");
        assert_eq!(resolved.publication_year, Some(1965));
        assert_eq!(resolved.kind, BookKind::Physical { shelf_location: None });
    }

    #[test]
    fn test_parse_response_joins_authors() {
        let body = r#"{"docs": [{"title": "Good Omens",
            "author_name": ["Terry Pratchett", "Neil Gaiman"]}]}"#;

        let resolved = OpenLibraryResolver::parse_response(body, &isbn()).unwrap();
        assert_eq!(resolved.author, "Terry Pratchett, Neil Gaiman");
        assert_eq!(resolved.publication_year, None);
    }

    #[test]
    fn test_parse_response_empty_docs_is_not_found() {
        let body = r#"{"numFound": 0, "docs": []}"#;

        match OpenLibraryResolver::parse_response(body, &isbn()) {
            Err(ResolveError::NotFound(i)) => assert_eq!(i, isbn()),
            other => panic!("expected NotFound, got {:?}", other.map(|r| r.title)),
        }
    }

    #[test]
    fn test_parse_response_missing_fields_fall_back() {
        let body = r#"{"docs": [{"edition_count": 3}]}"#;

        let resolved = OpenLibraryResolver::parse_response(body, &isbn()).unwrap();
        assert_eq!(resolved.title, "Unknown Title");
        assert_eq!(resolved.author, "Unknown Author");
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        match OpenLibraryResolver::parse_response("<html>rate limited</html>", &isbn()) {
            Err(ResolveError::Malformed(_)) => {}
            other => panic!("expected Malformed, got {:?}", other.map(|r| r.title)),
        }
    }
}
