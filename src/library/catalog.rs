//! In-memory catalog of book records, keyed by ISBN.
//!
//! The catalog owns the only copy of the collection. Every mutating
//! operation persists through its [`CatalogStore`] before returning, and
//! rolls the in-memory change back if the write fails, so callers never
//! observe a state that is not on disk.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::resolver::MetadataResolver;

use super::book::{Book, BookKind, Isbn, Kind};
use super::store::CatalogStore;
use super::CatalogError;

/// Sort order for full listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Ascending by ISBN
    #[default]
    Isbn,

    /// Case-insensitive by title, ISBN as tiebreak
    Title,
}

/// The in-memory collection plus its durable store.
pub struct Catalog {
    books: HashMap<Isbn, Book>,
    store: CatalogStore,
}

impl Catalog {
    /// Hydrate a catalog from the store.
    ///
    /// A missing catalog file yields an empty catalog; a corrupt one is an
    /// error that must reach the operator.
    pub async fn open(store: CatalogStore) -> Result<Self, CatalogError> {
        let records = store.load().await?;

        let mut books = HashMap::with_capacity(records.len());
        for book in records {
            let isbn = book.isbn().clone();
            if books.insert(isbn.clone(), book).is_some() {
                // Possible in a hand-edited file. Later entries win; the
                // next save collapses them.
                warn!(isbn = %isbn, "duplicate ISBN in catalog file, keeping the later entry");
            }
        }

        debug!(count = books.len(), "catalog hydrated");
        Ok(Self { books, store })
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// The store this catalog persists through
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Write the full collection to the store, ordered by ISBN
    async fn persist(&self) -> Result<(), CatalogError> {
        let mut records: Vec<&Book> = self.books.values().collect();
        records.sort_by(|a, b| a.isbn().cmp(b.isbn()));
        self.store.save(&records).await
    }

    /// Insert a new record.
    ///
    /// Fails with [`CatalogError::Duplicate`] if the ISBN is already
    /// present, leaving the catalog untouched.
    pub async fn add(&mut self, book: Book) -> Result<&Book, CatalogError> {
        let isbn = book.isbn().clone();

        if self.books.contains_key(&isbn) {
            return Err(CatalogError::Duplicate(isbn));
        }

        self.books.insert(isbn.clone(), book);
        if let Err(err) = self.persist().await {
            self.books.remove(&isbn);
            return Err(err);
        }

        info!(isbn = %isbn, "book added");
        self.books.get(&isbn).ok_or(CatalogError::NotFound(isbn))
    }

    /// Fetch metadata for an ISBN and insert the resulting record.
    ///
    /// The duplicate check runs before the resolver call, so a known ISBN
    /// never costs a network round trip. Any resolver failure maps to
    /// [`CatalogError::Lookup`] and mutates nothing. When `kind` is given
    /// it overrides the kind the resolver guessed, which is how callers
    /// attach a file format, narrator, or shelf location.
    pub async fn add_by_isbn(
        &mut self,
        resolver: &dyn MetadataResolver,
        raw_isbn: &str,
        kind: Option<BookKind>,
    ) -> Result<&Book, CatalogError> {
        let isbn = Isbn::parse(raw_isbn)?;

        if self.books.contains_key(&isbn) {
            return Err(CatalogError::Duplicate(isbn));
        }

        let resolved = resolver.resolve(&isbn).await.map_err(|err| {
            warn!(isbn = %isbn, resolver = resolver.name(), error = %err, "metadata lookup failed");
            CatalogError::Lookup {
                isbn: isbn.clone(),
                reason: err.to_string(),
            }
        })?;

        let book = Book::new(
            isbn,
            resolved.title,
            resolved.author,
            kind.unwrap_or(resolved.kind),
        )?
        .with_publication_year(resolved.publication_year);

        self.add(book).await
    }

    /// Delete a record, returning it.
    pub async fn remove(&mut self, raw_isbn: &str) -> Result<Book, CatalogError> {
        let isbn = Isbn::parse(raw_isbn)?;

        let book = self
            .books
            .remove(&isbn)
            .ok_or_else(|| CatalogError::NotFound(isbn.clone()))?;

        if let Err(err) = self.persist().await {
            self.books.insert(isbn, book);
            return Err(err);
        }

        info!(isbn = %book.isbn(), "book removed");
        Ok(book)
    }

    /// Look up a record by ISBN. No side effects.
    pub fn find(&self, raw_isbn: &str) -> Result<&Book, CatalogError> {
        let isbn = Isbn::parse(raw_isbn)?;
        self.books.get(&isbn).ok_or(CatalogError::NotFound(isbn))
    }

    /// Search by case-insensitive substring on title or author, optionally
    /// restricted to one kind.
    ///
    /// The returned iterator is lazy and finite; call `search` again to
    /// restart it. An empty query matches every book of the kind.
    pub fn search<'a>(
        &'a self,
        query: &str,
        kind: Option<Kind>,
    ) -> impl Iterator<Item = &'a Book> + 'a {
        let query = query.to_lowercase();
        self.books.values().filter(move |book| {
            kind.map_or(true, |k| book.kind() == k)
                && (query.is_empty() || book.matches(&query))
        })
    }

    /// The full collection, ordered by the given key.
    pub fn list(&self, sort: SortKey) -> Vec<&Book> {
        let mut books: Vec<&Book> = self.books.values().collect();
        match sort {
            SortKey::Isbn => books.sort_by(|a, b| a.isbn().cmp(b.isbn())),
            SortKey::Title => books.sort_by(|a, b| {
                a.title()
                    .to_lowercase()
                    .cmp(&b.title().to_lowercase())
                    .then_with(|| a.isbn().cmp(b.isbn()))
            }),
        }
        books
    }

    /// Partition the identifier set by kind.
    ///
    /// Every ISBN lands in exactly one bucket.
    pub fn categorize(&self) -> BTreeMap<Kind, BTreeSet<Isbn>> {
        let mut buckets: BTreeMap<Kind, BTreeSet<Isbn>> = BTreeMap::new();
        for book in self.books.values() {
            buckets
                .entry(book.kind())
                .or_default()
                .insert(book.isbn().clone());
        }
        buckets
    }

    /// Flip whether a copy is currently lendable/accessible.
    pub async fn set_availability(
        &mut self,
        raw_isbn: &str,
        available: bool,
    ) -> Result<&Book, CatalogError> {
        let isbn = Isbn::parse(raw_isbn)?;

        let previous = {
            let book = self
                .books
                .get_mut(&isbn)
                .ok_or_else(|| CatalogError::NotFound(isbn.clone()))?;
            let previous = book.available();
            book.set_available(available);
            previous
        };

        if let Err(err) = self.persist().await {
            if let Some(book) = self.books.get_mut(&isbn) {
                book.set_available(previous);
            }
            return Err(err);
        }

        info!(isbn = %isbn, available, "availability changed");
        self.books.get(&isbn).ok_or(CatalogError::NotFound(isbn))
    }
}
