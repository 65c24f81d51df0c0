//! Book records: the polymorphic catalog item.
//!
//! A book is identified by its normalized ISBN and comes in one of three
//! kinds (physical, electronic, audio), each carrying its own descriptive
//! fields. The kind is fixed at creation; only availability and the
//! descriptive fields may change afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CatalogError;

/// Normalized ISBN, the catalog's primary key.
///
/// Normalization strips hyphens and spaces and uppercases a trailing
/// ISBN-10 check character. The result must be 10 or 13 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Isbn(String);

impl Isbn {
    /// Parse and normalize a raw ISBN string
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let normalized: String = raw
            .chars()
            .filter(|c| *c != '-' && *c != ' ')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let valid = match normalized.len() {
            13 => normalized.chars().all(|c| c.is_ascii_digit()),
            10 => {
                let (head, last) = normalized.split_at(9);
                head.chars().all(|c| c.is_ascii_digit())
                    && last.chars().all(|c| c.is_ascii_digit() || c == 'X')
            }
            _ => false,
        };

        if !valid {
            return Err(CatalogError::Validation(format!(
                "invalid ISBN '{}': must be 10 or 13 characters after removing hyphens and spaces",
                raw
            )));
        }

        Ok(Self(normalized))
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Isbn {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The variant tag of a book, without its fields.
///
/// Used as the key for categorization and as a search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Printed copy on a shelf
    Physical,

    /// Ebook file (EPUB, PDF, ...)
    Electronic,

    /// Audiobook recording
    Audio,
}

impl Kind {
    /// All kinds, in display order
    pub const ALL: [Kind; 3] = [Kind::Physical, Kind::Electronic, Kind::Audio];
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Physical => write!(f, "physical"),
            Kind::Electronic => write!(f, "electronic"),
            Kind::Audio => write!(f, "audio"),
        }
    }
}

impl FromStr for Kind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "physical" | "paper" | "print" | "book" => Ok(Kind::Physical),
            "electronic" | "ebook" | "digital" => Ok(Kind::Electronic),
            "audio" | "audiobook" => Ok(Kind::Audio),
            _ => Err(CatalogError::Validation(format!("unknown book kind: {}", s))),
        }
    }
}

/// Kind-specific fields, serialized with an explicit `kind` discriminant
/// so stored records reconstruct into the correct variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookKind {
    /// Printed copy, optionally with a shelf location
    Physical {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shelf_location: Option<String>,
    },

    /// Ebook with a file format such as "EPUB" or "PDF"
    Electronic { file_format: String },

    /// Audiobook with a running time and an optional narrator
    Audio {
        duration_seconds: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        narrator: Option<String>,
    },
}

impl BookKind {
    /// Get the variant tag
    pub fn kind(&self) -> Kind {
        match self {
            BookKind::Physical { .. } => Kind::Physical,
            BookKind::Electronic { .. } => Kind::Electronic,
            BookKind::Audio { .. } => Kind::Audio,
        }
    }
}

/// A single catalog item.
///
/// `isbn` and the kind tag never change once set. Equality is by `isbn`
/// alone: two records are the same book iff their identifiers match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    isbn: Isbn,
    title: String,
    author: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    publication_year: Option<i32>,

    #[serde(default = "default_available")]
    available: bool,

    added_at: DateTime<Utc>,

    #[serde(flatten)]
    kind: BookKind,
}

fn default_available() -> bool {
    true
}

impl Book {
    /// Create a new book, validating the required fields.
    ///
    /// Title and author must be non-empty, and an electronic book must name
    /// its file format. New books are available by default.
    pub fn new(
        isbn: Isbn,
        title: impl Into<String>,
        author: impl Into<String>,
        kind: BookKind,
    ) -> Result<Self, CatalogError> {
        let title = title.into();
        let author = author.into();

        if title.trim().is_empty() {
            return Err(CatalogError::Validation("title must not be empty".to_string()));
        }
        if author.trim().is_empty() {
            return Err(CatalogError::Validation("author must not be empty".to_string()));
        }
        if let BookKind::Electronic { file_format } = &kind {
            if file_format.trim().is_empty() {
                return Err(CatalogError::Validation(
                    "file format must not be empty for an electronic book".to_string(),
                ));
            }
        }

        Ok(Self {
            isbn,
            title,
            author,
            publication_year: None,
            available: true,
            added_at: Utc::now(),
            kind,
        })
    }

    /// Attach a publication year
    pub fn with_publication_year(mut self, year: Option<i32>) -> Self {
        self.publication_year = year;
        self
    }

    pub fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn publication_year(&self) -> Option<i32> {
        self.publication_year
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// Kind-specific fields
    pub fn details(&self) -> &BookKind {
        &self.kind
    }

    /// The variant tag
    pub fn kind(&self) -> Kind {
        self.kind.kind()
    }

    /// Set whether the copy is currently lendable/accessible
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Update the shelf location of a physical book
    pub fn set_shelf_location(&mut self, location: Option<String>) -> Result<(), CatalogError> {
        match &mut self.kind {
            BookKind::Physical { shelf_location } => {
                *shelf_location = location;
                Ok(())
            }
            _ => Err(CatalogError::Validation(format!(
                "{} is not a physical book",
                self.isbn
            ))),
        }
    }

    /// Update the file format of an electronic book
    pub fn set_file_format(&mut self, format: String) -> Result<(), CatalogError> {
        if format.trim().is_empty() {
            return Err(CatalogError::Validation("file format must not be empty".to_string()));
        }
        match &mut self.kind {
            BookKind::Electronic { file_format } => {
                *file_format = format;
                Ok(())
            }
            _ => Err(CatalogError::Validation(format!(
                "{} is not an electronic book",
                self.isbn
            ))),
        }
    }

    /// Update the narrator of an audiobook
    pub fn set_narrator(&mut self, narrator: Option<String>) -> Result<(), CatalogError> {
        match &mut self.kind {
            BookKind::Audio { narrator: n, .. } => {
                *n = narrator;
                Ok(())
            }
            _ => Err(CatalogError::Validation(format!(
                "{} is not an audiobook",
                self.isbn
            ))),
        }
    }

    /// Case-insensitive substring match on title or author
    pub(crate) fn matches(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
            || self.author.to_lowercase().contains(query_lower)
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.isbn == other.isbn
    }
}

impl Eq for Book {}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' by {} (ISBN: {}", self.title, self.author, self.isbn)?;
        if let Some(year) = self.publication_year {
            write!(f, ", {}", year)?;
        }
        write!(f, ")")?;

        match &self.kind {
            BookKind::Physical { shelf_location: Some(loc) } => write!(f, " [Shelf {}]", loc)?,
            BookKind::Physical { shelf_location: None } => {}
            BookKind::Electronic { file_format } => write!(f, " [Format: {}]", file_format)?,
            BookKind::Audio { duration_seconds, narrator } => {
                write!(f, " [Duration: {} min", duration_seconds / 60)?;
                if let Some(narrator) = narrator {
                    write!(f, ", narrated by {}", narrator)?;
                }
                write!(f, "]")?;
            }
        }

        if !self.available {
            write!(f, " (lent out)")?;
        }

        Ok(())
    }
}
