//! Command-line interface for shelf.
//!
//! Provides commands for adding books (manually or by ISBN lookup),
//! removing them, browsing the catalog, and running the HTTP API.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config;
use crate::library::{Book, BookKind, Catalog, CatalogStore, Isbn, Kind, SortKey};
use crate::resolver::OpenLibraryResolver;
use crate::server::{self, AppState};

/// shelf - personal library catalog
#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a book with fields given on the command line
    Add {
        /// ISBN (hyphens and spaces are ignored)
        isbn: String,

        /// Book title
        #[arg(short, long)]
        title: String,

        /// Author name
        #[arg(short, long)]
        author: String,

        /// Publication year
        #[arg(short, long)]
        year: Option<i32>,

        /// Book kind
        #[arg(short, long, value_enum, default_value = "physical")]
        kind: KindArg,

        /// Shelf location (physical books)
        #[arg(long)]
        location: Option<String>,

        /// File format, e.g. EPUB or PDF (electronic books)
        #[arg(long)]
        format: Option<String>,

        /// Running time in seconds (audiobooks)
        #[arg(long)]
        duration: Option<u64>,

        /// Narrator name (audiobooks)
        #[arg(long)]
        narrator: Option<String>,
    },

    /// Look up an ISBN with the metadata service and add the result
    Fetch {
        /// ISBN to look up
        isbn: String,

        /// Book kind (the lookup assumes physical if not given)
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// Shelf location (physical books)
        #[arg(long)]
        location: Option<String>,

        /// File format, e.g. EPUB or PDF (electronic books)
        #[arg(long)]
        format: Option<String>,

        /// Running time in seconds (audiobooks)
        #[arg(long)]
        duration: Option<u64>,

        /// Narrator name (audiobooks)
        #[arg(long)]
        narrator: Option<String>,
    },

    /// Remove a book
    Remove {
        /// ISBN of the book to remove
        isbn: String,
    },

    /// Show one book in full
    Show {
        /// ISBN to look up
        isbn: String,
    },

    /// List the catalog
    List {
        /// Only show one kind
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// Sort order
        #[arg(short, long, value_enum, default_value = "isbn")]
        sort: SortArg,
    },

    /// Search titles and authors
    Search {
        /// Case-insensitive substring to match
        query: String,

        /// Only search one kind
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Show counts per kind
    Summary,

    /// Mark a book as lent out
    Lend {
        /// ISBN of the book
        isbn: String,
    },

    /// Mark a book as back on the shelf
    Return {
        /// ISBN of the book
        isbn: String,
    },

    /// Serve the catalog over HTTP
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:9000")]
        address: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Book kind for CLI (maps to Kind)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Printed copy
    Physical,

    /// Ebook
    Electronic,

    /// Audiobook
    Audio,
}

impl From<KindArg> for Kind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Physical => Kind::Physical,
            KindArg::Electronic => Kind::Electronic,
            KindArg::Audio => Kind::Audio,
        }
    }
}

/// Sort order for CLI (maps to SortKey)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Isbn,
    Title,
}

impl From<SortArg> for SortKey {
    fn from(s: SortArg) -> Self {
        match s {
            SortArg::Isbn => SortKey::Isbn,
            SortArg::Title => SortKey::Title,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Add {
                isbn,
                title,
                author,
                year,
                kind,
                location,
                format,
                duration,
                narrator,
            } => {
                let details = build_kind(kind, location, format, duration, narrator)?;
                add_book(&isbn, title, author, year, details).await
            }
            Commands::Fetch {
                isbn,
                kind,
                location,
                format,
                duration,
                narrator,
            } => {
                let details = match kind {
                    Some(k) => Some(build_kind(k, location, format, duration, narrator)?),
                    None => None,
                };
                fetch_book(&isbn, details).await
            }
            Commands::Remove { isbn } => remove_book(&isbn).await,
            Commands::Show { isbn } => show_book(&isbn).await,
            Commands::List { kind, sort } => list_books(kind, sort).await,
            Commands::Search { query, kind } => search_books(&query, kind).await,
            Commands::Summary => show_summary().await,
            Commands::Lend { isbn } => set_availability(&isbn, false).await,
            Commands::Return { isbn } => set_availability(&isbn, true).await,
            Commands::Serve { address } => serve(&address).await,
            Commands::Config => show_config(),
        }
    }
}

/// Open the configured catalog
async fn open_catalog() -> Result<Catalog> {
    let path = config::catalog_path()?;
    let catalog = Catalog::open(CatalogStore::new(&path))
        .await
        .with_context(|| format!("Failed to open catalog at {}", path.display()))?;
    Ok(catalog)
}

/// Turn CLI kind flags into a BookKind
fn build_kind(
    kind: KindArg,
    location: Option<String>,
    format: Option<String>,
    duration: Option<u64>,
    narrator: Option<String>,
) -> Result<BookKind> {
    match kind {
        KindArg::Physical => Ok(BookKind::Physical { shelf_location: location }),
        KindArg::Electronic => {
            let file_format = format
                .context("--format is required for an electronic book (e.g. --format EPUB)")?;
            Ok(BookKind::Electronic { file_format })
        }
        KindArg::Audio => Ok(BookKind::Audio {
            duration_seconds: duration.unwrap_or(0),
            narrator,
        }),
    }
}

async fn add_book(
    isbn: &str,
    title: String,
    author: String,
    year: Option<i32>,
    details: BookKind,
) -> Result<()> {
    let mut catalog = open_catalog().await?;

    let book = Book::new(Isbn::parse(isbn)?, title, author, details)?.with_publication_year(year);

    let added = catalog.add(book).await?;
    println!("Added: {}", added);

    Ok(())
}

async fn fetch_book(isbn: &str, details: Option<BookKind>) -> Result<()> {
    let mut catalog = open_catalog().await?;
    let resolver = OpenLibraryResolver::from_config()?;

    let added = catalog.add_by_isbn(&resolver, isbn, details).await?;
    println!("Added: {}", added);

    Ok(())
}

async fn remove_book(isbn: &str) -> Result<()> {
    let mut catalog = open_catalog().await?;

    let removed = catalog.remove(isbn).await?;
    println!("Removed: {}", removed);

    Ok(())
}

async fn show_book(isbn: &str) -> Result<()> {
    let catalog = open_catalog().await?;

    let book = catalog.find(isbn)?;
    println!("{}", book);
    println!("  Kind:      {}", book.kind());
    println!("  Available: {}", if book.available() { "yes" } else { "no" });
    println!("  Added:     {}", book.added_at().format("%Y-%m-%d"));

    Ok(())
}

fn print_table(books: &[&Book]) {
    println!(
        "{:<15} {:<12} {:<36} {:<24} {:<9}",
        "ISBN", "KIND", "TITLE", "AUTHOR", "AVAILABLE"
    );
    println!("{}", "-".repeat(98));

    for book in books {
        println!(
            "{:<15} {:<12} {:<36} {:<24} {:<9}",
            book.isbn().as_str(),
            book.kind().to_string(),
            truncate(book.title(), 33),
            truncate(book.author(), 21),
            if book.available() { "yes" } else { "no" }
        );
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

async fn list_books(kind: Option<KindArg>, sort: SortArg) -> Result<()> {
    let catalog = open_catalog().await?;

    if catalog.is_empty() {
        println!("The catalog is empty. Use 'shelf add' or 'shelf fetch <isbn>' to add books.");
        return Ok(());
    }

    let books: Vec<&Book> = match kind {
        Some(k) => {
            let mut matches: Vec<&Book> = catalog.search("", Some(k.into())).collect();
            matches.sort_by(|a, b| a.isbn().cmp(b.isbn()));
            matches
        }
        None => catalog.list(sort.into()),
    };

    print_table(&books);
    println!("\nTotal: {} books", books.len());

    Ok(())
}

async fn search_books(query: &str, kind: Option<KindArg>) -> Result<()> {
    let catalog = open_catalog().await?;

    let mut matches: Vec<&Book> = catalog.search(query, kind.map(Into::into)).collect();
    matches.sort_by(|a, b| a.isbn().cmp(b.isbn()));

    if matches.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    println!("Found {} result(s) for \"{}\":\n", matches.len(), query);
    print_table(&matches);

    Ok(())
}

async fn show_summary() -> Result<()> {
    let catalog = open_catalog().await?;

    let buckets = catalog.categorize();

    println!("{:<12} {:<6}", "KIND", "COUNT");
    println!("{}", "-".repeat(19));
    for kind in Kind::ALL {
        let count = buckets.get(&kind).map_or(0, |isbns| isbns.len());
        println!("{:<12} {:<6}", kind.to_string(), count);
    }
    println!("\nTotal: {} books", catalog.len());

    Ok(())
}

async fn set_availability(isbn: &str, available: bool) -> Result<()> {
    let mut catalog = open_catalog().await?;

    let book = catalog.set_availability(isbn, available).await?;
    if available {
        println!("Back on the shelf: {}", book);
    } else {
        println!("Lent out: {}", book);
    }

    Ok(())
}

async fn serve(address: &str) -> Result<()> {
    let catalog = open_catalog().await?;
    let resolver = Arc::new(OpenLibraryResolver::from_config()?);

    let state = AppState::new(catalog, resolver);
    server::serve(address, state).await
}

fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("shelf configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:    {}", cfg.home.display());
    println!("  Catalog: {}", cfg.catalog.display());
    println!();
    println!("Metadata lookup:");
    println!("  Endpoint: {}", cfg.lookup.endpoint);
    println!("  Timeout:  {}s", cfg.lookup.timeout_seconds);

    Ok(())
}
