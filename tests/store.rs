//! Catalog Store Tests
//!
//! The durable contract: every field of every variant survives a
//! save/load cycle, a missing file is a first run, and a malformed file
//! is an error that names its path.

use shelf::{Book, BookKind, CatalogError, CatalogStore, Isbn};
use tempfile::TempDir;

fn full_set() -> Vec<Book> {
    let mut physical = Book::new(
        Isbn::parse("9781444720723").unwrap(),
        "Dune",
        "Frank Herbert",
        BookKind::Physical { shelf_location: Some("A3".to_string()) },
    )
    .unwrap()
    .with_publication_year(Some(1965));
    physical.set_available(false);

    let electronic = Book::new(
        Isbn::parse("9780575094185").unwrap(),
        "Hyperion",
        "Dan Simmons",
        BookKind::Electronic { file_format: "EPUB".to_string() },
    )
    .unwrap()
    .with_publication_year(Some(1989));

    let audio = Book::new(
        Isbn::parse("9780563504191").unwrap(),
        "The Hitchhiker's Guide to the Galaxy",
        "Douglas Adams",
        BookKind::Audio {
            duration_seconds: 18360,
            narrator: Some("Stephen Moss".to_string()),
        },
    )
    .unwrap();

    vec![physical, electronic, audio]
}

#[tokio::test]
async fn test_every_variant_round_trips_exactly() {
    let temp = TempDir::new().unwrap();
    let store = CatalogStore::new(temp.path().join("catalog.json"));

    let books = full_set();
    let refs: Vec<&Book> = books.iter().collect();
    store.save(&refs).await.unwrap();

    let loaded = store.load().await.unwrap();
    assert_eq!(loaded.len(), books.len());

    for (saved, loaded) in books.iter().zip(&loaded) {
        assert_eq!(loaded.isbn(), saved.isbn());
        assert_eq!(loaded.title(), saved.title());
        assert_eq!(loaded.author(), saved.author());
        assert_eq!(loaded.publication_year(), saved.publication_year());
        assert_eq!(loaded.available(), saved.available());
        assert_eq!(loaded.added_at(), saved.added_at());
        assert_eq!(loaded.details(), saved.details());
    }
}

#[tokio::test]
async fn test_missing_file_is_a_first_run_not_an_error() {
    let temp = TempDir::new().unwrap();
    let store = CatalogStore::new(temp.path().join("never-written.json"));

    let loaded = store.load().await.unwrap();
    assert!(loaded.is_empty());
}

#[tokio::test]
async fn test_malformed_file_names_its_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.json");
    tokio::fs::write(&path, r#"[{"isbn": "9781444720723", "title"#)
        .await
        .unwrap();

    let store = CatalogStore::new(&path);
    match store.load().await {
        Err(CatalogError::CorruptStore { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected CorruptStore, got {:?}", other.map(|b| b.len())),
    }
}

#[tokio::test]
async fn test_record_with_unknown_kind_is_corrupt() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.json");
    tokio::fs::write(
        &path,
        r#"[{"isbn": "9781444720723", "title": "Dune", "author": "Frank Herbert",
            "added_at": "2026-01-01T00:00:00Z", "kind": "hologram"}]"#,
    )
    .await
    .unwrap();

    let store = CatalogStore::new(&path);
    assert!(matches!(
        store.load().await,
        Err(CatalogError::CorruptStore { .. })
    ));
}

#[tokio::test]
async fn test_save_replaces_the_previous_contents() {
    let temp = TempDir::new().unwrap();
    let store = CatalogStore::new(temp.path().join("catalog.json"));

    let books = full_set();
    let refs: Vec<&Book> = books.iter().collect();
    store.save(&refs).await.unwrap();

    // a smaller save fully replaces the file, it does not append
    store.save(&refs[..1]).await.unwrap();

    let loaded = store.load().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title(), "Dune");
}
