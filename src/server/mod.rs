//! HTTP API over the catalog.
//!
//! A thin adapter: every route maps onto one public catalog operation and
//! does nothing but request/response shaping. Requests serialize against
//! the single catalog instance through a mutex; there is no concurrent
//! mutation.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::library::{Book, BookKind, Catalog, CatalogError, Kind, SortKey};
use crate::resolver::MetadataResolver;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Mutex<Catalog>>,
    pub resolver: Arc<dyn MetadataResolver>,
}

impl AppState {
    pub fn new(catalog: Catalog, resolver: Arc<dyn MetadataResolver>) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            resolver,
        }
    }
}

/// Book summary returned by every route
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub isbn: String,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    pub kind: Kind,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelf_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrator: Option<String>,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        let mut response = Self {
            isbn: book.isbn().to_string(),
            title: book.title().to_string(),
            author: book.author().to_string(),
            publication_year: book.publication_year(),
            kind: book.kind(),
            available: book.available(),
            shelf_location: None,
            file_format: None,
            duration_seconds: None,
            narrator: None,
        };

        match book.details() {
            BookKind::Physical { shelf_location } => {
                response.shelf_location = shelf_location.clone();
            }
            BookKind::Electronic { file_format } => {
                response.file_format = Some(file_format.clone());
            }
            BookKind::Audio { duration_seconds, narrator } => {
                response.duration_seconds = Some(*duration_seconds);
                response.narrator = narrator.clone();
            }
        }

        response
    }
}

/// Body of `POST /books`: the ISBN plus optional local knowledge about the
/// copy being added. Title, author and year come from the resolver.
#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub isbn: String,
    pub kind: Option<Kind>,
    pub shelf_location: Option<String>,
    pub file_format: Option<String>,
    pub duration_seconds: Option<u64>,
    pub narrator: Option<String>,
}

impl AddBookRequest {
    /// Turn the optional kind fields into a kind override for the catalog
    fn kind_override(&self) -> Result<Option<BookKind>, CatalogError> {
        match self.kind {
            None => Ok(None),
            Some(Kind::Physical) => Ok(Some(BookKind::Physical {
                shelf_location: self.shelf_location.clone(),
            })),
            Some(Kind::Electronic) => {
                let file_format = self.file_format.clone().ok_or_else(|| {
                    CatalogError::Validation(
                        "file_format is required for an electronic book".to_string(),
                    )
                })?;
                Ok(Some(BookKind::Electronic { file_format }))
            }
            Some(Kind::Audio) => Ok(Some(BookKind::Audio {
                duration_seconds: self.duration_seconds.unwrap_or(0),
                narrator: self.narrator.clone(),
            })),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Case-insensitive substring over title/author
    pub q: Option<String>,
    pub kind: Option<Kind>,
    pub sort: Option<SortKey>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

/// Domain error carried out of a handler
pub struct ApiError(CatalogError);

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::Duplicate(_) => StatusCode::CONFLICT,
            CatalogError::NotFound(_) | CatalogError::Lookup { .. } => StatusCode::NOT_FOUND,
            CatalogError::CorruptStore { .. }
            | CatalogError::Io(_)
            | CatalogError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// Build the route table
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/books", get(list_books).post(add_book))
        .route("/books/:isbn", get(get_book).delete(remove_book))
        .route("/books/:isbn/availability", put(set_availability))
        .route("/summary", get(summary))
        .with_state(state)
}

/// Bind and serve until the process ends
pub async fn serve(address: &str, state: AppState) -> Result<()> {
    let addr: SocketAddr = address
        .parse()
        .with_context(|| format!("Invalid bind address: {}", address))?;

    info!(%addr, "serving catalog API");

    axum::Server::bind(&addr)
        .serve(router(state).into_make_service())
        .await
        .context("HTTP server failed")
}

async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<BookResponse>> {
    let catalog = state.catalog.lock().await;

    let books: Vec<BookResponse> = if params.q.is_some() || params.kind.is_some() {
        let query = params.q.unwrap_or_default();
        let mut matches: Vec<&Book> = catalog.search(&query, params.kind).collect();
        matches.sort_by(|a, b| a.isbn().cmp(b.isbn()));
        matches.into_iter().map(BookResponse::from).collect()
    } else {
        catalog
            .list(params.sort.unwrap_or_default())
            .into_iter()
            .map(BookResponse::from)
            .collect()
    };

    Json(books)
}

async fn add_book(
    State(state): State<AppState>,
    Json(request): Json<AddBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let kind = request.kind_override()?;

    let mut catalog = state.catalog.lock().await;
    let book = catalog
        .add_by_isbn(state.resolver.as_ref(), &request.isbn, kind)
        .await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

async fn get_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let catalog = state.catalog.lock().await;
    let book = catalog.find(&isbn)?;
    Ok(Json(BookResponse::from(book)))
}

async fn remove_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut catalog = state.catalog.lock().await;
    catalog.remove(&isbn).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_availability(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let mut catalog = state.catalog.lock().await;
    let book = catalog.set_availability(&isbn, request.available).await?;
    Ok(Json(BookResponse::from(book)))
}

async fn summary(State(state): State<AppState>) -> Json<BTreeMap<Kind, Vec<String>>> {
    let catalog = state.catalog.lock().await;

    let buckets = catalog
        .categorize()
        .into_iter()
        .map(|(kind, isbns)| {
            (kind, isbns.into_iter().map(|i| i.to_string()).collect())
        })
        .collect();

    Json(buckets)
}
