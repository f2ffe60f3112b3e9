//! Simple REST API server example for the library loan engine.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /books` - Catalog a book
//! - `GET /books?search=&sort=` - List books (sort: `title` or `available_copies`)
//! - `POST /patrons` - Register a patron
//! - `GET /patrons` - List patrons by name
//! - `POST /loans` - Borrow a book
//! - `POST /loans/{id}/return` - Return a loan, reporting the fine
//! - `GET /loans/active?date=` - Active loans with live fines
//!
//! Dates default to the server's local date when omitted.
//!
//! ## Example Usage
//!
//! ```bash
//! # Catalog a book
//! curl -X POST http://localhost:3000/books \
//!   -H "Content-Type: application/json" \
//!   -d '{"title": "Dune", "author": "Frank Herbert", "isbn": "978-0441013593", "total_copies": 2}'
//!
//! # Register a patron
//! curl -X POST http://localhost:3000/patrons \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Ada", "email": "ada@example.com"}'
//!
//! # Borrow
//! curl -X POST http://localhost:3000/loans \
//!   -H "Content-Type: application/json" \
//!   -d '{"patron_id": 1, "book_id": 1, "date": "2024-01-01"}'
//!
//! # Return six days late
//! curl -X POST http://localhost:3000/loans/1/return \
//!   -H "Content-Type: application/json" \
//!   -d '{"date": "2024-01-21"}'
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use library_loans::{
    ActiveLoan, BookId, BookQuery, BookRecord, BookSort, ErrorKind, Library, LibraryConfig,
    LibraryError, Loan, LoanId, Patron, PatronId, ReturnReceipt, logging,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

#[derive(Debug, Deserialize)]
pub struct NewBookRequest {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub total_copies: u32,
}

#[derive(Debug, Deserialize)]
pub struct NewPatronRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct BorrowRequest {
    pub patron_id: u32,
    pub book_id: u32,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct BookListParams {
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateParams {
    pub date: Option<NaiveDate>,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the loan engine.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<Library>,
}

fn today_or(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| chrono::Local::now().date_naive())
}

/// Logs and clears journaled loan events.
fn flush_journal(library: &Library) {
    for event in library.drain_events() {
        tracing::info!(
            loan_id = %event.loan_id(),
            date = %event.date(),
            ?event,
            "loan event"
        );
    }
}

// === Error Handling ===

/// Wrapper for converting `LibraryError` into HTTP responses.
pub struct AppError(LibraryError);

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::ResourceExhausted => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        };
        let code = match &self.0 {
            LibraryError::PatronNotFound(_) => "PATRON_NOT_FOUND",
            LibraryError::BookNotFound(_) => "BOOK_NOT_FOUND",
            LibraryError::LoanNotFound(_) => "LOAN_NOT_FOUND",
            LibraryError::NoCopiesAvailable(_) => "NO_COPIES_AVAILABLE",
            LibraryError::DuplicateActiveLoan { .. } => "DUPLICATE_ACTIVE_LOAN",
            LibraryError::LoanAlreadyClosed(_) => "LOAN_ALREADY_CLOSED",
            LibraryError::DuplicateCatalogCode(_) => "DUPLICATE_CATALOG_CODE",
            LibraryError::DuplicateContact(_) => "DUPLICATE_CONTACT",
            LibraryError::ReturnBeforeBorrow(_) => "RETURN_BEFORE_BORROW",
            LibraryError::MissingField(_) => "MISSING_FIELD",
            LibraryError::InvalidCopyCount => "INVALID_COPY_COUNT",
            LibraryError::DateOutOfRange => "DATE_OUT_OF_RANGE",
            LibraryError::InventoryMismatch(_) => "INVENTORY_MISMATCH",
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /books - Catalog a book.
async fn create_book(
    State(state): State<AppState>,
    Json(request): Json<NewBookRequest>,
) -> Result<(StatusCode, Json<BookRecord>), AppError> {
    let id = state.library.add_book(
        &request.title,
        &request.author,
        &request.isbn,
        request.total_copies,
    )?;
    let book = state
        .library
        .book(id)
        .ok_or(LibraryError::BookNotFound(id))?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /books - List books with optional search and sort.
async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BookListParams>,
) -> Json<Vec<BookRecord>> {
    let query = BookQuery::new()
        .with_search(params.search.as_deref().unwrap_or_default())
        .sorted_by(BookSort::from_key(params.sort.as_deref().unwrap_or_default()));
    Json(state.library.books(&query))
}

/// POST /patrons - Register a patron.
async fn create_patron(
    State(state): State<AppState>,
    Json(request): Json<NewPatronRequest>,
) -> Result<(StatusCode, Json<Patron>), AppError> {
    let id = state.library.add_patron(&request.name, &request.email)?;
    let patron = state
        .library
        .patron(id)
        .ok_or(LibraryError::PatronNotFound(id))?;
    Ok((StatusCode::CREATED, Json(patron)))
}

/// GET /patrons - List patrons by name.
async fn list_patrons(State(state): State<AppState>) -> Json<Vec<Patron>> {
    Json(state.library.patrons())
}

/// POST /loans - Borrow a book.
async fn borrow(
    State(state): State<AppState>,
    Json(request): Json<BorrowRequest>,
) -> Result<(StatusCode, Json<Loan>), AppError> {
    let loan = state.library.borrow(
        PatronId(request.patron_id),
        BookId(request.book_id),
        today_or(request.date),
    );
    flush_journal(&state.library);
    Ok((StatusCode::CREATED, Json(loan?)))
}

/// POST /loans/{id}/return - Return a loan.
async fn return_loan(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    request: Option<Json<ReturnRequest>>,
) -> Result<Json<ReturnReceipt>, AppError> {
    let date = request.and_then(|Json(request)| request.date);
    let receipt = state.library.return_loan(LoanId(id), today_or(date));
    flush_journal(&state.library);
    Ok(Json(receipt?))
}

/// GET /loans/active - Active loans with live fines.
async fn active_loans(
    State(state): State<AppState>,
    Query(params): Query<DateParams>,
) -> Json<Vec<ActiveLoan>> {
    Json(state.library.active_loans(today_or(params.date)))
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/books", post(create_book).get(list_books))
        .route("/patrons", post(create_patron).get(list_patrons))
        .route("/loans", post(borrow))
        .route("/loans/active", get(active_loans))
        .route("/loans/{id}/return", post(return_loan))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    let config = match std::env::var("LIBRARY_CONFIG") {
        Ok(path) => LibraryConfig::load(&path).unwrap_or_else(|e| {
            eprintln!("Error loading config '{}': {}", path, e);
            std::process::exit(1);
        }),
        Err(_) => LibraryConfig::default(),
    };
    if let Err(e) = logging::init(&config.logging, false) {
        eprintln!("Error initializing logging: {}", e);
    }

    let state = AppState {
        library: Arc::new(Library::from_config(&config)),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Library API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /books              - Catalog a book");
    println!("  GET  /books              - List books");
    println!("  POST /patrons            - Register a patron");
    println!("  GET  /patrons            - List patrons");
    println!("  POST /loans              - Borrow a book");
    println!("  POST /loans/:id/return   - Return a loan");
    println!("  GET  /loans/active       - Active loans with fines");

    axum::serve(listener, app).await.unwrap();
}
