// Record Keeper - Web Server
// JSON API over the contact book and the expense log

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use record_keeper::{
    coerce_expense, db, logging, CategoryFilter, Config, Contact, ContactBook, Expense,
    StoreError,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    contacts: Arc<Mutex<ContactBook>>,
    db: Arc<Mutex<Connection>>,
}

/// Stores only commit in-memory changes after they persist, so a poisoned lock is still usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Map a store error onto a status code and an error envelope
fn error_response(err: StoreError) -> Response {
    let status = match err {
        StoreError::Validation { .. } => StatusCode::BAD_REQUEST,
        StoreError::Selection { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
    }
    (status, Json(ApiResponse::<()>::err(err.to_string()))).into_response()
}

fn respond<T: Serialize>(result: record_keeper::Result<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(err) => error_response(err),
    }
}

/// Contact as returned by the API, with its current row
#[derive(Serialize)]
struct ContactResponse {
    index: usize,
    id: String,
    name: String,
    phone: String,
}

impl ContactResponse {
    fn from_contact(index: usize, contact: &Contact) -> Self {
        Self {
            index,
            id: contact.id.to_string(),
            name: contact.name.clone(),
            phone: contact.phone.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ContactRequest {
    name: String,
    phone: String,
}

#[derive(Deserialize)]
struct ExpenseRequest {
    date: String,
    category: String,
    amount: f64,
    #[serde(default)]
    description: String,
}

#[derive(Serialize)]
struct CreatedResponse {
    id: i64,
}

fn list_contacts(book: &ContactBook) -> Vec<ContactResponse> {
    book.list()
        .iter()
        .enumerate()
        .map(|(i, c)| ContactResponse::from_contact(i, c))
        .collect()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/contacts - All contacts in file order
async fn get_contacts(State(state): State<AppState>) -> Response {
    let book = lock(&state.contacts);
    respond(Ok(list_contacts(&book)))
}

/// POST /api/contacts - Append a contact
async fn create_contact(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Response {
    let mut book = lock(&state.contacts);
    let result = book.add(&req.name, &req.phone).map(|_| list_contacts(&book));
    respond(result)
}

/// PUT /api/contacts/:index - Overwrite the contact at a row
async fn update_contact(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(req): Json<ContactRequest>,
) -> Response {
    let mut book = lock(&state.contacts);
    let result = book
        .update(Some(index), &req.name, &req.phone)
        .map(|_| list_contacts(&book));
    respond(result)
}

/// DELETE /api/contacts/:index - Remove the contact at a row
async fn delete_contact(State(state): State<AppState>, Path(index): Path<usize>) -> Response {
    let mut book = lock(&state.contacts);
    let result = book.remove(Some(index)).map(|_| list_contacts(&book));
    respond(result)
}

/// GET /api/expenses - All expenses in id order
async fn get_expenses(State(state): State<AppState>) -> Response {
    let conn = lock(&state.db);
    respond::<Vec<Expense>>(db::list_all(&conn))
}

/// POST /api/expenses - Record an expense
async fn create_expense(
    State(state): State<AppState>,
    Json(req): Json<ExpenseRequest>,
) -> Response {
    let expense = match coerce_expense(
        &req.date,
        &req.category,
        &req.amount.to_string(),
        &req.description,
    ) {
        Ok(expense) => expense,
        Err(err) => return error_response(err),
    };

    let conn = lock(&state.db);
    respond(db::insert_expense(&conn, &expense).map(|id| CreatedResponse { id }))
}

/// GET /api/expenses/date/:date - Expenses on one date
async fn get_expenses_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Response {
    let conn = lock(&state.db);
    respond(db::list_by_date(&conn, &date))
}

/// GET /api/expenses/category/:category - Expenses in a category ("All" for every row)
async fn get_expenses_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Response {
    // Path already percent-decodes the segment
    let conn = lock(&state.db);
    respond(db::search_by_category(&conn, &CategoryFilter::parse(&category)))
}

/// GET /api/expenses/summary - Totals per category
async fn get_summary(State(state): State<AppState>) -> Response {
    let conn = lock(&state.db);
    respond::<BTreeMap<String, f64>>(db::sum_by_category(&conn))
}

/// GET /api/expenses/timeline - Totals per day
async fn get_timeline(State(state): State<AppState>) -> Response {
    let conn = lock(&state.db);
    respond(db::daily_totals(&conn))
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/contacts", get(get_contacts).post(create_contact))
        .route("/contacts/:index", put(update_contact).delete(delete_contact))
        .route("/expenses", get(get_expenses).post(create_expense))
        .route("/expenses/date/:date", get(get_expenses_by_date))
        .route("/expenses/category/:category", get(get_expenses_by_category))
        .route("/expenses/summary", get(get_summary))
        .route("/expenses/timeline", get(get_timeline))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var_os("RECORD_KEEPER_CONFIG").map(std::path::PathBuf::from);
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;
    logging::init(false, &config.log_level)?;

    let book = ContactBook::open(&config.contacts_file)
        .with_context(|| format!("Failed to open contact book {:?}", config.contacts_file))?;
    let conn = db::open_database(&config.expenses_db)
        .with_context(|| format!("Failed to open expense database {:?}", config.expenses_db))?;

    tracing::info!(
        contacts = book.len(),
        contacts_file = ?config.contacts_file,
        expenses_db = ?config.expenses_db,
        "stores opened"
    );

    let state = AppState {
        contacts: Arc::new(Mutex::new(book)),
        db: Arc::new(Mutex::new(conn)),
    };

    let addr = std::env::var("RECORD_SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "server listening");
    println!("🚀 Server running on http://{}/api/health", addr);

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}
