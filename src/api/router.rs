use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::catalog::{
    create_borrower, create_item, delete_borrower, delete_item, list_borrowers, list_items,
    search_items, update_borrower, update_item,
};
use super::handlers::{
    AppState, borrow_item, get_availability, list_open_loans, list_overdue, return_item,
};

/// Creates the API router with lending and catalog endpoints
///
/// Lending:
/// - POST /loans - Borrow an item
/// - PUT /loans/return/:borrower_id/:item_id - Return an item
/// - GET /loans/overdue - List overdue loans
/// - GET /borrowers/:id/loans - List a borrower's open loans
/// - GET /items/:id/availability - Copies currently on the shelf
///
/// Catalog:
/// - GET/POST /items, GET /items/search, PUT/DELETE /items/:id
/// - GET/POST /borrowers, PUT/DELETE /borrowers/:id
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Lending
        .route("/loans", post(borrow_item))
        .route("/loans/return/:borrower_id/:item_id", put(return_item))
        .route("/loans/overdue", get(list_overdue))
        .route("/borrowers/:id/loans", get(list_open_loans))
        .route("/items/:id/availability", get(get_availability))
        // Catalog
        .route("/items", get(list_items).post(create_item))
        .route("/items/search", get(search_items))
        .route("/items/:id", put(update_item).delete(delete_item))
        .route("/borrowers", get(list_borrowers).post(create_borrower))
        .route("/borrowers/:id", put(update_borrower).delete(delete_borrower))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
