use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, all_borrows, borrow_book, borrow_history, cancel_reservation, my_borrows,
    my_reservations, overdue_borrows, renew_borrow, reserve_book, return_book,
};

/// Creates the API router with all lending endpoints
///
/// Command endpoints (write operations):
/// - POST /borrows/borrow/:book_id - Borrow a book
/// - POST /borrows/reserve/:book_id - Reserve a book
/// - PUT /borrows/return/:borrow_id - Return a borrowed book
/// - PUT /borrows/renew/:borrow_id - Renew a borrow
/// - DELETE /borrows/cancel/:borrow_id - Cancel a reservation
///
/// Query endpoints (read operations):
/// - GET /borrows/my-borrows - Caller's active borrows
/// - GET /borrows/my-reservations - Caller's active reservations
/// - GET /borrows/history - Caller's borrow history
/// - GET /borrows/all - All records (staff only)
/// - GET /borrows/overdue - Run the overdue sweep (staff only)
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Command endpoints
        .route("/borrows/borrow/:book_id", post(borrow_book))
        .route("/borrows/reserve/:book_id", post(reserve_book))
        .route("/borrows/return/:borrow_id", put(return_book))
        .route("/borrows/renew/:borrow_id", put(renew_borrow))
        .route("/borrows/cancel/:borrow_id", delete(cancel_reservation))
        // Query endpoints
        .route("/borrows/my-borrows", get(my_borrows))
        .route("/borrows/my-reservations", get(my_reservations))
        .route("/borrows/history", get(borrow_history))
        .route("/borrows/all", get(all_borrows))
        .route("/borrows/overdue", get(overdue_borrows))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
