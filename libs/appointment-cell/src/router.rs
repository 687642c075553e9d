use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::BookingState;

pub fn appointment_routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/availability", get(handlers::check_availability))
        .route("/unmirrored", get(handlers::list_unmirrored))
        .route("/{appointment_id}/mirror", post(handlers::mirror_appointment))
        .route("/audit/{session_id}", get(handlers::session_audit))
        .with_state(state)
}
