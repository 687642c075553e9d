use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use appointment_cell::BookingState;
use doctor_cell::router::doctor_routes;
use doctor_cell::services::directory::DoctorDirectory;

pub fn create_router(directory: Arc<dyn DoctorDirectory>, booking: Arc<BookingState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic Scheduler API is running!" }))
        .nest("/doctors", doctor_routes(directory))
        .nest("/appointments", appointment_routes(booking))
}
