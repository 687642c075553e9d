pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use calendar_cell::services::gateway::CalendarGateway;
use doctor_cell::services::directory::DoctorDirectory;
use shared_database::chat::ChatLog;

use services::availability::AvailabilityService;
use services::booking::BookingService;
use store::AppointmentStore;

pub use models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    BookingConfirmation, SlotAvailability, TimeSlot,
};
pub use store::{MemoryAppointmentStore, StoreError, SupabaseAppointmentStore};

/// Shared state for the appointment routes: the orchestrator plus the
/// collaborators the read-only handlers consult directly.
pub struct BookingState {
    pub booking: BookingService,
    pub availability: AvailabilityService,
    pub directory: Arc<dyn DoctorDirectory>,
    pub chat_log: Arc<dyn ChatLog>,
}

impl BookingState {
    pub fn new(
        directory: Arc<dyn DoctorDirectory>,
        store: Arc<dyn AppointmentStore>,
        calendar: Arc<dyn CalendarGateway>,
        chat_log: Arc<dyn ChatLog>,
        calendar_timeout: Duration,
    ) -> Self {
        let availability = AvailabilityService::new(
            Arc::clone(&store),
            Arc::clone(&calendar),
            calendar_timeout,
        );
        let booking = BookingService::new(
            Arc::clone(&directory),
            store,
            calendar,
            Arc::clone(&chat_log),
            calendar_timeout,
        );

        Self {
            booking,
            availability,
            directory,
            chat_log,
        }
    }
}
