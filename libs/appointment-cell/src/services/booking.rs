// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use calendar_cell::models::NewCalendarEvent;
use calendar_cell::services::gateway::CalendarGateway;
use doctor_cell::models::{Doctor, DoctorMatch};
use doctor_cell::services::directory::DoctorDirectory;
use shared_database::chat::ChatLog;
use shared_models::chat::{ChatMessage, ChatRole};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    BookingConfirmation, SlotAvailability, ValidatedBooking,
};
use crate::services::availability::AvailabilityService;
use crate::store::{AppointmentStore, StoreError};

const DEFAULT_DURATION_MINUTES: i64 = 60;

/// The booking state machine: Validating -> Resolving -> Checking ->
/// Persisting -> Mirroring -> Done, with terminal failure exits from every
/// state. The local record is the authoritative booking; a mirror failure
/// leaves it Confirmed and unmirrored rather than rolling it back.
pub struct BookingService {
    directory: Arc<dyn DoctorDirectory>,
    store: Arc<dyn AppointmentStore>,
    calendar: Arc<dyn CalendarGateway>,
    chat_log: Arc<dyn ChatLog>,
    availability: AvailabilityService,
    calendar_timeout: Duration,
}

impl BookingService {
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

        Self {
            directory,
            store,
            calendar,
            chat_log,
            availability,
            calendar_timeout,
        }
    }

    pub fn availability(&self) -> &AvailabilityService {
        &self.availability
    }

    /// Book an appointment end to end.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<BookingConfirmation, AppointmentError> {
        info!(
            "Booking appointment for '{}' with doctor reference '{}'",
            request.patient_name, request.doctor
        );

        // Validating
        let booking = validate_booking(&request)?;

        // Resolving
        let doctor = self.resolve_doctor(&booking.doctor_reference).await?;

        // Checking (advisory; the store re-checks authoritatively)
        match self
            .availability
            .check_slot(doctor.id, booking.start_time, booking.end_time)
            .await
        {
            SlotAvailability::Free => {}
            SlotAvailability::Busy(conflicts) => {
                return Err(AppointmentError::SlotConflict { conflicts });
            }
            SlotAvailability::Unknown(reason) => {
                return Err(AppointmentError::AvailabilityUnknown(reason));
            }
        }

        // Persisting
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            patient_name: booking.patient_name.clone(),
            patient_email: booking.patient_email.clone(),
            patient_phone: booking.patient_phone.clone(),
            start_time: booking.start_time,
            end_time: booking.end_time,
            status: AppointmentStatus::Confirmed,
            notes: Some(booking.reason.clone()),
            external_event_id: None,
            source_session_id: booking.source_session_id.clone(),
            created_at: Utc::now(),
        };

        let appointment = self
            .store
            .insert_if_free(appointment)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(conflicts) => AppointmentError::SlotConflict { conflicts },
                StoreError::Database(msg) => AppointmentError::PersistenceFailure(msg),
            })?;

        // Mirroring (best effort, never unwinds the committed insert)
        let mirrored = match self.mirror(&appointment, &doctor).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Mirror failed for appointment {}; booking stands, pending reconciliation: {}",
                    appointment.id, e
                );
                false
            }
        };

        self.append_audit(&appointment, &doctor, mirrored).await;

        info!(
            "Appointment {} booked with {} (mirrored: {})",
            appointment.id, doctor.name, mirrored
        );

        Ok(BookingConfirmation {
            appointment_id: appointment.id,
            doctor_name: doctor.name,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            mirrored,
        })
    }

    /// Retry the calendar mirror for one appointment. Safe to call from a
    /// reconciliation sweep: an already-mirrored appointment is returned
    /// unchanged, and the idempotency marker is checked before any create.
    pub async fn mirror_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .store
            .get(appointment_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.is_mirrored() {
            debug!("Appointment {} already mirrored", appointment_id);
            return Ok(appointment);
        }

        let doctor = self
            .directory
            .get(appointment.doctor_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        self.mirror(&appointment, &doctor)
            .await
            .map_err(|e| AppointmentError::MirrorFailure(e))?;

        self.store
            .get(appointment_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::NotFound)
    }

    /// List appointments whose calendar mirror is still pending.
    pub async fn unmirrored_appointments(&self) -> Result<Vec<Appointment>, AppointmentError> {
        self.store
            .unmirrored()
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    async fn resolve_doctor(&self, reference: &str) -> Result<Doctor, AppointmentError> {
        let matched = self
            .directory
            .resolve(reference)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match matched {
            DoctorMatch::Exact(doctor) | DoctorMatch::Fuzzy(doctor) => Ok(doctor),
            DoctorMatch::NoMatch => {
                let suggestions = self
                    .directory
                    .list_all()
                    .await
                    .map(|docs| docs.iter().map(Doctor::catalogue_entry).collect())
                    .unwrap_or_default();

                Err(AppointmentError::DoctorNotFound {
                    query: reference.to_string(),
                    suggestions,
                })
            }
        }
    }

    /// Create the external event and patch its id onto the stored row. The
    /// appointment id embedded in the description is the idempotency
    /// correlator: a retried mirror finds the existing event instead of
    /// creating a second one.
    async fn mirror(&self, appointment: &Appointment, doctor: &Doctor) -> Result<(), String> {
        let marker = mirror_marker(appointment.id);
        let window_start = appointment.start_time - chrono::Duration::days(1);
        let window_end = appointment.end_time + chrono::Duration::days(1);

        let existing = tokio::time::timeout(
            self.calendar_timeout,
            self.calendar
                .find_event_by_marker(&marker, window_start, window_end),
        )
        .await
        .map_err(|_| "calendar request timed out".to_string())?
        .map_err(|e| e.to_string())?;

        let event_id = match existing {
            Some(event) => {
                debug!(
                    "Found existing mirror event {} for appointment {}",
                    event.id, appointment.id
                );
                event.id
            }
            None => {
                let reason = appointment.notes.clone().unwrap_or_default();
                let event = NewCalendarEvent {
                    summary: format!("Appt: {} ({})", appointment.patient_name, doctor.name),
                    description: format!("Reason: {}\n{}", reason, marker),
                    start: appointment.start_time,
                    end: appointment.end_time,
                    attendee_email: Some(appointment.patient_email.clone()),
                };

                let created = tokio::time::timeout(
                    self.calendar_timeout,
                    self.calendar.create_event(event),
                )
                .await
                .map_err(|_| "calendar request timed out".to_string())?
                .map_err(|e| e.to_string())?;

                created.id
            }
        };

        self.store
            .attach_external_event(appointment.id, &event_id)
            .await
            .map_err(|e| e.to_string())
    }

    /// Best-effort audit line into the originating chat session.
    async fn append_audit(&self, appointment: &Appointment, doctor: &Doctor, mirrored: bool) {
        let Some(session_id) = appointment.source_session_id.as_deref() else {
            return;
        };

        let content = format!(
            "Booked {} with {} at {} (mirrored: {})",
            appointment.patient_name,
            doctor.name,
            appointment.start_time.to_rfc3339(),
            mirrored
        );

        if let Err(e) = self
            .chat_log
            .append(ChatMessage::new(session_id, ChatRole::Model, &content))
            .await
        {
            warn!("Failed to append booking audit line: {}", e);
        }
    }
}

pub fn mirror_marker(appointment_id: Uuid) -> String {
    format!("Appointment ID: {}", appointment_id)
}

/// Field-level validation of a raw booking request. The orchestrator never
/// partially proceeds: the first missing or malformed field fails the whole
/// attempt before any lookup or external call is made.
pub fn validate_booking(
    request: &BookAppointmentRequest,
) -> Result<ValidatedBooking, AppointmentError> {
    let patient_name = request.patient_name.trim();
    if patient_name.is_empty() {
        return Err(validation("patient_name", "must not be empty"));
    }

    let patient_email = request.patient_email.trim();
    if patient_email.is_empty() {
        return Err(validation("patient_email", "must not be empty"));
    }
    if !is_valid_email(patient_email) {
        return Err(validation("patient_email", "must be a valid email address"));
    }

    let doctor_reference = request.doctor.trim();
    if doctor_reference.is_empty() {
        return Err(validation("doctor", "must not be empty"));
    }

    let reason = request.reason.trim();
    if reason.is_empty() {
        return Err(validation("reason", "must not be empty"));
    }

    let start_time = parse_start_time(&request.start_time)
        .ok_or_else(|| validation("start_time", "must be an ISO 8601 timestamp"))?;

    let duration = request.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    if duration <= 0 {
        return Err(validation("duration_minutes", "must be positive"));
    }
    let end_time = start_time + chrono::Duration::minutes(duration);

    Ok(ValidatedBooking {
        patient_name: patient_name.to_string(),
        patient_email: patient_email.to_string(),
        patient_phone: request.patient_phone.clone(),
        doctor_reference: doctor_reference.to_string(),
        start_time,
        end_time,
        reason: reason.to_string(),
        source_session_id: request.source_session_id.clone(),
    })
}

fn validation(field: &str, message: &str) -> AppointmentError {
    AppointmentError::ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn is_valid_email(email: &str) -> bool {
    let email_regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    email_regex.is_match(email) && email.len() <= 254
}

/// Accept RFC 3339 as well as the offset-less form the conversational
/// caller tends to produce ("2025-11-22T10:00:00"), interpreted in the
/// clinic time zone (stored as UTC wall time here).
fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
