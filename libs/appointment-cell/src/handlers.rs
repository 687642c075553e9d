use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use doctor_cell::models::DoctorMatch;
use shared_models::error::AppError;

use crate::models::{AppointmentError, BookAppointmentRequest};
use crate::BookingState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Free-text doctor reference.
    pub doctor: String,
    pub date: NaiveDate,
}

/// Book an appointment. Every orchestrator outcome is mapped to a
/// caller-facing message the conversational front end can relay verbatim.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let confirmation = state
        .booking
        .book_appointment(request)
        .await
        .map_err(booking_error_response)?;

    let mut message = format!(
        "SUCCESS. Booked with {} at {}.",
        confirmation.doctor_name,
        confirmation.start_time.to_rfc3339()
    );
    if !confirmation.mirrored {
        message.push_str(" The calendar invite is still pending and will be retried.");
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": message,
            "appointment_id": confirmation.appointment_id,
            "doctor": confirmation.doctor_name,
            "start_time": confirmation.start_time,
            "end_time": confirmation.end_time,
            "mirrored": confirmation.mirrored,
        })),
    ))
}

/// Read-only availability projection for conversational consumption.
#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let matched = state
        .directory
        .resolve(&query.doctor)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let doctor = match matched {
        DoctorMatch::Exact(doctor) | DoctorMatch::Fuzzy(doctor) => doctor,
        DoctorMatch::NoMatch => {
            let error = AppointmentError::DoctorNotFound {
                query: query.doctor.clone(),
                suggestions: state
                    .directory
                    .list_all()
                    .await
                    .map(|docs| docs.iter().map(|d| d.catalogue_entry()).collect())
                    .unwrap_or_default(),
            };
            return Err(AppError::NotFound(error.caller_message()));
        }
    };

    let summary = state
        .availability
        .day_summary(&doctor, query.date)
        .await
        .map_err(booking_error_response)?;

    Ok(Json(json!({ "message": summary })))
}

/// Reconciliation sweep contract: confirmed appointments whose calendar
/// mirror is still pending.
#[axum::debug_handler]
pub async fn list_unmirrored(
    State(state): State<Arc<BookingState>>,
) -> Result<Json<Value>, AppError> {
    let appointments = state
        .booking
        .unmirrored_appointments()
        .await
        .map_err(booking_error_response)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

/// Retry the calendar mirror for one appointment. Idempotent.
#[axum::debug_handler]
pub async fn mirror_appointment(
    State(state): State<Arc<BookingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking
        .mirror_appointment(appointment_id)
        .await
        .map_err(booking_error_response)?;

    Ok(Json(json!({ "appointment": appointment })))
}

/// Conversation audit log for a booking session.
#[axum::debug_handler]
pub async fn session_audit(
    State(state): State<Arc<BookingState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let messages = state
        .chat_log
        .history(&session_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "session_id": session_id,
        "messages": messages,
    })))
}

fn booking_error_response(error: AppointmentError) -> AppError {
    let message = error.caller_message();
    match error {
        AppointmentError::ValidationError { .. } => AppError::ValidationError(message),
        AppointmentError::DoctorNotFound { .. } => AppError::NotFound(message),
        AppointmentError::SlotConflict { .. } => AppError::Conflict(message),
        AppointmentError::AvailabilityUnknown(_) => AppError::Unavailable(message),
        AppointmentError::PersistenceFailure(_) => AppError::Internal(message),
        AppointmentError::MirrorFailure(_) => AppError::ExternalService(message),
        AppointmentError::NotFound => AppError::NotFound(message),
        AppointmentError::DatabaseError(_) => AppError::Database(message),
    }
}
