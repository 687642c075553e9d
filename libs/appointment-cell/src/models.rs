// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A durably stored appointment. Created Confirmed by the booking
/// orchestrator; never deleted, only transitioned by admin operations.
/// `external_event_id` stays empty until the calendar mirror succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub external_event_id: Option<String>,
    pub source_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.external_event_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Half-open interval `[start, end)` during which a doctor is occupied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    /// Half-open overlap: back-to-back slots (`self.end == other.start`)
    /// do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%H:%M")
        )
    }
}

// ==============================================================================
// BOOKING REQUEST / RESPONSE MODELS
// ==============================================================================

/// Raw booking intent as supplied by the conversational caller. Field-level
/// validation happens in the orchestrator; intent classification does not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    /// Free-text doctor reference, e.g. "Dr. Sarah" or "sarah smith".
    pub doctor: String,
    /// Appointment start in ISO 8601 (with or without offset).
    pub start_time: String,
    pub duration_minutes: Option<i64>,
    /// Purpose of the visit; stored as the appointment notes.
    pub reason: String,
    pub source_session_id: Option<String>,
}

/// A booking request that has passed field validation.
#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub doctor_reference: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: String,
    pub source_session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub appointment_id: Uuid,
    pub doctor_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// False when the local booking stands but the calendar mirror is still
    /// pending (`external_event_id` empty, retried by the reconciliation
    /// sweep).
    pub mirrored: bool,
}

/// Result of the advisory availability check.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotAvailability {
    Free,
    Busy(Vec<TimeSlot>),
    /// The calendar source of truth could not be consulted. Never collapsed
    /// into `Free`.
    Unknown(String),
}

// ==============================================================================
// ERROR TAXONOMY
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("No doctor matches '{query}'")]
    DoctorNotFound {
        query: String,
        suggestions: Vec<String>,
    },

    #[error("Requested slot conflicts with existing bookings")]
    SlotConflict { conflicts: Vec<TimeSlot> },

    #[error("Availability could not be determined: {0}")]
    AvailabilityUnknown(String),

    #[error("Failed to persist appointment: {0}")]
    PersistenceFailure(String),

    #[error("Failed to mirror appointment to calendar: {0}")]
    MirrorFailure(String),

    #[error("Appointment not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AppointmentError {
    /// Caller-facing text for the conversational front end. Every failure
    /// kind maps to a message the agent can relay; nothing is swallowed.
    pub fn caller_message(&self) -> String {
        match self {
            AppointmentError::ValidationError { field, message } => {
                format!("Missing or invalid field '{}': {}. Please provide it and try again.", field, message)
            }
            AppointmentError::DoctorNotFound { query, suggestions } => {
                if suggestions.is_empty() {
                    format!("Could not find a doctor named '{}'. No doctors are currently in the directory.", query)
                } else {
                    format!(
                        "Could not find a doctor named '{}'. Please pick from: {}",
                        query,
                        suggestions.join(", ")
                    )
                }
            }
            AppointmentError::SlotConflict { conflicts } => {
                let taken: Vec<String> = conflicts.iter().map(|s| s.to_string()).collect();
                if taken.is_empty() {
                    "That time is already taken. Please propose a different time.".to_string()
                } else {
                    format!(
                        "That time is already taken ({}). Please propose a different time.",
                        taken.join(", ")
                    )
                }
            }
            AppointmentError::AvailabilityUnknown(reason) => {
                format!("Could not verify calendar availability ({}). Please try again shortly.", reason)
            }
            AppointmentError::PersistenceFailure(_) => {
                "The booking could not be saved. Nothing was reserved; please try again.".to_string()
            }
            AppointmentError::MirrorFailure(_) => {
                "The booking is confirmed, but the calendar invite is still pending.".to_string()
            }
            AppointmentError::NotFound => "Appointment not found.".to_string(),
            AppointmentError::DatabaseError(_) => {
                "An internal error occurred. Please try again.".to_string()
            }
        }
    }
}
