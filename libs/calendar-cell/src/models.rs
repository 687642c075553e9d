use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// CALENDAR GATEWAY MODELS
// ==============================================================================

/// An event fetched from the external calendar. Events are treated as busy
/// blocks regardless of whether this system created them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Payload for mirroring a locally persisted appointment onto the external
/// calendar. The description must embed the appointment id so a retried
/// mirror can find the existing event instead of creating a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendee_email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Calendar integration not configured")]
    NotConfigured,

    #[error("Calendar authentication failed: {0}")]
    AuthFailed(String),

    #[error("Calendar API error: {message}")]
    ApiError { message: String },

    #[error("Calendar request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Failed to parse calendar response: {0}")]
    ParseError(String),
}
