// libs/calendar-cell/src/services/gateway.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{CalendarError, CalendarEvent, NewCalendarEvent};

/// Port over the external calendar provider.
///
/// Implementations isolate all provider-specific I/O: listing busy intervals
/// in a window, creating mirrored events, and locating an event by the
/// idempotency marker embedded in its description.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// List events whose intervals fall within the given window.
    async fn list_events(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError>;

    /// Create an event and return the provider's stored representation.
    async fn create_event(&self, event: NewCalendarEvent)
        -> Result<CalendarEvent, CalendarError>;

    /// Find an event carrying the given marker in its description. Used by
    /// the mirroring step before creating, so retried sweeps stay idempotent.
    async fn find_event_by_marker(
        &self,
        marker: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Option<CalendarEvent>, CalendarError> {
        let events = self.list_events(window_start, window_end).await?;
        Ok(events.into_iter().find(|e| {
            e.description
                .as_deref()
                .is_some_and(|d| d.contains(marker))
        }))
    }
}

/// Gateway used when no calendar provider is configured. Every call fails
/// with `NotConfigured`, so availability reads as Unknown rather than
/// silently Free.
pub struct DisconnectedCalendar;

#[async_trait]
impl CalendarGateway for DisconnectedCalendar {
    async fn list_events(
        &self,
        _window_start: DateTime<Utc>,
        _window_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        Err(CalendarError::NotConfigured)
    }

    async fn create_event(
        &self,
        _event: NewCalendarEvent,
    ) -> Result<CalendarEvent, CalendarError> {
        Err(CalendarError::NotConfigured)
    }
}
