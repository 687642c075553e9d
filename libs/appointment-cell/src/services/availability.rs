// libs/appointment-cell/src/services/availability.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use calendar_cell::services::gateway::CalendarGateway;
use calendar_cell::models::CalendarEvent;
use doctor_cell::models::Doctor;

use crate::models::{AppointmentError, SlotAvailability, TimeSlot};
use crate::store::AppointmentStore;

/// Determines free/busy for a proposed slot from two sources of truth:
/// locally stored confirmed appointments and the external calendar. The
/// stricter result wins; external events count as busy regardless of
/// whether this system created them.
///
/// Everything here is advisory. The authoritative overlap guard runs inside
/// the store's insert transaction.
#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn AppointmentStore>,
    calendar: Arc<dyn CalendarGateway>,
    calendar_timeout: Duration,
}

impl AvailabilityService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        calendar: Arc<dyn CalendarGateway>,
        calendar_timeout: Duration,
    ) -> Self {
        Self {
            store,
            calendar,
            calendar_timeout,
        }
    }

    /// Check whether `[start, end)` is free for the doctor.
    ///
    /// A calendar failure or timeout yields `Unknown`, never `Free`; a local
    /// conflict is reported as `Busy` even when the calendar is unreachable.
    pub async fn check_slot(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SlotAvailability {
        debug!("Checking slot for doctor {} from {} to {}", doctor_id, start, end);

        let slot = TimeSlot { start, end };

        let local = match self.store.confirmed_in_range(doctor_id, start, end).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Local availability lookup failed: {}", e);
                return SlotAvailability::Unknown(e.to_string());
            }
        };

        let mut conflicts: Vec<TimeSlot> = local
            .iter()
            .map(|a| a.slot())
            .filter(|s| s.overlaps(&slot))
            .collect();

        match self.calendar_events_overlapping(start, end).await {
            Ok(events) => {
                conflicts.extend(
                    events
                        .iter()
                        .map(|e| TimeSlot { start: e.start, end: e.end })
                        .filter(|s| s.overlaps(&slot)),
                );
            }
            Err(reason) => {
                if conflicts.is_empty() {
                    return SlotAvailability::Unknown(reason);
                }
                // Already busy locally; the stricter answer stands.
            }
        }

        if conflicts.is_empty() {
            SlotAvailability::Free
        } else {
            conflicts.sort_by_key(|s| s.start);
            conflicts.dedup();
            SlotAvailability::Busy(conflicts)
        }
    }

    /// Human-readable busy summary for one clinic day. Read-only projection
    /// for conversational consumption, not the check used at booking time.
    pub async fn day_summary(
        &self,
        doctor: &Doctor,
        date: NaiveDate,
    ) -> Result<String, AppointmentError> {
        let (day_start, day_end) = day_window(date);

        let local = self
            .store
            .confirmed_in_range(doctor.id, day_start, day_end)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let events = self
            .calendar_events_overlapping(day_start, day_end)
            .await
            .map_err(AppointmentError::AvailabilityUnknown)?;

        let mut busy: Vec<TimeSlot> = local.iter().map(|a| a.slot()).collect();
        busy.extend(events.iter().map(|e| TimeSlot { start: e.start, end: e.end }));
        busy.retain(|s| s.start < day_end && s.end > day_start);
        busy.sort_by_key(|s| s.start);
        busy.dedup();

        if busy.is_empty() {
            return Ok(format!("{} is completely free on {}.", doctor.name, date));
        }

        let listed: Vec<String> = busy
            .iter()
            .map(|s| format!("{} - {}", s.start.format("%H:%M"), s.end.format("%H:%M")))
            .collect();
        Ok(format!(
            "Busy slots for {} on {}: {}",
            doctor.name,
            date,
            listed.join(", ")
        ))
    }

    /// Fetch external events for every clinic day spanned by `[from, to)`,
    /// bounded by the configured timeout so a slow provider cannot block the
    /// caller. A slot crossing midnight must see events on both days.
    async fn calendar_events_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, String> {
        let (window_start, _) = day_window(from.date_naive());
        // The range is half-open, so a slot ending exactly at midnight does
        // not drag in the following day.
        let (_, window_end) = day_window((to - chrono::Duration::nanoseconds(1)).date_naive());

        match tokio::time::timeout(
            self.calendar_timeout,
            self.calendar.list_events(window_start, window_end),
        )
        .await
        {
            Ok(Ok(events)) => Ok(events),
            Ok(Err(e)) => {
                warn!("Calendar listing failed: {}", e);
                Err(e.to_string())
            }
            Err(_) => {
                warn!("Calendar listing timed out after {:?}", self.calendar_timeout);
                Err("calendar request timed out".to_string())
            }
        }
    }
}

fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
    (start, start + chrono::Duration::days(1))
}
