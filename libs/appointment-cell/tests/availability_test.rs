mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use uuid::Uuid;

use appointment_cell::services::availability::AvailabilityService;
use appointment_cell::store::{AppointmentStore, MemoryAppointmentStore};
use appointment_cell::SlotAvailability;
use calendar_cell::models::CalendarError;

use common::{calendar_event, confirmed_appointment, free_calendar, sarah_smith, ts, MockCalendar};

fn service(
    store: Arc<MemoryAppointmentStore>,
    calendar: MockCalendar,
) -> AvailabilityService {
    AvailabilityService::new(store, Arc::new(calendar), Duration::from_secs(2))
}

#[tokio::test]
async fn slot_is_free_when_both_sources_are_empty() {
    let store = Arc::new(MemoryAppointmentStore::new());
    let availability = service(Arc::clone(&store), free_calendar());

    let result = availability
        .check_slot(
            Uuid::from_u128(1),
            ts("2025-11-23T10:00:00"),
            ts("2025-11-23T11:00:00"),
        )
        .await;

    assert_eq!(result, SlotAvailability::Free);
}

#[tokio::test]
async fn local_confirmed_appointment_makes_slot_busy() {
    let store = Arc::new(MemoryAppointmentStore::new());
    let doctor_id = Uuid::from_u128(1);
    store
        .insert_if_free(confirmed_appointment(
            doctor_id,
            "2025-11-23T10:00:00",
            "2025-11-23T11:00:00",
        ))
        .await
        .unwrap();

    let availability = service(Arc::clone(&store), free_calendar());

    let result = availability
        .check_slot(doctor_id, ts("2025-11-23T10:30:00"), ts("2025-11-23T11:30:00"))
        .await;

    assert_matches!(result, SlotAvailability::Busy(conflicts) => {
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].start, ts("2025-11-23T10:00:00"));
    });
}

#[tokio::test]
async fn external_calendar_event_makes_slot_busy() {
    let store = Arc::new(MemoryAppointmentStore::new());

    // Event created outside this system still blocks the slot.
    let mut calendar = MockCalendar::new();
    calendar.expect_list_events().returning(|_, _| {
        Ok(vec![calendar_event(
            "ext-1",
            "2025-11-23T10:00:00",
            "2025-11-23T11:00:00",
        )])
    });

    let availability = service(Arc::clone(&store), calendar);

    let result = availability
        .check_slot(
            Uuid::from_u128(1),
            ts("2025-11-23T10:30:00"),
            ts("2025-11-23T11:30:00"),
        )
        .await;

    assert_matches!(result, SlotAvailability::Busy(_));
}

#[tokio::test]
async fn calendar_event_outside_slot_does_not_block() {
    let store = Arc::new(MemoryAppointmentStore::new());

    let mut calendar = MockCalendar::new();
    calendar.expect_list_events().returning(|_, _| {
        Ok(vec![calendar_event(
            "ext-1",
            "2025-11-23T08:00:00",
            "2025-11-23T09:00:00",
        )])
    });

    let availability = service(Arc::clone(&store), calendar);

    let result = availability
        .check_slot(
            Uuid::from_u128(1),
            ts("2025-11-23T09:00:00"),
            ts("2025-11-23T10:00:00"),
        )
        .await;

    assert_eq!(result, SlotAvailability::Free);
}

#[tokio::test]
async fn cross_midnight_slot_sees_next_day_calendar_events() {
    let store = Arc::new(MemoryAppointmentStore::new());

    // A faithful provider only returns the event when it falls inside the
    // requested listing window.
    let mut calendar = MockCalendar::new();
    calendar
        .expect_list_events()
        .returning(|window_start, window_end| {
            let event = calendar_event("ext-1", "2025-11-24T00:00:00", "2025-11-24T01:00:00");
            if event.start < window_end && window_start < event.end {
                Ok(vec![event])
            } else {
                Ok(vec![])
            }
        });

    let availability = service(Arc::clone(&store), calendar);

    let result = availability
        .check_slot(
            Uuid::from_u128(1),
            ts("2025-11-23T23:30:00"),
            ts("2025-11-24T00:30:00"),
        )
        .await;

    assert_matches!(result, SlotAvailability::Busy(conflicts) => {
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].start, ts("2025-11-24T00:00:00"));
    });
}

#[tokio::test]
async fn slot_ending_at_midnight_lists_only_its_own_day() {
    let store = Arc::new(MemoryAppointmentStore::new());

    // The listing window must stay within the slot's day; any other window
    // fails to match the expectation.
    let mut calendar = MockCalendar::new();
    calendar
        .expect_list_events()
        .withf(|&window_start, &window_end| {
            window_start == ts("2025-11-23T00:00:00") && window_end == ts("2025-11-24T00:00:00")
        })
        .returning(|_, _| Ok(vec![]));

    let availability = service(Arc::clone(&store), calendar);

    let result = availability
        .check_slot(
            Uuid::from_u128(1),
            ts("2025-11-23T23:00:00"),
            ts("2025-11-24T00:00:00"),
        )
        .await;

    assert_eq!(result, SlotAvailability::Free);
}

#[tokio::test]
async fn calendar_failure_yields_unknown_not_free() {
    let store = Arc::new(MemoryAppointmentStore::new());

    let mut calendar = MockCalendar::new();
    calendar.expect_list_events().returning(|_, _| {
        Err(CalendarError::ApiError {
            message: "backend unavailable".to_string(),
        })
    });

    let availability = service(Arc::clone(&store), calendar);

    let result = availability
        .check_slot(
            Uuid::from_u128(1),
            ts("2025-11-23T10:00:00"),
            ts("2025-11-23T11:00:00"),
        )
        .await;

    assert_matches!(result, SlotAvailability::Unknown(_));
}

#[tokio::test]
async fn local_conflict_wins_over_calendar_failure() {
    let store = Arc::new(MemoryAppointmentStore::new());
    let doctor_id = Uuid::from_u128(1);
    store
        .insert_if_free(confirmed_appointment(
            doctor_id,
            "2025-11-23T10:00:00",
            "2025-11-23T11:00:00",
        ))
        .await
        .unwrap();

    let mut calendar = MockCalendar::new();
    calendar.expect_list_events().returning(|_, _| {
        Err(CalendarError::ApiError {
            message: "backend unavailable".to_string(),
        })
    });

    let availability = service(Arc::clone(&store), calendar);

    let result = availability
        .check_slot(doctor_id, ts("2025-11-23T10:00:00"), ts("2025-11-23T11:00:00"))
        .await;

    // Busy is the stricter answer; the unreachable calendar cannot soften it.
    assert_matches!(result, SlotAvailability::Busy(_));
}

#[tokio::test]
async fn slow_calendar_times_out_into_unknown() {
    let store = Arc::new(MemoryAppointmentStore::new());

    let availability = AvailabilityService::new(
        Arc::clone(&store) as Arc<dyn AppointmentStore>,
        Arc::new(common::StalledCalendar),
        Duration::from_millis(50),
    );

    let result = availability
        .check_slot(
            Uuid::from_u128(1),
            ts("2025-11-23T10:00:00"),
            ts("2025-11-23T11:00:00"),
        )
        .await;

    assert_matches!(result, SlotAvailability::Unknown(reason) => {
        assert!(reason.contains("timed out"));
    });
}

#[tokio::test]
async fn day_summary_reports_completely_free() {
    let store = Arc::new(MemoryAppointmentStore::new());
    let availability = service(Arc::clone(&store), free_calendar());
    let doctor = sarah_smith();

    let summary = availability
        .day_summary(&doctor, NaiveDate::from_ymd_opt(2025, 11, 23).unwrap())
        .await
        .unwrap();

    assert_eq!(summary, "Dr. Sarah Smith is completely free on 2025-11-23.");
}

#[tokio::test]
async fn day_summary_lists_merged_busy_slots_in_order() {
    let store = Arc::new(MemoryAppointmentStore::new());
    let doctor = sarah_smith();
    store
        .insert_if_free(confirmed_appointment(
            doctor.id,
            "2025-11-23T14:00:00",
            "2025-11-23T15:00:00",
        ))
        .await
        .unwrap();

    let mut calendar = MockCalendar::new();
    calendar.expect_list_events().returning(|_, _| {
        Ok(vec![calendar_event(
            "ext-1",
            "2025-11-23T09:00:00",
            "2025-11-23T10:30:00",
        )])
    });

    let availability = service(Arc::clone(&store), calendar);

    let summary = availability
        .day_summary(&doctor, NaiveDate::from_ymd_opt(2025, 11, 23).unwrap())
        .await
        .unwrap();

    assert_eq!(
        summary,
        "Busy slots for Dr. Sarah Smith on 2025-11-23: 09:00 - 10:30, 14:00 - 15:00"
    );
}
