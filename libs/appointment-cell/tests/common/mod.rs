#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus, BookAppointmentRequest};
use calendar_cell::models::{CalendarError, CalendarEvent, NewCalendarEvent};
use calendar_cell::services::gateway::CalendarGateway;
use doctor_cell::models::Doctor;
use doctor_cell::services::directory::MemoryDoctorDirectory;

mockall::mock! {
    pub Calendar {}

    #[async_trait]
    impl CalendarGateway for Calendar {
        async fn list_events(
            &self,
            window_start: DateTime<Utc>,
            window_end: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>, CalendarError>;

        async fn create_event(
            &self,
            event: NewCalendarEvent,
        ) -> Result<CalendarEvent, CalendarError>;
    }
}

/// Parse a clinic-local timestamp like "2025-11-23T10:00:00".
pub fn ts(raw: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .expect("valid test timestamp")
        .and_utc()
}

pub fn doctor(id: Uuid, name: &str, specialization: &str) -> Doctor {
    Doctor {
        id,
        name: name.to_string(),
        specialization: specialization.to_string(),
        consultation_fee_cents: 15000,
        availability_text: Some("Mon-Fri 9am-4pm".to_string()),
        department_id: None,
    }
}

pub fn sarah_smith() -> Doctor {
    doctor(
        Uuid::from_u128(1),
        "Dr. Sarah Smith",
        "Cardiologist",
    )
}

pub fn john_doe() -> Doctor {
    doctor(Uuid::from_u128(2), "Dr. John Doe", "General Physician")
}

pub fn seeded_directory() -> Arc<MemoryDoctorDirectory> {
    Arc::new(MemoryDoctorDirectory::new(vec![sarah_smith(), john_doe()]))
}

pub fn booking_request(doctor_ref: &str, start: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_name: "Alice Example".to_string(),
        patient_email: "alice@example.com".to_string(),
        patient_phone: None,
        doctor: doctor_ref.to_string(),
        start_time: start.to_string(),
        duration_minutes: Some(60),
        reason: "General checkup".to_string(),
        source_session_id: Some("sess-12345".to_string()),
    }
}

pub fn confirmed_appointment(doctor_id: Uuid, start: &str, end: &str) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        doctor_id,
        patient_name: "Existing Patient".to_string(),
        patient_email: "existing@example.com".to_string(),
        patient_phone: None,
        start_time: ts(start),
        end_time: ts(end),
        status: AppointmentStatus::Confirmed,
        notes: Some("Follow-up".to_string()),
        external_event_id: None,
        source_session_id: None,
        created_at: Utc::now(),
    }
}

pub fn calendar_event(id: &str, start: &str, end: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: "Busy".to_string(),
        description: None,
        start: ts(start),
        end: ts(end),
    }
}

/// A gateway whose listing always succeeds with no events.
pub fn free_calendar() -> MockCalendar {
    let mut calendar = MockCalendar::new();
    calendar
        .expect_list_events()
        .returning(|_, _| Ok(vec![]));
    calendar
}

/// A gateway that never answers within any sane timeout.
pub struct StalledCalendar;

#[async_trait]
impl CalendarGateway for StalledCalendar {
    async fn list_events(
        &self,
        _window_start: DateTime<Utc>,
        _window_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Ok(vec![])
    }

    async fn create_event(
        &self,
        _event: NewCalendarEvent,
    ) -> Result<CalendarEvent, CalendarError> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Err(CalendarError::NotConfigured)
    }
}
