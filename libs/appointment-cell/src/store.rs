// libs/appointment-cell/src/store.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::{ConflictError, SupabaseClient};

use crate::models::{Appointment, AppointmentStatus, TimeSlot};

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Slot conflicts with an existing confirmed appointment")]
    Conflict(Vec<TimeSlot>),

    #[error("Store error: {0}")]
    Database(String),
}

/// Durable record of appointments.
///
/// `insert_if_free` is the authoritative overlap guard: the no-overlap
/// re-check and the insert happen in one transaction scoped to the doctor's
/// appointment set, so concurrent bookings for the same doctor serialize
/// here. Everything checked earlier in the booking flow is advisory.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Atomically re-check the no-overlap invariant and insert the row with
    /// status Confirmed. Returns the stored row, or `Conflict` with the
    /// intervals that blocked it — in which case nothing was persisted.
    async fn insert_if_free(&self, appointment: Appointment) -> Result<Appointment, StoreError>;

    /// Confirmed appointments for a doctor overlapping `[from, to)`.
    async fn confirmed_in_range(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Patch the mirrored calendar event reference onto a stored row.
    async fn attach_external_event(
        &self,
        appointment_id: Uuid,
        external_event_id: &str,
    ) -> Result<(), StoreError>;

    /// Reconciliation sweep contract: Confirmed rows whose calendar mirror
    /// is still pending.
    async fn unmirrored(&self) -> Result<Vec<Appointment>, StoreError>;
}

// ==============================================================================
// POSTGREST-BACKED STORE
// ==============================================================================

pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert_if_free(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        debug!(
            "Atomic insert for doctor {} from {} to {}",
            appointment.doctor_id, appointment.start_time, appointment.end_time
        );

        // The book_appointment_slot function (db/book_appointment_slot.sql)
        // locks the doctor's rows, re-checks overlap, and inserts in one
        // transaction. PostgREST surfaces a rejected insert as a conflict.
        let args = json!({
            "p_id": appointment.id,
            "p_doctor_id": appointment.doctor_id,
            "p_patient_name": appointment.patient_name,
            "p_patient_email": appointment.patient_email,
            "p_patient_phone": appointment.patient_phone,
            "p_start_time": appointment.start_time.to_rfc3339(),
            "p_end_time": appointment.end_time.to_rfc3339(),
            "p_notes": appointment.notes,
            "p_source_session_id": appointment.source_session_id,
        });

        let result: Result<Vec<Appointment>, _> =
            self.supabase.rpc("book_appointment_slot", args).await;

        match result {
            Ok(mut rows) if !rows.is_empty() => Ok(rows.remove(0)),
            Ok(_) => Err(StoreError::Database(
                "book_appointment_slot returned no row".to_string(),
            )),
            Err(e) if e.downcast_ref::<ConflictError>().is_some() => {
                warn!(
                    "Insert rejected for doctor {}: slot already taken",
                    appointment.doctor_id
                );
                let conflicts = self
                    .confirmed_in_range(
                        appointment.doctor_id,
                        appointment.start_time,
                        appointment.end_time,
                    )
                    .await
                    .map(|rows| rows.iter().map(Appointment::slot).collect())
                    .unwrap_or_default();
                Err(StoreError::Conflict(conflicts))
            }
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    async fn confirmed_in_range(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        // Half-open overlap against [from, to): start < to AND end > from.
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status=eq.confirmed&start_time=lt.{}&end_time=gt.{}&order=start_time.asc",
            doctor_id,
            urlencoding::encode(&to.to_rfc3339()),
            urlencoding::encode(&from.to_rfc3339()),
        );

        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows)
    }

    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);

        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    async fn attach_external_event(
        &self,
        appointment_id: Uuid,
        external_event_id: &str,
    ) -> Result<(), StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let patch = json!({ "external_event_id": external_event_id });

        let _: Value = self
            .supabase
            .request(Method::PATCH, &path, Some(patch))
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn unmirrored(&self) -> Result<Vec<Appointment>, StoreError> {
        let path = "/rest/v1/appointments?status=eq.confirmed&external_event_id=is.null&order=created_at.asc";

        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows)
    }
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

/// In-process store used in tests and when no database is configured.
///
/// All mutations run under one async mutex, which is what makes
/// `insert_if_free` a single transaction: the overlap check and the push
/// cannot interleave with another insert for any doctor.
#[derive(Default)]
pub struct MemoryAppointmentStore {
    rows: Mutex<Vec<Appointment>>,
}

impl MemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for MemoryAppointmentStore {
    async fn insert_if_free(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut rows = self.rows.lock().await;

        let slot = appointment.slot();
        let conflicts: Vec<TimeSlot> = rows
            .iter()
            .filter(|existing| {
                existing.doctor_id == appointment.doctor_id
                    && existing.status == AppointmentStatus::Confirmed
                    && existing.slot().overlaps(&slot)
            })
            .map(Appointment::slot)
            .collect();

        if !conflicts.is_empty() {
            return Err(StoreError::Conflict(conflicts));
        }

        rows.push(appointment.clone());
        Ok(appointment)
    }

    async fn confirmed_in_range(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let window = TimeSlot { start: from, end: to };
        let rows = self.rows.lock().await;

        let mut matching: Vec<Appointment> = rows
            .iter()
            .filter(|a| {
                a.doctor_id == doctor_id
                    && a.status == AppointmentStatus::Confirmed
                    && a.slot().overlaps(&window)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|a| a.start_time);
        Ok(matching)
    }

    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().find(|a| a.id == appointment_id).cloned())
    }

    async fn attach_external_event(
        &self,
        appointment_id: Uuid,
        external_event_id: &str,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;

        let row = rows
            .iter_mut()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| StoreError::Database(format!("appointment {} not found", appointment_id)))?;

        row.external_event_id = Some(external_event_id.to_string());
        Ok(())
    }

    async fn unmirrored(&self) -> Result<Vec<Appointment>, StoreError> {
        let rows = self.rows.lock().await;

        let mut matching: Vec<Appointment> = rows
            .iter()
            .filter(|a| a.status == AppointmentStatus::Confirmed && a.external_event_id.is_none())
            .cloned()
            .collect();
        matching.sort_by_key(|a| a.created_at);
        Ok(matching)
    }
}
