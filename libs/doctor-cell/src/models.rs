use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// DOCTOR DIRECTORY MODELS
// ==============================================================================

/// A doctor record from the directory. Immutable during a booking flow;
/// records are seeded at admin time and never deleted by this core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    /// Fee in minor currency units (fixed-point, two fractional digits).
    pub consultation_fee_cents: i64,
    /// Free-form schedule hint shown to patients. Advisory only; conflict
    /// checks never consult this field.
    pub availability_text: Option<String>,
    pub department_id: Option<Uuid>,
}

impl Doctor {
    /// Catalogue line shown to the conversational caller.
    pub fn catalogue_entry(&self) -> String {
        format!("{} ({})", self.name, self.specialization)
    }

    pub fn fee_display(&self) -> String {
        format!("{}.{:02}", self.consultation_fee_cents / 100, self.consultation_fee_cents % 100)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
}

/// Outcome of resolving a free-text doctor reference against the catalogue.
///
/// An exact (case-insensitive) name match always beats a substring match;
/// among substring matches the first in id order wins, so a given query and
/// catalogue can never resolve to two different doctors on different runs.
#[derive(Debug, Clone, PartialEq)]
pub enum DoctorMatch {
    Exact(Doctor),
    Fuzzy(Doctor),
    NoMatch,
}

impl DoctorMatch {
    pub fn into_doctor(self) -> Option<Doctor> {
        match self {
            DoctorMatch::Exact(doctor) | DoctorMatch::Fuzzy(doctor) => Some(doctor),
            DoctorMatch::NoMatch => None,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
