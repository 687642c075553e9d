// libs/doctor-cell/src/services/directory.rs
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Doctor, DoctorError, DoctorMatch};
use crate::services::matching::resolve_doctor;

/// Read-only lookup over the doctor catalogue.
///
/// `list_all` returns doctors in stable id order; an empty catalogue is a
/// valid result, not an error.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Doctor>, DoctorError>;

    /// Resolve a free-text doctor reference. Delegates the tie-break to
    /// [`resolve_doctor`] so every implementation matches identically.
    async fn resolve(&self, name_fragment: &str) -> Result<DoctorMatch, DoctorError> {
        let catalogue = self.list_all().await?;
        Ok(resolve_doctor(name_fragment, &catalogue))
    }

    async fn get(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let catalogue = self.list_all().await?;
        catalogue
            .into_iter()
            .find(|d| d.id == doctor_id)
            .ok_or(DoctorError::NotFound)
    }
}

pub struct SupabaseDoctorDirectory {
    supabase: SupabaseClient,
}

impl SupabaseDoctorDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl DoctorDirectory for SupabaseDoctorDirectory {
    async fn list_all(&self) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Listing doctor catalogue");

        let doctors: Vec<Doctor> = self
            .supabase
            .request(Method::GET, "/rest/v1/doctors?order=id.asc", None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        Ok(doctors)
    }
}

/// In-process catalogue used in tests and when no database is configured.
pub struct MemoryDoctorDirectory {
    doctors: Vec<Doctor>,
}

impl MemoryDoctorDirectory {
    pub fn new(mut doctors: Vec<Doctor>) -> Self {
        doctors.sort_by_key(|d| d.id);
        Self { doctors }
    }

    pub fn empty() -> Self {
        Self { doctors: vec![] }
    }

    /// The demo catalogue shipped with the seed data.
    pub fn seeded() -> Self {
        Self::new(vec![
            Doctor {
                id: Uuid::new_v4(),
                name: "Dr. Sarah Smith".to_string(),
                specialization: "Cardiologist".to_string(),
                consultation_fee_cents: 15000,
                availability_text: Some("Mon-Fri 9am-4pm".to_string()),
                department_id: None,
            },
            Doctor {
                id: Uuid::new_v4(),
                name: "Dr. John Doe".to_string(),
                specialization: "General Physician".to_string(),
                consultation_fee_cents: 8000,
                availability_text: Some("Tue-Sat 10am-6pm".to_string()),
                department_id: None,
            },
        ])
    }
}

#[async_trait]
impl DoctorDirectory for MemoryDoctorDirectory {
    async fn list_all(&self) -> Result<Vec<Doctor>, DoctorError> {
        Ok(self.doctors.clone())
    }
}
