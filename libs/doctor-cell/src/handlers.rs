use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::DoctorError;
use crate::services::directory::DoctorDirectory;

/// List the doctor catalogue as caller-facing lines.
///
/// An empty catalogue is reported with an explicit message so the
/// conversational front end can tell "no doctors" apart from an error.
#[axum::debug_handler]
pub async fn list_doctors(
    State(directory): State<Arc<dyn DoctorDirectory>>,
) -> Result<Json<Value>, AppError> {
    let doctors = directory
        .list_all()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if doctors.is_empty() {
        return Ok(Json(json!({
            "doctors": [],
            "message": "No doctors found in the directory."
        })));
    }

    let catalogue: Vec<Value> = doctors
        .iter()
        .map(|d| {
            json!({
                "id": d.id,
                "entry": d.catalogue_entry(),
                "consultation_fee": d.fee_display(),
                "availability": d.availability_text,
            })
        })
        .collect();

    Ok(Json(json!({
        "doctors": catalogue,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(directory): State<Arc<dyn DoctorDirectory>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = directory.get(doctor_id).await.map_err(|e| match e {
        DoctorError::NotFound => AppError::NotFound(format!("Doctor {} not found", doctor_id)),
        DoctorError::DatabaseError(msg) => AppError::Database(msg),
    })?;

    Ok(Json(json!({ "doctor": doctor })))
}
