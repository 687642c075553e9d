// libs/doctor-cell/src/services/matching.rs
use crate::models::{Doctor, DoctorMatch};

/// Resolve a free-text doctor reference against the full catalogue.
///
/// Matching is case-insensitive on the trimmed query. Tie-break order:
/// 1. exact name equality,
/// 2. first substring match in stable id order.
///
/// Pure function so the tie-break rule is unit-testable without storage.
pub fn resolve_doctor(query: &str, catalogue: &[Doctor]) -> DoctorMatch {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return DoctorMatch::NoMatch;
    }

    let mut ordered: Vec<&Doctor> = catalogue.iter().collect();
    ordered.sort_by_key(|d| d.id);

    if let Some(doctor) = ordered
        .iter()
        .find(|d| d.name.to_lowercase() == needle)
    {
        return DoctorMatch::Exact((*doctor).clone());
    }

    if let Some(doctor) = ordered
        .iter()
        .find(|d| d.name.to_lowercase().contains(&needle))
    {
        return DoctorMatch::Fuzzy((*doctor).clone());
    }

    DoctorMatch::NoMatch
}
