pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Department, Doctor, DoctorError, DoctorMatch};
pub use services::directory::{DoctorDirectory, MemoryDoctorDirectory, SupabaseDoctorDirectory};
pub use services::matching::resolve_doctor;
