pub mod models;
pub mod services;

pub use models::{CalendarError, CalendarEvent, NewCalendarEvent};
pub use services::credentials::CredentialCache;
pub use services::gateway::CalendarGateway;
pub use services::google::GoogleCalendarClient;
