use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub google_calendar_base_url: String,
    pub google_token_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            google_calendar_base_url: "http://localhost:54322".to_string(),
            google_token_url: "http://localhost:54322/token".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the Supabase and Google endpoints at mock servers.
    pub fn with_mock_servers(supabase_url: &str, google_url: &str) -> Self {
        Self {
            supabase_url: supabase_url.to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            google_calendar_base_url: google_url.to_string(),
            google_token_url: format!("{}/token", google_url),
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            google_client_id: "test-client-id".to_string(),
            google_client_secret: "test-client-secret".to_string(),
            google_refresh_token: "test-refresh-token".to_string(),
            google_calendar_id: "primary".to_string(),
            google_calendar_base_url: self.google_calendar_base_url.clone(),
            google_token_url: self.google_token_url.clone(),
            clinic_timezone: "Asia/Kolkata".to_string(),
            calendar_timeout_secs: 2,
        }
    }

}

/// Canned PostgREST and Google Calendar response bodies for wiremock setups.
pub struct MockResponses;

impl MockResponses {
    pub fn doctor_row(id: Uuid, name: &str, specialization: &str, fee_cents: i64) -> Value {
        json!({
            "id": id,
            "name": name,
            "specialization": specialization,
            "consultation_fee_cents": fee_cents,
            "availability_text": "Mon-Fri 9am-5pm",
            "department_id": null
        })
    }

    pub fn appointment_row(
        id: Uuid,
        doctor_id: Uuid,
        patient_name: &str,
        start_time: &str,
        end_time: &str,
    ) -> Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "patient_name": patient_name,
            "patient_email": "patient@example.com",
            "patient_phone": null,
            "start_time": start_time,
            "end_time": end_time,
            "status": "confirmed",
            "notes": "General checkup",
            "external_event_id": null,
            "source_session_id": null,
            "created_at": start_time
        })
    }

    pub fn google_token() -> Value {
        json!({
            "access_token": "test-access-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })
    }

    pub fn google_event(id: &str, summary: &str, start: &str, end: &str) -> Value {
        json!({
            "id": id,
            "summary": summary,
            "description": null,
            "start": { "dateTime": start, "timeZone": "Asia/Kolkata" },
            "end": { "dateTime": end, "timeZone": "Asia/Kolkata" }
        })
    }

    pub fn google_event_list(items: Vec<Value>) -> Value {
        json!({ "kind": "calendar#events", "items": items })
    }
}
