// libs/calendar-cell/src/services/google.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;

use crate::models::{CalendarError, CalendarEvent, NewCalendarEvent};
use crate::services::credentials::CredentialCache;
use crate::services::gateway::CalendarGateway;

/// Google Calendar v3 client.
/// Based on: https://developers.google.com/calendar/api/v3/reference
pub struct GoogleCalendarClient {
    client: Client,
    credentials: Arc<CredentialCache>,
    base_url: String,
    calendar_id: String,
    timezone: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &AppConfig) -> Result<Self, CalendarError> {
        let credentials = Arc::new(CredentialCache::new(config)?);
        Ok(Self::with_credentials(config, credentials))
    }

    pub fn with_credentials(config: &AppConfig, credentials: Arc<CredentialCache>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.calendar_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            credentials,
            base_url: config.google_calendar_base_url.clone(),
            calendar_id: config.google_calendar_id.clone(),
            timezone: config.clinic_timezone.clone(),
        }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        )
    }

    /// Send a request with the cached token; on 401 invalidate the credential
    /// and retry once with a fresh one.
    async fn send_authorized(
        &self,
        build: impl Fn(&Client, &str) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, CalendarError> {
        let token = self.credentials.access_token().await?;
        let response = build(&self.client, &token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("Calendar API rejected token, refreshing and retrying once");
        self.credentials.invalidate().await;
        let token = self.credentials.access_token().await?;
        let response = build(&self.client, &token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::AuthFailed(body));
        }

        Ok(response)
    }

    fn parse_event(item: &Value) -> Option<CalendarEvent> {
        let id = item["id"].as_str()?.to_string();
        let summary = item["summary"].as_str().unwrap_or("(no title)").to_string();
        let description = item["description"].as_str().map(str::to_string);

        let start = Self::parse_event_time(&item["start"])?;
        let end = Self::parse_event_time(&item["end"])?;

        Some(CalendarEvent {
            id,
            summary,
            description,
            start,
            end,
        })
    }

    fn parse_event_time(value: &Value) -> Option<DateTime<Utc>> {
        if let Some(date_time) = value["dateTime"].as_str() {
            return DateTime::parse_from_rfc3339(date_time)
                .ok()
                .map(|dt| dt.with_timezone(&Utc));
        }

        // All-day events carry only a date; treat them as starting at
        // midnight UTC so they still register as busy blocks.
        let date = value["date"].as_str()?;
        let naive = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        Some(naive.and_hms_opt(0, 0, 0)?.and_utc())
    }
}

#[async_trait]
impl CalendarGateway for GoogleCalendarClient {
    async fn list_events(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        debug!(
            "Listing calendar events from {} to {}",
            window_start, window_end
        );

        let url = self.events_url();
        let time_min = window_start.to_rfc3339();
        let time_max = window_end.to_rfc3339();

        let response = self
            .send_authorized(|client, token| {
                client
                    .get(&url)
                    .bearer_auth(token)
                    .query(&[
                        ("timeMin", time_min.as_str()),
                        ("timeMax", time_max.as_str()),
                        ("singleEvents", "true"),
                        ("orderBy", "startTime"),
                    ])
            })
            .await?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| CalendarError::ParseError(e.to_string()))?;

        if !status.is_success() {
            error!("Calendar event listing failed: {} - {}", status, body);
            return Err(CalendarError::ApiError {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let items = body["items"].as_array().cloned().unwrap_or_default();
        let events: Vec<CalendarEvent> = items.iter().filter_map(Self::parse_event).collect();

        debug!("Fetched {} calendar events", events.len());
        Ok(events)
    }

    async fn create_event(
        &self,
        event: NewCalendarEvent,
    ) -> Result<CalendarEvent, CalendarError> {
        info!("Creating calendar event: {}", event.summary);

        let mut body = json!({
            "summary": event.summary,
            "description": event.description,
            "start": {
                "dateTime": event.start.to_rfc3339(),
                "timeZone": self.timezone,
            },
            "end": {
                "dateTime": event.end.to_rfc3339(),
                "timeZone": self.timezone,
            },
        });

        if let Some(email) = &event.attendee_email {
            body["attendees"] = json!([{ "email": email }]);
        }

        let url = self.events_url();
        let response = self
            .send_authorized(|client, token| client.post(&url).bearer_auth(token).json(&body))
            .await?;

        let status = response.status();
        let response_body: Value = response
            .json()
            .await
            .map_err(|e| CalendarError::ParseError(e.to_string()))?;

        if !status.is_success() {
            error!("Calendar event creation failed: {} - {}", status, response_body);
            return Err(CalendarError::ApiError {
                message: format!("HTTP {}: {}", status, response_body),
            });
        }

        let created = Self::parse_event(&response_body).ok_or_else(|| {
            CalendarError::ParseError("event response missing id or times".to_string())
        })?;

        info!("Created calendar event {}", created.id);
        Ok(created)
    }
}
