// libs/calendar-cell/src/services/credentials.rs
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::models::CalendarError;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Process-wide cache for the calendar OAuth access token.
///
/// The token is acquired on first use via the refresh-token grant and reused
/// until shortly before expiry. Refresh runs under a mutex with a re-check
/// after acquisition, so concurrent callers cannot race to double-write the
/// cached credential. `invalidate` drops the cached token after an auth
/// failure so the next caller refreshes.
pub struct CredentialCache {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cached: Mutex<Option<CachedToken>>,
}

impl CredentialCache {
    pub fn new(config: &AppConfig) -> Result<Self, CalendarError> {
        if !config.is_calendar_configured() {
            return Err(CalendarError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            token_url: config.google_token_url.clone(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            refresh_token: config.google_refresh_token.clone(),
            cached: Mutex::new(None),
        })
    }

    /// Return a valid access token, refreshing if missing or near expiry.
    pub async fn access_token(&self) -> Result<String, CalendarError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            // Leave headroom so a token does not expire mid-request.
            if token.expires_at > Utc::now() + Duration::seconds(30) {
                return Ok(token.access_token.clone());
            }
            debug!("Cached calendar token expired, refreshing");
        }

        let refreshed = self.refresh().await?;
        let access_token = refreshed.access_token.clone();
        *cached = Some(refreshed);
        Ok(access_token)
    }

    /// Drop the cached token, forcing a refresh on next use.
    pub async fn invalidate(&self) {
        warn!("Invalidating cached calendar credential");
        *self.cached.lock().await = None;
    }

    async fn refresh(&self) -> Result<CachedToken, CalendarError> {
        debug!("Refreshing calendar access token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CalendarError::AuthFailed(format!(
                "token refresh failed ({}): {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::ParseError(e.to_string()))?;

        info!("Calendar access token refreshed");
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}
