use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use shared_config::AppConfig;

use crate::models::{AppointmentSnapshot, NotificationError};
use crate::services::directory::ContactDirectory;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// Mirrors an appointment into the professional's external calendar.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CalendarSync: Send + Sync {
    async fn sync_appointment(&self, appointment: &AppointmentSnapshot) -> Result<()>;
}

/// Stand-in used when no calendar provider is configured.
pub struct NoopCalendarSync;

#[async_trait]
impl CalendarSync for NoopCalendarSync {
    async fn sync_appointment(&self, appointment: &AppointmentSnapshot) -> Result<()> {
        debug!(
            "Calendar provider not configured, skipping sync for {}",
            appointment.id
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

pub struct GoogleCalendarSync {
    client: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
    directory: Arc<dyn ContactDirectory>,
}

impl GoogleCalendarSync {
    pub fn new(config: &AppConfig, directory: Arc<dyn ContactDirectory>) -> Self {
        Self::with_endpoints(config, directory, GOOGLE_TOKEN_URL, GOOGLE_CALENDAR_API)
    }

    pub fn with_endpoints(
        config: &AppConfig,
        directory: Arc<dyn ContactDirectory>,
        token_url: &str,
        api_base: &str,
    ) -> Self {
        Self {
            client: Client::new(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            token_url: token_url.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            directory,
        }
    }

    async fn access_token(&self, refresh_token: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Calendar(format!(
                "token refresh failed ({}): {}",
                status, body
            ))
            .into());
        }

        let token: AccessTokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    fn event_body(&self, appointment: &AppointmentSnapshot, summary: &str) -> serde_json::Value {
        json!({
            "id": appointment.calendar_event_id(),
            "summary": summary,
            "description": format!("Carebook appointment {} ({})", appointment.id, appointment.status),
            "start": { "dateTime": appointment.start.to_rfc3339() },
            "end": { "dateTime": appointment.effective_end().to_rfc3339() },
        })
    }

    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<()> {
        let url = format!("{}/calendars/primary/events/{}", self.api_base, event_id);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Already gone is the state we wanted
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(()),
            status => Err(anyhow!("calendar delete failed ({})", status)),
        }
    }

    async fn upsert_event(&self, access_token: &str, body: serde_json::Value, event_id: &str) -> Result<()> {
        let url = format!("{}/calendars/primary/events/{}", self.api_base, event_id);
        let response = self
            .client
            .put(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Err(anyhow!("calendar update failed ({})", response.status()));
        }

        let insert_url = format!("{}/calendars/primary/events", self.api_base);
        let response = self
            .client
            .post(&insert_url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("calendar insert failed ({})", response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarSync for GoogleCalendarSync {
    async fn sync_appointment(&self, appointment: &AppointmentSnapshot) -> Result<()> {
        let calendar = self
            .directory
            .professional_calendar(appointment.professional_id)
            .await?;

        let refresh_token = match calendar.as_ref().and_then(|c| c.google_refresh_token.as_deref()) {
            Some(token) if !token.is_empty() => token,
            _ => {
                debug!(
                    "Professional {} has no linked calendar",
                    appointment.professional_id
                );
                return Ok(());
            }
        };

        let access_token = self.access_token(refresh_token).await?;
        let event_id = appointment.calendar_event_id();

        if appointment.status.is_cancellation() {
            self.delete_event(&access_token, &event_id).await?;
            info!("Removed calendar event for appointment {}", appointment.id);
        } else {
            let body = self.event_body(appointment, "Carebook appointment");
            self.upsert_event(&access_token, body, &event_id).await?;
            info!("Synced calendar event for appointment {}", appointment.id);
        }

        Ok(())
    }
}
