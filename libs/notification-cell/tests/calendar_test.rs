use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::models::{AppointmentSnapshot, PatientContact, ProfessionalCalendar};
use notification_cell::services::{CalendarSync, ContactDirectory, GoogleCalendarSync};
use shared_models::appointment::AppointmentStatus;
use shared_utils::test_utils::TestConfig;

struct FixedDirectory {
    refresh_token: Option<String>,
}

#[async_trait]
impl ContactDirectory for FixedDirectory {
    async fn patient_contact(&self, _patient_id: Uuid) -> Result<Option<PatientContact>> {
        Ok(None)
    }

    async fn professional_calendar(
        &self,
        _professional_id: Uuid,
    ) -> Result<Option<ProfessionalCalendar>> {
        Ok(Some(ProfessionalCalendar {
            name: Some("Dr. Test".to_string()),
            google_refresh_token: self.refresh_token.clone(),
        }))
    }
}

fn appointment(status: AppointmentStatus) -> AppointmentSnapshot {
    AppointmentSnapshot {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        professional_id: Uuid::new_v4(),
        service_id: Uuid::new_v4(),
        start: Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap(),
        end: None,
        status,
        cancel_reason: None,
    }
}

fn sync_for(server: &MockServer, refresh_token: Option<&str>) -> GoogleCalendarSync {
    let mut config = TestConfig::default().to_app_config();
    config.google_client_id = "client-id".to_string();
    config.google_client_secret = "client-secret".to_string();

    let directory = Arc::new(FixedDirectory {
        refresh_token: refresh_token.map(str::to_string),
    });
    GoogleCalendarSync::with_endpoints(
        &config,
        directory,
        &format!("{}/token", server.uri()),
        &server.uri(),
    )
}

async fn mount_token_exchange(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-123",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_confirmed_appointment_updates_existing_event() {
    let mock_server = MockServer::start().await;
    let appt = appointment(AppointmentStatus::Confirmed);
    mount_token_exchange(&mock_server).await;

    Mock::given(method("PUT"))
        .and(path(format!(
            "/calendars/primary/events/{}",
            appt.calendar_event_id()
        )))
        .and(header("authorization", "Bearer access-123"))
        .and(body_partial_json(json!({
            "id": appt.calendar_event_id(),
            "end": { "dateTime": "2026-05-04T10:00:00+00:00" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "confirmed" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    sync_for(&mock_server, Some("refresh-abc"))
        .sync_appointment(&appt)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_event_is_inserted() {
    let mock_server = MockServer::start().await;
    let appt = appointment(AppointmentStatus::Pending);
    mount_token_exchange(&mock_server).await;

    Mock::given(method("PUT"))
        .and(path(format!(
            "/calendars/primary/events/{}",
            appt.calendar_event_id()
        )))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(body_partial_json(json!({ "id": appt.calendar_event_id() })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "confirmed" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    sync_for(&mock_server, Some("refresh-abc"))
        .sync_appointment(&appt)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cancellation_deletes_event_and_tolerates_gone() {
    let mock_server = MockServer::start().await;
    let appt = appointment(AppointmentStatus::CancelledByPro);
    mount_token_exchange(&mock_server).await;

    Mock::given(method("DELETE"))
        .and(path(format!(
            "/calendars/primary/events/{}",
            appt.calendar_event_id()
        )))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&mock_server)
        .await;

    sync_for(&mock_server, Some("refresh-abc"))
        .sync_appointment(&appt)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_professional_without_linked_calendar_is_skipped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    sync_for(&mock_server, None)
        .sync_appointment(&appointment(AppointmentStatus::Confirmed))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_refresh_token_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&mock_server)
        .await;

    let result = sync_for(&mock_server, Some("refresh-abc"))
        .sync_appointment(&appointment(AppointmentStatus::Confirmed))
        .await;

    assert!(result.is_err());
}
