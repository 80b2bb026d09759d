use std::sync::Arc;

use futures::future::join;
use tracing::{debug, warn};

use crate::models::AppointmentSnapshot;
use crate::services::calendar::CalendarSync;
use crate::services::email::StatusMailer;

/// Best-effort fan-out of an appointment change. Calendar sync and the
/// status email run concurrently; a failure in one never stops the other
/// and is never reported back to the caller. No retries.
pub struct NotificationDispatcher {
    calendar: Arc<dyn CalendarSync>,
    mailer: Arc<dyn StatusMailer>,
}

impl NotificationDispatcher {
    pub fn new(calendar: Arc<dyn CalendarSync>, mailer: Arc<dyn StatusMailer>) -> Self {
        Self { calendar, mailer }
    }

    pub async fn notify(&self, appointment: &AppointmentSnapshot, message: &str) {
        debug!(
            "Dispatching notifications for appointment {} ({})",
            appointment.id, appointment.status
        );

        let (calendar_result, email_result) = join(
            self.calendar.sync_appointment(appointment),
            self.mailer.send_status_email(appointment, message),
        )
        .await;

        if let Err(e) = calendar_result {
            warn!(
                "Calendar sync failed for appointment {}: {:#}",
                appointment.id, e
            );
        }

        if let Err(e) = email_result {
            warn!(
                "Status email failed for appointment {}: {:#}",
                appointment.id, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Utc;
    use shared_models::appointment::AppointmentStatus;
    use uuid::Uuid;

    use crate::services::calendar::MockCalendarSync;
    use crate::services::email::MockStatusMailer;

    fn snapshot() -> AppointmentSnapshot {
        AppointmentSnapshot {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            start: Utc::now(),
            end: None,
            status: AppointmentStatus::Confirmed,
            cancel_reason: None,
        }
    }

    #[tokio::test]
    async fn test_both_side_effects_run() {
        let appointment = snapshot();
        let expected_id = appointment.id;

        let mut calendar = MockCalendarSync::new();
        calendar
            .expect_sync_appointment()
            .withf(move |a| a.id == expected_id)
            .times(1)
            .returning(|_| Ok(()));

        let mut mailer = MockStatusMailer::new();
        mailer
            .expect_send_status_email()
            .withf(|_, message| message == "Your appointment has been confirmed.")
            .times(1)
            .returning(|_, _| Ok(()));

        let dispatcher = NotificationDispatcher::new(Arc::new(calendar), Arc::new(mailer));
        dispatcher
            .notify(&appointment, "Your appointment has been confirmed.")
            .await;
    }

    #[tokio::test]
    async fn test_calendar_failure_does_not_block_email() {
        let mut calendar = MockCalendarSync::new();
        calendar
            .expect_sync_appointment()
            .times(1)
            .returning(|_| Err(anyhow!("token revoked")));

        let mut mailer = MockStatusMailer::new();
        mailer
            .expect_send_status_email()
            .times(1)
            .returning(|_, _| Ok(()));

        let dispatcher = NotificationDispatcher::new(Arc::new(calendar), Arc::new(mailer));
        dispatcher.notify(&snapshot(), "msg").await;
    }

    #[tokio::test]
    async fn test_email_failure_does_not_block_calendar() {
        let mut calendar = MockCalendarSync::new();
        calendar
            .expect_sync_appointment()
            .times(1)
            .returning(|_| Ok(()));

        let mut mailer = MockStatusMailer::new();
        mailer
            .expect_send_status_email()
            .times(1)
            .returning(|_, _| Err(anyhow!("provider unavailable")));

        let dispatcher = NotificationDispatcher::new(Arc::new(calendar), Arc::new(mailer));
        dispatcher.notify(&snapshot(), "msg").await;
    }
}
