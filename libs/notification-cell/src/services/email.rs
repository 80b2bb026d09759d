use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use resend_rs::{types::CreateEmailBaseOptions, Resend};
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use crate::models::{AppointmentSnapshot, NotificationError};
use crate::services::directory::ContactDirectory;

/// Outbound transactional email.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

pub struct ResendEmailSender {
    resend: Resend,
    from: String,
}

impl ResendEmailSender {
    pub fn new(api_key: &str, from: &str) -> Self {
        Self {
            resend: Resend::new(api_key),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let email = CreateEmailBaseOptions::new(self.from.as_str(), [to], subject).with_html(html);

        self.resend
            .emails
            .send(email)
            .await
            .map_err(|e| NotificationError::Email(e.to_string()))?;

        debug!("Email \"{}\" accepted by provider", subject);
        Ok(())
    }
}

/// Stand-in used when no email provider is configured.
pub struct NoopEmailSender;

#[async_trait]
impl EmailSender for NoopEmailSender {
    async fn send(&self, _to: &str, subject: &str, _html: &str) -> Result<()> {
        debug!("Email provider not configured, dropping \"{}\"", subject);
        Ok(())
    }
}

/// Status-change email to the patient of an appointment.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatusMailer: Send + Sync {
    async fn send_status_email(&self, appointment: &AppointmentSnapshot, message: &str)
        -> Result<()>;
}

/// Stand-in used when no email provider is configured.
pub struct NoopStatusMailer;

#[async_trait]
impl StatusMailer for NoopStatusMailer {
    async fn send_status_email(
        &self,
        appointment: &AppointmentSnapshot,
        _message: &str,
    ) -> Result<()> {
        debug!(
            "Email provider not configured, skipping status email for {}",
            appointment.id
        );
        Ok(())
    }
}

pub struct PatientStatusMailer {
    sender: Arc<dyn EmailSender>,
    directory: Arc<dyn ContactDirectory>,
}

impl PatientStatusMailer {
    pub fn new(sender: Arc<dyn EmailSender>, directory: Arc<dyn ContactDirectory>) -> Self {
        Self { sender, directory }
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn render_status_email(
    appointment: &AppointmentSnapshot,
    recipient: Option<&str>,
    message: &str,
) -> String {
    let greeting = escape_html(recipient.unwrap_or("there"));
    let mut html = format!(
        "<p>Hi {},</p><p>{}</p><p><strong>When:</strong> {} to {} (UTC)</p>",
        greeting,
        escape_html(message),
        appointment.start.format("%A %d %B %Y, %H:%M"),
        appointment.effective_end().format("%H:%M"),
    );

    if let Some(reason) = &appointment.cancel_reason {
        html.push_str(&format!(
            "<p><strong>Reason:</strong> {}</p>",
            escape_html(reason)
        ));
    }

    html
}

#[async_trait]
impl StatusMailer for PatientStatusMailer {
    async fn send_status_email(
        &self,
        appointment: &AppointmentSnapshot,
        message: &str,
    ) -> Result<()> {
        let contact = self
            .directory
            .patient_contact(appointment.patient_id)
            .await?
            .ok_or(NotificationError::MissingContact(appointment.patient_id))?;

        let html = render_status_email(appointment, contact.name.as_deref(), message);
        self.sender
            .send(&contact.email, "Your appointment was updated", &html)
            .await?;

        info!("Status email sent for appointment {}", appointment.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use shared_models::appointment::AppointmentStatus;
    use uuid::Uuid;

    use crate::models::PatientContact;
    use crate::services::directory::MockContactDirectory;

    fn snapshot() -> AppointmentSnapshot {
        AppointmentSnapshot {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            start: Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
            end: None,
            status: AppointmentStatus::Cancelled,
            cancel_reason: Some("Feeling better".to_string()),
        }
    }

    #[tokio::test]
    async fn test_status_email_goes_to_patient() {
        let appointment = snapshot();

        let mut directory = MockContactDirectory::new();
        directory
            .expect_patient_contact()
            .with(eq(appointment.patient_id))
            .times(1)
            .returning(|_| {
                Ok(Some(PatientContact {
                    email: "patient@example.com".to_string(),
                    name: Some("Ana".to_string()),
                }))
            });

        let mut sender = MockEmailSender::new();
        sender
            .expect_send()
            .withf(|to, _subject, html| {
                to == "patient@example.com"
                    && html.contains("Hi Ana")
                    && html.contains("Feeling better")
                    && html.contains("10:00 to 11:00")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mailer = PatientStatusMailer::new(Arc::new(sender), Arc::new(directory));
        mailer
            .send_status_email(&appointment, "Your appointment has been cancelled.")
            .await
            .unwrap();
    }

    #[test]
    fn test_user_supplied_text_is_escaped() {
        let mut appointment = snapshot();
        appointment.cancel_reason = Some("<script>alert('x')</script> & more".to_string());

        let html = render_status_email(&appointment, Some("<b>Ana</b>"), "Cancelled.");

        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>Ana</b>"));
        assert!(html.contains("Hi &lt;b&gt;Ana&lt;/b&gt;"));
        assert!(html.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt; &amp; more"));
    }

    #[tokio::test]
    async fn test_missing_contact_is_an_error() {
        let mut directory = MockContactDirectory::new();
        directory.expect_patient_contact().returning(|_| Ok(None));

        let mut sender = MockEmailSender::new();
        sender.expect_send().never();

        let mailer = PatientStatusMailer::new(Arc::new(sender), Arc::new(directory));
        let result = mailer.send_status_email(&snapshot(), "msg").await;

        assert!(result.is_err());
    }
}
