use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notification_cell::models::status_message;
use notification_cell::services::NotificationDispatcher;
use shared_models::access::{authorize, Action, Actor, Decision, Resource, Role};
use shared_models::appointment::AppointmentStatus;

use crate::models::{
    normalize_cancel_reason, Appointment, AppointmentError, AppointmentScope, StatusChange,
};
use crate::services::store::AppointmentStore;

/// Status transitions and reads for existing appointments. Every committed
/// change is followed by a best-effort notification.
pub struct AppointmentStatusService {
    store: Arc<dyn AppointmentStore>,
    notifier: Arc<NotificationDispatcher>,
}

impl AppointmentStatusService {
    pub fn new(store: Arc<dyn AppointmentStore>, notifier: Arc<NotificationDispatcher>) -> Self {
        Self { store, notifier }
    }

    async fn load(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .get_appointment(id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::NotFound)
    }

    fn check_access(
        &self,
        actor: &Actor,
        appointment: &Appointment,
        action: Action,
    ) -> Result<(), AppointmentError> {
        let resource = Resource::Appointment {
            patient_id: appointment.patient_id,
            professional_id: appointment.professional_id,
        };

        match authorize(actor, &resource, &action) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                warn!(
                    "Denied {:?} on appointment {} for actor {}",
                    action, appointment.id, actor.id
                );
                Err(AppointmentError::Forbidden(reason))
            }
        }
    }

    /// Writes the change conditionally on the status we read, then notifies.
    async fn commit(
        &self,
        current: &Appointment,
        change: StatusChange,
    ) -> Result<Appointment, AppointmentError> {
        let updated = self
            .store
            .update_status_if(current.id, current.status, &change)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or_else(|| {
                warn!(
                    "Appointment {} left status {} before the update landed",
                    current.id, current.status
                );
                AppointmentError::ConcurrentModification
            })?;

        info!(
            "Appointment {} moved from {} to {}",
            updated.id, current.status, updated.status
        );

        self.notifier
            .notify(&updated.snapshot(), status_message(updated.status))
            .await;

        Ok(updated)
    }

    pub async fn get_appointment(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(id).await?;
        self.check_access(actor, &appointment, Action::ReadAppointment)?;
        Ok(appointment)
    }

    /// Own appointments for patients and professionals, everything for admins.
    pub async fn list_for_actor(&self, actor: &Actor) -> Result<Vec<Appointment>, AppointmentError> {
        let scope = match actor.role {
            Role::Patient => AppointmentScope::Patient(actor.id),
            Role::Professional => AppointmentScope::Professional(actor.id),
            Role::Admin => AppointmentScope::All,
        };
        debug!("Listing appointments for actor {} ({:?})", actor.id, scope);

        let mut appointments = self
            .store
            .list_appointments(scope)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        appointments.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(appointments)
    }

    /// Professional and admin path. A professional can no longer touch an
    /// appointment once it is terminal; an admin can always override.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: Uuid,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.load(id).await?;
        self.check_access(actor, &current, Action::SetAppointmentStatus(next))?;

        if !actor.is_admin() && current.status.is_terminal() {
            return Err(AppointmentError::InvalidStatusTransition(current.status));
        }

        self.commit(&current, StatusChange::to(next, Utc::now())).await
    }

    /// Patient path. Always lands on `CANCELLED`.
    #[instrument(skip(self, actor, reason), fields(actor_id = %actor.id))]
    pub async fn cancel(
        &self,
        actor: &Actor,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.load(id).await?;
        self.check_access(actor, &current, Action::CancelAppointment)?;

        if current.status.is_terminal() {
            return Err(AppointmentError::InvalidStatusTransition(current.status));
        }

        let change = StatusChange::cancellation(normalize_cancel_reason(reason), Utc::now());
        self.commit(&current, change).await
    }
}
