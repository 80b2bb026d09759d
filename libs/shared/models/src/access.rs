//! Single capability check shared by every cell. Handlers build an [`Actor`]
//! from the authenticated session and ask [`authorize`] before touching a
//! resource.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::appointment::AppointmentStatus;
use crate::auth::User;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Professional,
    Admin,
}

impl Role {
    /// Unknown roles collapse to the least privileged one.
    pub fn from_claim(role: Option<&str>) -> Self {
        match role {
            Some("admin") => Role::Admin,
            Some("professional") => Role::Professional,
            _ => Role::Patient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn from_user(user: &User) -> Result<Self, AppError> {
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Auth("Invalid subject in session".to_string()))?;

        Ok(Self {
            id,
            role: Role::from_claim(user.role.as_deref()),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Availability { professional_id: Uuid },
    Appointment { patient_id: Uuid, professional_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadAvailability,
    ReplaceAvailability,
    ReadAppointment,
    SetAppointmentStatus(AppointmentStatus),
    CancelAppointment,
    ReadBusySlots,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Maps a denial onto the HTTP-facing `Forbidden` error.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(AppError::Forbidden(reason)),
        }
    }
}

const ADMIN_SETTABLE: [AppointmentStatus; 6] = [
    AppointmentStatus::Pending,
    AppointmentStatus::Confirmed,
    AppointmentStatus::Completed,
    AppointmentStatus::NoShow,
    AppointmentStatus::CancelledByUser,
    AppointmentStatus::CancelledByPro,
];

const PROFESSIONAL_SETTABLE: [AppointmentStatus; 5] = [
    AppointmentStatus::Pending,
    AppointmentStatus::Confirmed,
    AppointmentStatus::Completed,
    AppointmentStatus::NoShow,
    AppointmentStatus::CancelledByPro,
];

/// Statuses a role may assign through the status-update path. Patients have
/// no entry here; they go through cancellation instead.
pub fn settable_statuses(role: Role) -> &'static [AppointmentStatus] {
    match role {
        Role::Admin => &ADMIN_SETTABLE,
        Role::Professional => &PROFESSIONAL_SETTABLE,
        Role::Patient => &[],
    }
}

pub fn authorize(actor: &Actor, resource: &Resource, action: &Action) -> Decision {
    match (resource, action) {
        (
            Resource::Availability { professional_id },
            Action::ReadAvailability | Action::ReplaceAvailability,
        ) => {
            if actor.role == Role::Professional && actor.id == *professional_id {
                Decision::Allow
            } else {
                Decision::Deny("Only the owning professional can manage this schedule".to_string())
            }
        }

        (Resource::Availability { .. }, Action::ReadBusySlots) => Decision::Allow,

        (
            Resource::Appointment {
                patient_id,
                professional_id,
            },
            Action::ReadAppointment,
        ) => {
            if actor.is_admin() || actor.id == *patient_id || actor.id == *professional_id {
                Decision::Allow
            } else {
                Decision::Deny("Not authorized to view this appointment".to_string())
            }
        }

        (Resource::Appointment { patient_id, .. }, Action::CancelAppointment) => {
            if actor.role == Role::Patient && actor.id == *patient_id {
                Decision::Allow
            } else {
                Decision::Deny("Only the patient who booked can cancel this appointment".to_string())
            }
        }

        (
            Resource::Appointment {
                professional_id, ..
            },
            Action::SetAppointmentStatus(next),
        ) => {
            if !settable_statuses(actor.role).contains(next) {
                return Decision::Deny(format!("Role may not set status {}", next));
            }
            match actor.role {
                Role::Admin => Decision::Allow,
                Role::Professional if actor.id == *professional_id => Decision::Allow,
                _ => Decision::Deny("Not authorized to update this appointment".to_string()),
            }
        }

        _ => Decision::Deny("Action not permitted on this resource".to_string()),
    }
}
