use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::info;

use appointment_cell::handlers::{AppointmentState, BookingCalendarState};
use appointment_cell::router::{appointment_routes, booking_calendar_routes};
use appointment_cell::services::{AppointmentStatusService, BusySlotService, SupabaseAppointmentStore};
use auth_cell::handlers::AuthState;
use auth_cell::router::auth_routes;
use auth_cell::services::{SupabaseAccountTokenStore, TokenService};
use availability_cell::handlers::AvailabilityState;
use availability_cell::router::availability_routes;
use availability_cell::services::{AvailabilityService, SupabaseAvailabilityStore};
use notification_cell::services::{
    CalendarSync, ContactDirectory, EmailSender, GoogleCalendarSync, NoopCalendarSync,
    NoopEmailSender, NoopStatusMailer, NotificationDispatcher, PatientStatusMailer,
    ResendEmailSender, StatusMailer, SupabaseContactDirectory,
};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

/// Every cell's state, built once at startup.
pub struct Services {
    pub auth: AuthState,
    pub availability: AvailabilityState,
    pub appointments: AppointmentState,
    pub booking_calendar: BookingCalendarState,
}

pub fn build_services(config: Arc<AppConfig>) -> Services {
    let supabase = SupabaseClient::new(&config);
    let directory: Arc<dyn ContactDirectory> =
        Arc::new(SupabaseContactDirectory::new(supabase.clone()));

    let email: Arc<dyn EmailSender> = if config.is_email_configured() {
        Arc::new(ResendEmailSender::new(&config.resend_api_key, &config.email_from))
    } else {
        info!("Email provider not configured, outgoing email is disabled");
        Arc::new(NoopEmailSender)
    };

    let mailer: Arc<dyn StatusMailer> = if config.is_email_configured() {
        Arc::new(PatientStatusMailer::new(email.clone(), directory.clone()))
    } else {
        Arc::new(NoopStatusMailer)
    };

    let calendar: Arc<dyn CalendarSync> = if config.is_calendar_configured() {
        Arc::new(GoogleCalendarSync::new(&config, directory))
    } else {
        info!("Calendar provider not configured, calendar sync is disabled");
        Arc::new(NoopCalendarSync)
    };

    let dispatcher = Arc::new(NotificationDispatcher::new(calendar, mailer));

    let availability = Arc::new(AvailabilityService::new(Arc::new(
        SupabaseAvailabilityStore::new(supabase.clone()),
    )));

    let appointment_store = Arc::new(SupabaseAppointmentStore::new(supabase.clone()));
    let busy_slots = Arc::new(BusySlotService::new(appointment_store.clone()));
    let appointments = Arc::new(AppointmentStatusService::new(appointment_store, dispatcher));

    let tokens = Arc::new(TokenService::new(
        Arc::new(SupabaseAccountTokenStore::new(supabase)),
        email,
        config.clone(),
    ));

    Services {
        auth: AuthState {
            config: config.clone(),
            tokens,
        },
        availability: AvailabilityState {
            config: config.clone(),
            service: availability.clone(),
        },
        appointments: AppointmentState {
            config,
            appointments,
            busy_slots: busy_slots.clone(),
        },
        booking_calendar: BookingCalendarState {
            availability,
            busy_slots,
        },
    }
}

pub fn create_router(services: Services) -> Router {
    Router::new()
        .route("/", get(|| async { "Carebook API is running!" }))
        .nest("/auth", auth_routes(services.auth))
        .nest("/availability", availability_routes(services.availability))
        .nest("/appointments", appointment_routes(services.appointments))
        .nest("/professionals", booking_calendar_routes(services.booking_calendar))
}
