use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, AppointmentState, BookingCalendarState};

pub fn appointment_routes(state: AppointmentState) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route(
            "/professionals/{professional_id}/busy-slots",
            get(handlers::get_busy_slots),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}

/// Public, unauthenticated reads mounted under `/professionals`.
pub fn booking_calendar_routes(state: BookingCalendarState) -> Router {
    Router::new()
        .route(
            "/{professional_id}/booking-calendar",
            get(handlers::get_booking_calendar),
        )
        .with_state(state)
}
