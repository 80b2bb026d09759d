use axum::{middleware, routing::get, Router};

use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, AvailabilityState};

pub fn availability_routes(state: AvailabilityState) -> Router {
    // Schedules are only ever managed by their owner
    let protected_routes = Router::new()
        .route(
            "/me",
            get(handlers::get_my_availability).put(handlers::set_my_availability),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
