use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::access::Actor;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::SetAvailabilityRequest;
use crate::services::AvailabilityService;

#[derive(Clone)]
pub struct AvailabilityState {
    pub config: Arc<AppConfig>,
    pub service: Arc<AvailabilityService>,
}

#[axum::debug_handler]
pub async fn get_my_availability(
    State(state): State<AvailabilityState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = Actor::from_user(&user)?;

    let blocks = state.service.get_availability(&actor, actor.id).await?;

    Ok(Json(json!({
        "professional_id": actor.id,
        "blocks": blocks,
    })))
}

#[axum::debug_handler]
pub async fn set_my_availability(
    State(state): State<AvailabilityState>,
    Extension(user): Extension<User>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = Actor::from_user(&user)?;

    let blocks = state
        .service
        .set_availability(&actor, actor.id, request.blocks)
        .await?;

    Ok(Json(json!({
        "success": true,
        "professional_id": actor.id,
        "blocks": blocks,
    })))
}
