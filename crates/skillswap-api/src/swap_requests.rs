use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use skillswap_types::api::CreateSwapRequestRequest;

use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::middleware::Actor;
use crate::state::{AppState, run_db};

/// POST /swap-requests. The caller becomes the requester.
pub async fn create_swap_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppJson(req): AppJson<CreateSwapRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = run_db(&state, move |db| {
        db.create_swap_request(actor.0, req.recipient_id, &req.skill_offered, &req.skill_wanted)
    })
    .await?;
    info!(swap_request_id = %request.id, requester_id = %actor.0, "Swap request created");
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn get_swap_request(
    State(state): State<AppState>,
    AppPath(swap_request_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = run_db(&state, move |db| db.get_swap_request(swap_request_id)).await?;
    Ok(Json(request))
}
