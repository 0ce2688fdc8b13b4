use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};
use uuid::Uuid;

use skillswap_db::{NewUpdate, StoreError};
use skillswap_types::api::{
    AppendUpdateRequest, CreateInteractionRequest, InteractionQuery, SetStatusRequest,
};
use skillswap_types::{Decision, InteractionStatus};

use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::Actor;
use crate::state::{AppState, run_db};

/// POST /swap-requests/{swap_request_id}/interactions. The caller responds
/// to a swap request. An empty body is accepted.
pub async fn create_interaction(
    State(state): State<AppState>,
    AppPath(swap_request_id): AppPath<Uuid>,
    Extension(actor): Extension<Actor>,
    req: Result<Option<Json<CreateInteractionRequest>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = req?.map(|Json(req)| req).unwrap_or_default();
    let interaction = run_db(&state, move |db| {
        db.create_interaction(swap_request_id, actor.0, req.message.as_deref())
    })
    .await?;

    info!(
        interaction_id = %interaction.id,
        swap_request_id = %swap_request_id,
        user_id = %actor.0,
        "Interaction created"
    );
    Ok((StatusCode::CREATED, Json(interaction)))
}

/// GET /swap-requests/{swap_request_id}/interactions?status=pending
pub async fn list_interactions(
    State(state): State<AppState>,
    AppPath(swap_request_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<InteractionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<InteractionStatus>)
        .transpose()
        .map_err(StoreError::from)?;

    let interactions =
        run_db(&state, move |db| db.list_interactions(swap_request_id, status)).await?;
    debug!(count = interactions.len(), "Listed interactions");
    Ok(Json(interactions))
}

pub async fn get_interaction(
    State(state): State<AppState>,
    AppPath(interaction_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let interaction = run_db(&state, move |db| db.get_interaction(interaction_id)).await?;
    Ok(Json(interaction))
}

/// POST /interactions/{interaction_id}/updates. Appends a progress note
/// authored by the caller.
pub async fn append_update(
    State(state): State<AppState>,
    AppPath(interaction_id): AppPath<Uuid>,
    Extension(actor): Extension<Actor>,
    AppJson(req): AppJson<AppendUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = run_db(&state, move |db| {
        db.append_update(
            interaction_id,
            NewUpdate {
                author_id: Some(actor.0),
                message: &req.message,
                percentage: req.percentage,
                client_token: req.client_token.as_deref(),
            },
        )
    })
    .await?;

    debug!(
        interaction_id = %interaction_id,
        sequence = entry.sequence,
        "Update appended"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PATCH /interactions/{interaction_id}/status
pub async fn set_status(
    State(state): State<AppState>,
    AppPath(interaction_id): AppPath<Uuid>,
    Extension(actor): Extension<Actor>,
    AppJson(req): AppJson<SetStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = req
        .status
        .trim()
        .parse::<InteractionStatus>()
        .map_err(StoreError::from)?;
    let interaction =
        run_db(&state, move |db| db.set_status(interaction_id, target, actor.0)).await?;

    info!(
        interaction_id = %interaction_id,
        status = %interaction.status,
        actor = %actor.0,
        "Interaction status changed"
    );
    Ok(Json(interaction))
}

/// POST /interactions/{interaction_id}/accept
pub async fn accept(
    state: State<AppState>,
    path: AppPath<Uuid>,
    actor: Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    decide(state, path, actor, Decision::Accept).await
}

/// POST /interactions/{interaction_id}/reject
pub async fn reject(
    state: State<AppState>,
    path: AppPath<Uuid>,
    actor: Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    decide(state, path, actor, Decision::Reject).await
}

async fn decide(
    State(state): State<AppState>,
    AppPath(interaction_id): AppPath<Uuid>,
    Extension(actor): Extension<Actor>,
    decision: Decision,
) -> Result<Json<skillswap_types::Interaction>, ApiError> {
    let interaction =
        run_db(&state, move |db| db.decide(interaction_id, decision, actor.0)).await?;

    info!(
        interaction_id = %interaction_id,
        status = %interaction.status,
        actor = %actor.0,
        "Interaction decided"
    );
    Ok(Json(interaction))
}

/// POST /interactions/{interaction_id}/complete. Completes the parent swap
/// request. The interaction's status does not change.
pub async fn complete(
    State(state): State<AppState>,
    AppPath(interaction_id): AppPath<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let request = run_db(&state, move |db| db.complete(interaction_id, actor.0)).await?;

    info!(
        swap_request_id = %request.id,
        interaction_id = %interaction_id,
        actor = %actor.0,
        "Swap request completed"
    );
    Ok(Json(request))
}
