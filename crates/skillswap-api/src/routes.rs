use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;

use crate::interactions;
use crate::middleware::require_actor;
use crate::state::AppState;
use crate::swap_requests;
use crate::users;

/// Every route of the service. Reads are open; writes need `X-User-Id`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/users", post(users::create_user))
        .route("/users/{user_id}", get(users::get_user))
        .route("/swap-requests/{swap_request_id}", get(swap_requests::get_swap_request))
        .route(
            "/swap-requests/{swap_request_id}/interactions",
            get(interactions::list_interactions),
        )
        .route("/interactions/{interaction_id}", get(interactions::get_interaction))
        .with_state(state.clone());

    let actor_routes = Router::new()
        .route("/swap-requests", post(swap_requests::create_swap_request))
        .route(
            "/swap-requests/{swap_request_id}/interactions",
            post(interactions::create_interaction),
        )
        .route(
            "/interactions/{interaction_id}/updates",
            post(interactions::append_update),
        )
        .route(
            "/interactions/{interaction_id}/status",
            patch(interactions::set_status),
        )
        .route("/interactions/{interaction_id}/accept", post(interactions::accept))
        .route("/interactions/{interaction_id}/reject", post(interactions::reject))
        .route("/interactions/{interaction_id}/complete", post(interactions::complete))
        .layer(middleware::from_fn(require_actor))
        .with_state(state);

    Router::new().merge(public_routes).merge(actor_routes)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
