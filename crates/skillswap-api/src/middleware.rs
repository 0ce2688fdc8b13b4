use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

use crate::error::ApiError;

/// Header naming the user on whose behalf a request is made. It identifies
/// the caller; verifying that identity is left to whatever fronts this service.
pub const ACTOR_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Uuid);

/// Extract the acting user from `X-User-Id` and stash it as an extension.
pub async fn require_actor(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let raw = req
        .headers()
        .get(ACTOR_HEADER)
        .ok_or_else(|| ApiError::validation("missing X-User-Id header"))?;

    let actor = raw
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<Uuid>().ok())
        .filter(|id| !id.is_nil())
        .ok_or_else(|| ApiError::validation("X-User-Id must be a non-nil UUID"))?;

    req.extensions_mut().insert(Actor(actor));
    Ok(next.run(req).await)
}
