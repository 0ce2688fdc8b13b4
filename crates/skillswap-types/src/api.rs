use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
}

// -- Swap requests --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSwapRequestRequest {
    pub skill_offered: String,
    pub skill_wanted: String,
    #[serde(default)]
    pub recipient_id: Option<Uuid>,
}

// -- Interactions --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInteractionRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendUpdateRequest {
    pub message: String,
    #[serde(default)]
    pub percentage: Option<u8>,
    /// Idempotency key: re-sending the same token returns the recorded entry.
    #[serde(default)]
    pub client_token: Option<String>,
}

/// Status arrives as a raw string so unknown values surface as a
/// validation error instead of a generic body rejection.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct InteractionQuery {
    pub status: Option<String>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
