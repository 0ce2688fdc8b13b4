use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::{InteractionStatus, SwapRequestStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A proposed skill exchange. Interactions hang off it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub recipient_id: Option<Uuid>,
    pub skill_offered: String,
    pub skill_wanted: String,
    pub status: SwapRequestStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SwapRequest {
    /// Requester and recipient are the only users allowed to decide on
    /// interactions or complete the request.
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id || self.recipient_id == Some(user_id)
    }
}

/// One user's response thread on a swap request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub swap_request_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub status: InteractionStatus,
    pub created_at: DateTime<Utc>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub updates: Vec<InteractionUpdate>,
}

/// Entry of an interaction's append-only progress log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionUpdate {
    pub sequence: u32,
    /// `None` for system-generated entries.
    pub user_id: Option<Uuid>,
    pub message: String,
    pub percentage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
    pub created_at: DateTime<Utc>,
}
