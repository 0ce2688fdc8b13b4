//! Database row types. These map directly to SQLite rows.
//! Distinct from skillswap-types models to keep the DB layer independent.

use anyhow::anyhow;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::Row;
use skillswap_types::{Interaction, InteractionUpdate, SwapRequest, User};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub created_at: String,
}

pub struct SwapRequestRow {
    pub id: String,
    pub requester_id: String,
    pub recipient_id: Option<String>,
    pub skill_offered: String,
    pub skill_wanted: String,
    pub status: String,
    pub created_at: String,
    pub completed_at: Option<String>,
}

pub struct InteractionRow {
    pub id: String,
    pub swap_request_id: String,
    pub user_id: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
    pub decided_by: Option<String>,
    pub decided_at: Option<String>,
}

pub struct UpdateRow {
    pub interaction_id: String,
    pub sequence: i64,
    pub user_id: Option<String>,
    pub message: String,
    pub percentage: Option<i64>,
    pub client_token: Option<String>,
    pub created_at: String,
}

pub(crate) const USER_COLUMNS: &str = "id, username, created_at";

pub(crate) const SWAP_REQUEST_COLUMNS: &str =
    "id, requester_id, recipient_id, skill_offered, skill_wanted, status, created_at, completed_at";

pub(crate) const INTERACTION_COLUMNS: &str =
    "id, swap_request_id, user_id, message, status, created_at, decided_by, decided_at";

pub(crate) const UPDATE_COLUMNS: &str =
    "interaction_id, sequence, user_id, message, percentage, client_token, created_at";

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

impl SwapRequestRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            requester_id: row.get(1)?,
            recipient_id: row.get(2)?,
            skill_offered: row.get(3)?,
            skill_wanted: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
            completed_at: row.get(7)?,
        })
    }
}

impl InteractionRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            swap_request_id: row.get(1)?,
            user_id: row.get(2)?,
            message: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
            decided_by: row.get(6)?,
            decided_at: row.get(7)?,
        })
    }

    pub(crate) fn into_interaction(self, updates: Vec<UpdateRow>) -> StoreResult<Interaction> {
        let updates = updates
            .into_iter()
            .map(UpdateRow::into_update)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Interaction {
            id: parse_id(&self.id)?,
            swap_request_id: parse_id(&self.swap_request_id)?,
            user_id: parse_id(&self.user_id)?,
            message: self.message,
            status: self
                .status
                .parse()
                .map_err(|e| corrupt("interactions.status", &self.id, e))?,
            created_at: parse_timestamp(&self.created_at)?,
            decided_by: self.decided_by.as_deref().map(parse_id).transpose()?,
            decided_at: self.decided_at.as_deref().map(parse_timestamp).transpose()?,
            updates,
        })
    }
}

impl UpdateRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            interaction_id: row.get(0)?,
            sequence: row.get(1)?,
            user_id: row.get(2)?,
            message: row.get(3)?,
            percentage: row.get(4)?,
            client_token: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub(crate) fn into_update(self) -> StoreResult<InteractionUpdate> {
        let sequence = u32::try_from(self.sequence)
            .map_err(|e| corrupt("interaction_updates.sequence", &self.interaction_id, e))?;
        let percentage = self
            .percentage
            .map(u8::try_from)
            .transpose()
            .map_err(|e| corrupt("interaction_updates.percentage", &self.interaction_id, e))?;

        Ok(InteractionUpdate {
            sequence,
            user_id: self.user_id.as_deref().map(parse_id).transpose()?,
            message: self.message,
            percentage,
            client_token: self.client_token,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            id: parse_id(&row.id)?,
            username: row.username,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<SwapRequestRow> for SwapRequest {
    type Error = StoreError;

    fn try_from(row: SwapRequestRow) -> StoreResult<Self> {
        Ok(SwapRequest {
            id: parse_id(&row.id)?,
            requester_id: parse_id(&row.requester_id)?,
            recipient_id: row.recipient_id.as_deref().map(parse_id).transpose()?,
            skill_offered: row.skill_offered,
            skill_wanted: row.skill_wanted,
            status: row
                .status
                .parse()
                .map_err(|e| corrupt("swap_requests.status", &row.id, e))?,
            created_at: parse_timestamp(&row.created_at)?,
            completed_at: row.completed_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

/// Current time at the precision timestamps are stored with, so values
/// returned from a write compare equal to the ones read back later.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| corrupt("timestamp", raw, e))
}

pub(crate) fn parse_id(raw: &str) -> StoreResult<Uuid> {
    raw.parse().map_err(|e| corrupt("id", raw, e))
}

fn corrupt(column: &str, value: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Internal(anyhow!("corrupt {} '{}': {}", column, value, err))
}
