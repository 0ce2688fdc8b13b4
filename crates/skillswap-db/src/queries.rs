use rusqlite::Connection;
use skillswap_types::{SwapRequest, SwapRequestStatus, User};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    SWAP_REQUEST_COLUMNS, SwapRequestRow, USER_COLUMNS, UserRow, format_timestamp, now,
};
use crate::{Database, OptionalExt};

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;
const MAX_SKILL_LEN: usize = 200;

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str) -> StoreResult<User> {
        let username = username.trim();
        if !USERNAME_LEN.contains(&username.chars().count()) {
            return Err(StoreError::validation(format!(
                "username must be {} to {} characters",
                USERNAME_LEN.start(),
                USERNAME_LEN.end()
            )));
        }

        self.with_conn_mut(|conn| {
            let taken: Option<String> = conn
                .query_row("SELECT id FROM users WHERE username = ?1", [username], |row| {
                    row.get(0)
                })
                .optional()?;
            if taken.is_some() {
                return Err(StoreError::AlreadyExists(format!("username '{}'", username)));
            }

            let user = User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                created_at: now(),
            };
            conn.execute(
                "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)",
                (
                    user.id.to_string(),
                    &user.username,
                    format_timestamp(user.created_at),
                ),
            )?;
            Ok(user)
        })
    }

    pub fn get_user(&self, id: Uuid) -> StoreResult<User> {
        self.with_conn(|conn| {
            query_user(conn, id)?
                .ok_or(StoreError::NotFound { entity: "user", id })?
                .try_into()
        })
    }

    // -- Swap requests --

    pub fn create_swap_request(
        &self,
        requester_id: Uuid,
        recipient_id: Option<Uuid>,
        skill_offered: &str,
        skill_wanted: &str,
    ) -> StoreResult<SwapRequest> {
        let skill_offered = require_text("skill_offered", skill_offered, MAX_SKILL_LEN)?;
        let skill_wanted = require_text("skill_wanted", skill_wanted, MAX_SKILL_LEN)?;
        if recipient_id == Some(requester_id) {
            return Err(StoreError::validation("recipient must differ from requester"));
        }

        self.with_conn_mut(|conn| {
            require_user(conn, requester_id, "requester")?;
            if let Some(recipient_id) = recipient_id {
                require_user(conn, recipient_id, "recipient")?;
            }

            let request = SwapRequest {
                id: Uuid::new_v4(),
                requester_id,
                recipient_id,
                skill_offered: skill_offered.to_string(),
                skill_wanted: skill_wanted.to_string(),
                status: SwapRequestStatus::Open,
                created_at: now(),
                completed_at: None,
            };
            conn.execute(
                "INSERT INTO swap_requests
                    (id, requester_id, recipient_id, skill_offered, skill_wanted,
                     status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    request.id.to_string(),
                    request.requester_id.to_string(),
                    request.recipient_id.map(|id| id.to_string()),
                    &request.skill_offered,
                    &request.skill_wanted,
                    request.status.as_str(),
                    format_timestamp(request.created_at),
                ],
            )?;
            Ok(request)
        })
    }

    pub fn get_swap_request(&self, id: Uuid) -> StoreResult<SwapRequest> {
        self.with_conn(|conn| {
            query_swap_request(conn, id)?
                .ok_or(StoreError::NotFound {
                    entity: "swap request",
                    id,
                })?
                .try_into()
        })
    }
}

pub(crate) fn query_user(conn: &Connection, id: Uuid) -> StoreResult<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))?;
    stmt.query_row([id.to_string()], UserRow::from_row).optional()
}

pub(crate) fn query_swap_request(
    conn: &Connection,
    id: Uuid,
) -> StoreResult<Option<SwapRequestRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM swap_requests WHERE id = ?1",
        SWAP_REQUEST_COLUMNS
    ))?;
    stmt.query_row([id.to_string()], SwapRequestRow::from_row)
        .optional()
}

/// Resolves a user reference supplied by a caller. An unknown or nil id is a
/// validation failure of the request, not a missing resource.
pub(crate) fn require_user(conn: &Connection, id: Uuid, role: &str) -> StoreResult<()> {
    if id.is_nil() {
        return Err(StoreError::validation(format!("{} id is required", role)));
    }
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(StoreError::validation(format!("unknown {} {}", role, id)));
    }
    Ok(())
}

/// Trims and bounds a required text field.
pub(crate) fn require_text<'a>(
    field: &str,
    value: &'a str,
    max_len: usize,
) -> StoreResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::validation(format!("{} must not be empty", field)));
    }
    if value.chars().count() > max_len {
        return Err(StoreError::validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_get_user() {
        let db = db();
        let user = db.create_user("  alice ").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(db.get_user(user.id).unwrap(), user);
    }

    #[test]
    fn test_username_rules() {
        let db = db();
        assert!(matches!(db.create_user("al"), Err(StoreError::Validation(_))));
        assert!(matches!(
            db.create_user(&"x".repeat(33)),
            Err(StoreError::Validation(_))
        ));

        db.create_user("alice").unwrap();
        assert!(matches!(
            db.create_user("alice"),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_get_missing_user() {
        let db = db();
        let id = Uuid::new_v4();
        assert!(matches!(
            db.get_user(id),
            Err(StoreError::NotFound { entity: "user", id: missing }) if missing == id
        ));
    }

    #[test]
    fn test_swap_request_references() {
        let db = db();
        let alice = db.create_user("alice").unwrap();
        let bob = db.create_user("bob").unwrap();

        let request = db
            .create_swap_request(alice.id, Some(bob.id), "guitar lessons", "french tutoring")
            .unwrap();
        assert_eq!(request.status, SwapRequestStatus::Open);
        assert!(request.is_party(alice.id));
        assert!(request.is_party(bob.id));
        assert_eq!(db.get_swap_request(request.id).unwrap(), request);

        assert!(matches!(
            db.create_swap_request(Uuid::new_v4(), None, "a", "b"),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            db.create_swap_request(alice.id, Some(Uuid::new_v4()), "a", "b"),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            db.create_swap_request(alice.id, Some(alice.id), "a", "b"),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            db.create_swap_request(alice.id, None, "   ", "b"),
            Err(StoreError::Validation(_))
        ));
    }
}
