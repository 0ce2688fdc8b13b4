use std::collections::HashMap;

use rusqlite::{Connection, TransactionBehavior};
use skillswap_types::{
    Decision, Interaction, InteractionStatus, InteractionUpdate, SwapRequest, TransitionError,
};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    INTERACTION_COLUMNS, InteractionRow, UPDATE_COLUMNS, UpdateRow, format_timestamp, now,
    parse_timestamp,
};
use crate::queries::{query_swap_request, require_text, require_user};
use crate::{Database, OptionalExt};

/// Upper bound, in characters, for interaction and update messages.
pub const MAX_MESSAGE_LEN: usize = 4000;

const MAX_CLIENT_TOKEN_LEN: usize = 128;

/// A progress note to append to an interaction's log.
#[derive(Debug, Clone, Default)]
pub struct NewUpdate<'a> {
    /// `None` records a system-generated entry.
    pub author_id: Option<Uuid>,
    pub message: &'a str,
    pub percentage: Option<u8>,
    pub client_token: Option<&'a str>,
}

impl Database {
    pub fn create_interaction(
        &self,
        swap_request_id: Uuid,
        user_id: Uuid,
        message: Option<&str>,
    ) -> StoreResult<Interaction> {
        let message = message.unwrap_or_default();
        check_len("message", message, MAX_MESSAGE_LEN)?;
        if swap_request_id.is_nil() {
            return Err(StoreError::validation("swap request id is required"));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if query_swap_request(&tx, swap_request_id)?.is_none() {
                return Err(StoreError::validation(format!(
                    "unknown swap request {}",
                    swap_request_id
                )));
            }
            require_user(&tx, user_id, "user")?;

            let interaction = Interaction {
                id: Uuid::new_v4(),
                swap_request_id,
                user_id,
                message: message.to_string(),
                status: InteractionStatus::Pending,
                created_at: now(),
                decided_by: None,
                decided_at: None,
                updates: Vec::new(),
            };
            tx.execute(
                "INSERT INTO interactions
                    (id, swap_request_id, user_id, message, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    interaction.id.to_string(),
                    swap_request_id.to_string(),
                    user_id.to_string(),
                    &interaction.message,
                    interaction.status.as_str(),
                    format_timestamp(interaction.created_at),
                ],
            )?;
            tx.commit()?;
            Ok(interaction)
        })
    }

    pub fn get_interaction(&self, id: Uuid) -> StoreResult<Interaction> {
        self.with_conn(|conn| {
            load_interaction(conn, id)?.ok_or(StoreError::NotFound {
                entity: "interaction",
                id,
            })
        })
    }

    /// Interactions of a swap request in creation order, each with its log.
    pub fn list_interactions(
        &self,
        swap_request_id: Uuid,
        status: Option<InteractionStatus>,
    ) -> StoreResult<Vec<Interaction>> {
        self.with_conn(|conn| {
            if query_swap_request(conn, swap_request_id)?.is_none() {
                return Err(StoreError::NotFound {
                    entity: "swap request",
                    id: swap_request_id,
                });
            }

            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM interactions
                 WHERE swap_request_id = ?1 AND (?2 IS NULL OR status = ?2)
                 ORDER BY created_at, rowid",
                INTERACTION_COLUMNS
            ))?;
            let rows = stmt
                .query_map(
                    rusqlite::params![swap_request_id.to_string(), status.map(|s| s.as_str())],
                    InteractionRow::from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
            let mut updates = query_updates_for(conn, &ids)?;

            rows.into_iter()
                .map(|row| {
                    let log = updates.remove(&row.id).unwrap_or_default();
                    row.into_interaction(log)
                })
                .collect()
        })
    }

    /// Appends one entry to the log. Status is never touched.
    ///
    /// With a `client_token`, re-sending the same update returns the entry
    /// recorded the first time instead of appending a duplicate.
    pub fn append_update(
        &self,
        interaction_id: Uuid,
        update: NewUpdate<'_>,
    ) -> StoreResult<InteractionUpdate> {
        let message = require_text("message", update.message, MAX_MESSAGE_LEN)?;
        if let Some(pct) = update.percentage {
            if pct > 100 {
                return Err(StoreError::validation("percentage must be between 0 and 100"));
            }
        }
        let client_token = update
            .client_token
            .map(|token| require_text("client_token", token, MAX_CLIENT_TOKEN_LEN))
            .transpose()?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if query_interaction(&tx, interaction_id)?.is_none() {
                return Err(StoreError::NotFound {
                    entity: "interaction",
                    id: interaction_id,
                });
            }
            if let Some(author_id) = update.author_id {
                require_user(&tx, author_id, "author")?;
            }

            let iid = interaction_id.to_string();

            if let Some(token) = client_token {
                let existing = tx
                    .query_row(
                        &format!(
                            "SELECT {} FROM interaction_updates
                             WHERE interaction_id = ?1 AND client_token = ?2",
                            UPDATE_COLUMNS
                        ),
                        [iid.as_str(), token],
                        UpdateRow::from_row,
                    )
                    .optional()?;
                if let Some(row) = existing {
                    let same = row.message == message
                        && row.percentage == update.percentage.map(i64::from)
                        && row.user_id == update.author_id.map(|id| id.to_string());
                    if !same {
                        return Err(StoreError::validation(
                            "client token was already used for a different update",
                        ));
                    }
                    return row.into_update();
                }
            }

            let last: Option<(i64, String)> = tx
                .query_row(
                    "SELECT sequence, created_at FROM interaction_updates
                     WHERE interaction_id = ?1
                     ORDER BY sequence DESC LIMIT 1",
                    [iid.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let mut created_at = now();
            let mut next_sequence = 1;
            if let Some((sequence, last_created_at)) = last {
                // Keep the log's timestamps non-decreasing even if the clock steps back.
                created_at = created_at.max(parse_timestamp(&last_created_at)?);
                next_sequence = sequence + 1;
            }

            let entry = InteractionUpdate {
                sequence: u32::try_from(next_sequence)
                    .map_err(|_| StoreError::validation("update log is full"))?,
                user_id: update.author_id,
                message: message.to_string(),
                percentage: update.percentage,
                client_token: client_token.map(str::to_string),
                created_at,
            };
            tx.execute(
                "INSERT INTO interaction_updates
                    (interaction_id, sequence, user_id, message, percentage,
                     client_token, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    iid,
                    next_sequence,
                    entry.user_id.map(|id| id.to_string()),
                    &entry.message,
                    entry.percentage,
                    &entry.client_token,
                    format_timestamp(entry.created_at),
                ],
            )?;
            tx.commit()?;
            Ok(entry)
        })
    }

    /// Generic status change. Only `accepted` and `rejected` are reachable,
    /// and only from `pending`.
    pub fn set_status(
        &self,
        interaction_id: Uuid,
        target: InteractionStatus,
        actor_id: Uuid,
    ) -> StoreResult<Interaction> {
        self.transition(interaction_id, actor_id, |current| current.transition_to(target))
    }

    pub fn decide(
        &self,
        interaction_id: Uuid,
        decision: Decision,
        actor_id: Uuid,
    ) -> StoreResult<Interaction> {
        self.transition(interaction_id, actor_id, |current| current.decide(decision))
    }

    pub fn mark_accepted(&self, interaction_id: Uuid, actor_id: Uuid) -> StoreResult<Interaction> {
        self.decide(interaction_id, Decision::Accept, actor_id)
    }

    pub fn mark_rejected(&self, interaction_id: Uuid, actor_id: Uuid) -> StoreResult<Interaction> {
        self.decide(interaction_id, Decision::Reject, actor_id)
    }

    /// Marks the parent swap request completed. The interaction's own status
    /// is left as it is.
    pub fn complete(&self, interaction_id: Uuid, actor_id: Uuid) -> StoreResult<SwapRequest> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let row = query_interaction(&tx, interaction_id)?.ok_or(StoreError::NotFound {
                entity: "interaction",
                id: interaction_id,
            })?;
            let request = parent_request(&tx, &row)?;
            if !request.is_party(actor_id) {
                return Err(StoreError::Forbidden {
                    actor: actor_id,
                    swap_request: request.id,
                });
            }

            let changed = tx.execute(
                "UPDATE swap_requests SET status = 'completed', completed_at = ?1
                 WHERE id = ?2 AND status = 'open'",
                (format_timestamp(now()), request.id.to_string()),
            )?;
            if changed == 0 {
                return Err(StoreError::AlreadyCompleted(request.id));
            }

            let completed: SwapRequest = query_swap_request(&tx, request.id)?
                .ok_or(StoreError::NotFound {
                    entity: "swap request",
                    id: request.id,
                })?
                .try_into()?;
            tx.commit()?;
            Ok(completed)
        })
    }

    /// Read, authorize, decide, then compare-and-set on `status = 'pending'`.
    /// Losing the compare-and-set surfaces as `Conflict`.
    fn transition<F>(
        &self,
        interaction_id: Uuid,
        actor_id: Uuid,
        apply: F,
    ) -> StoreResult<Interaction>
    where
        F: FnOnce(InteractionStatus) -> Result<InteractionStatus, TransitionError>,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let row = query_interaction(&tx, interaction_id)?.ok_or(StoreError::NotFound {
                entity: "interaction",
                id: interaction_id,
            })?;
            let request = parent_request(&tx, &row)?;
            if !request.is_party(actor_id) {
                return Err(StoreError::Forbidden {
                    actor: actor_id,
                    swap_request: request.id,
                });
            }

            let current: InteractionStatus = row
                .status
                .parse()
                .map_err(|e| anyhow::anyhow!("corrupt status on interaction {}: {}", row.id, e))?;
            let next = apply(current)?;

            let changed = tx.execute(
                "UPDATE interactions SET status = ?1, decided_by = ?2, decided_at = ?3
                 WHERE id = ?4 AND status = 'pending'",
                (
                    next.as_str(),
                    actor_id.to_string(),
                    format_timestamp(now()),
                    &row.id,
                ),
            )?;
            if changed == 0 {
                return Err(StoreError::Conflict(interaction_id));
            }

            let interaction = load_interaction(&tx, interaction_id)?.ok_or(StoreError::NotFound {
                entity: "interaction",
                id: interaction_id,
            })?;
            tx.commit()?;
            Ok(interaction)
        })
    }
}

fn check_len(field: &str, value: &str, max_len: usize) -> StoreResult<()> {
    if value.chars().count() > max_len {
        return Err(StoreError::validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

fn parent_request(conn: &Connection, row: &InteractionRow) -> StoreResult<SwapRequest> {
    let request_id = crate::models::parse_id(&row.swap_request_id)?;
    query_swap_request(conn, request_id)?
        .ok_or(StoreError::NotFound {
            entity: "swap request",
            id: request_id,
        })?
        .try_into()
}

fn query_interaction(conn: &Connection, id: Uuid) -> StoreResult<Option<InteractionRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM interactions WHERE id = ?1",
        INTERACTION_COLUMNS
    ))?;
    stmt.query_row([id.to_string()], InteractionRow::from_row)
        .optional()
}

fn load_interaction(conn: &Connection, id: Uuid) -> StoreResult<Option<Interaction>> {
    let Some(row) = query_interaction(conn, id)? else {
        return Ok(None);
    };
    let mut updates = query_updates_for(conn, std::slice::from_ref(&row.id))?;
    let log = updates.remove(&row.id).unwrap_or_default();
    row.into_interaction(log).map(Some)
}

/// Batch-fetch update logs for a set of interaction IDs, each in log order.
fn query_updates_for(
    conn: &Connection,
    interaction_ids: &[String],
) -> StoreResult<HashMap<String, Vec<UpdateRow>>> {
    let mut by_interaction: HashMap<String, Vec<UpdateRow>> = HashMap::new();
    if interaction_ids.is_empty() {
        return Ok(by_interaction);
    }

    let placeholders: Vec<String> = (1..=interaction_ids.len())
        .map(|i| format!("?{}", i))
        .collect();
    let sql = format!(
        "SELECT {} FROM interaction_updates
         WHERE interaction_id IN ({})
         ORDER BY interaction_id, sequence",
        UPDATE_COLUMNS,
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = interaction_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let rows = stmt.query_map(params.as_slice(), UpdateRow::from_row)?;
    for row in rows {
        let row = row?;
        by_interaction
            .entry(row.interaction_id.clone())
            .or_default()
            .push(row);
    }

    Ok(by_interaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    struct Fixture {
        db: Database,
        requester: Uuid,
        responder: Uuid,
        outsider: Uuid,
        swap_request: Uuid,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let requester = db.create_user("user-7").unwrap().id;
        let responder = db.create_user("user-42").unwrap().id;
        let outsider = db.create_user("mallory").unwrap().id;
        let swap_request = db
            .create_swap_request(requester, None, "guitar lessons", "spanish conversation")
            .unwrap()
            .id;
        Fixture {
            db,
            requester,
            responder,
            outsider,
            swap_request,
        }
    }

    fn note(message: &str) -> NewUpdate<'_> {
        NewUpdate {
            message,
            ..Default::default()
        }
    }

    fn interaction_count(db: &Database) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM interactions", [], |r| r.get(0))?)
        })
        .unwrap()
    }

    #[test]
    fn test_create_starts_pending_with_empty_log() {
        let f = fixture();
        let created = f
            .db
            .create_interaction(f.swap_request, f.responder, Some("I can teach you"))
            .unwrap();
        assert_eq!(created.status, InteractionStatus::Pending);
        assert!(created.updates.is_empty());
        assert_eq!(created.message, "I can teach you");
        assert_eq!(created.decided_by, None);

        assert_eq!(f.db.get_interaction(created.id).unwrap(), created);
    }

    #[test]
    fn test_create_defaults_message_to_empty() {
        let f = fixture();
        let created = f.db.create_interaction(f.swap_request, f.responder, None).unwrap();
        assert_eq!(created.message, "");
    }

    #[test]
    fn test_create_with_unresolvable_references_persists_nothing() {
        let f = fixture();
        for (swap_request, user) in [
            (f.swap_request, Uuid::nil()),
            (f.swap_request, Uuid::new_v4()),
            (Uuid::nil(), f.responder),
            (Uuid::new_v4(), f.responder),
        ] {
            let err = f.db.create_interaction(swap_request, user, None).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");
        }
        assert_eq!(interaction_count(&f.db), 0);
    }

    #[test]
    fn test_create_rejects_oversized_message() {
        let f = fixture();
        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(matches!(
            f.db.create_interaction(f.swap_request, f.responder, Some(&long)),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_swap_scenario() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;

        let entry = f
            .db
            .append_update(
                id,
                NewUpdate {
                    author_id: Some(f.responder),
                    message: "Started work",
                    percentage: Some(10),
                    client_token: None,
                },
            )
            .unwrap();
        assert_eq!(entry.sequence, 1);
        assert_eq!(entry.percentage, Some(10));

        let current = f.db.get_interaction(id).unwrap();
        assert_eq!(current.updates.len(), 1);
        assert_eq!(current.status, InteractionStatus::Pending);

        let accepted = f
            .db
            .set_status(id, InteractionStatus::Accepted, f.requester)
            .unwrap();
        assert_eq!(accepted.status, InteractionStatus::Accepted);
        assert_eq!(accepted.decided_by, Some(f.requester));
        assert!(accepted.decided_at.is_some());

        let err = f
            .db
            .set_status(id, InteractionStatus::Rejected, f.requester)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition(TransitionError::Terminal(InteractionStatus::Accepted))
        ));
        assert_eq!(f.db.get_interaction(id).unwrap().status, InteractionStatus::Accepted);
    }

    #[test]
    fn test_terminal_states_reject_every_change() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;
        f.db.mark_rejected(id, f.requester).unwrap();

        for target in [
            InteractionStatus::Pending,
            InteractionStatus::Accepted,
            InteractionStatus::Rejected,
        ] {
            assert!(matches!(
                f.db.set_status(id, target, f.requester),
                Err(StoreError::InvalidTransition(_))
            ));
        }
        assert!(matches!(
            f.db.mark_accepted(id, f.requester),
            Err(StoreError::InvalidTransition(_))
        ));
        assert_eq!(f.db.get_interaction(id).unwrap().status, InteractionStatus::Rejected);
    }

    #[test]
    fn test_pending_to_pending_is_rejected() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;
        assert!(matches!(
            f.db.set_status(id, InteractionStatus::Pending, f.requester),
            Err(StoreError::InvalidTransition(TransitionError::NotAllowed { .. }))
        ));
    }

    #[test]
    fn test_unknown_status_is_validation_error() {
        let err: StoreError = "done".parse::<InteractionStatus>().unwrap_err().into();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_transition_requires_party() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;

        assert!(matches!(
            f.db.mark_accepted(id, f.outsider),
            Err(StoreError::Forbidden { actor, .. }) if actor == f.outsider
        ));
        assert_eq!(f.db.get_interaction(id).unwrap().status, InteractionStatus::Pending);
    }

    #[test]
    fn test_transition_on_missing_interaction() {
        let f = fixture();
        assert!(matches!(
            f.db.mark_accepted(Uuid::new_v4(), f.requester),
            Err(StoreError::NotFound { entity: "interaction", .. })
        ));
    }

    #[test]
    fn test_append_keeps_order_and_status() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;

        for i in 0..5 {
            let message = format!("step {}", i);
            f.db.append_update(id, note(&message)).unwrap();
        }

        let interaction = f.db.get_interaction(id).unwrap();
        assert_eq!(interaction.status, InteractionStatus::Pending);
        assert_eq!(interaction.updates.len(), 5);
        for (i, entry) in interaction.updates.iter().enumerate() {
            assert_eq!(entry.sequence as usize, i + 1);
            assert_eq!(entry.message, format!("step {}", i));
            assert_eq!(entry.user_id, None);
        }
        assert!(interaction
            .updates
            .windows(2)
            .all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn test_append_after_decision_leaves_status() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;
        f.db.mark_accepted(id, f.requester).unwrap();

        f.db.append_update(id, note("halfway there")).unwrap();
        let interaction = f.db.get_interaction(id).unwrap();
        assert_eq!(interaction.status, InteractionStatus::Accepted);
        assert_eq!(interaction.updates.len(), 1);
    }

    #[test]
    fn test_append_validation() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;

        assert!(matches!(
            f.db.append_update(Uuid::new_v4(), note("hello")),
            Err(StoreError::NotFound { entity: "interaction", .. })
        ));
        assert!(matches!(
            f.db.append_update(id, note("   ")),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            f.db.append_update(
                id,
                NewUpdate {
                    percentage: Some(101),
                    ..note("too much")
                }
            ),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            f.db.append_update(
                id,
                NewUpdate {
                    author_id: Some(Uuid::new_v4()),
                    ..note("ghost")
                }
            ),
            Err(StoreError::Validation(_))
        ));
        assert!(f.db.get_interaction(id).unwrap().updates.is_empty());
    }

    #[test]
    fn test_client_token_prevents_double_append() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;
        let update = NewUpdate {
            author_id: Some(f.responder),
            message: "Finished chapter one",
            percentage: Some(40),
            client_token: Some("req-1"),
        };

        let first = f.db.append_update(id, update.clone()).unwrap();
        let replay = f.db.append_update(id, update.clone()).unwrap();
        assert_eq!(first, replay);
        assert_eq!(f.db.get_interaction(id).unwrap().updates.len(), 1);

        let reused = NewUpdate {
            message: "Something else",
            ..update
        };
        assert!(matches!(
            f.db.append_update(id, reused),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(f.db.get_interaction(id).unwrap().updates.len(), 1);
    }

    #[test]
    fn test_append_stores_trimmed_text() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;
        let padded = NewUpdate {
            author_id: Some(f.responder),
            message: "  padded  ",
            percentage: None,
            client_token: Some(" req-1 "),
        };

        let entry = f.db.append_update(id, padded.clone()).unwrap();
        assert_eq!(entry.message, "padded");
        assert_eq!(entry.client_token.as_deref(), Some("req-1"));

        let replay = f
            .db
            .append_update(
                id,
                NewUpdate {
                    message: "padded",
                    client_token: Some("req-1"),
                    ..padded
                },
            )
            .unwrap();
        assert_eq!(replay, entry);

        let stored = f.db.get_interaction(id).unwrap().updates;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].message, "padded");
    }

    #[test]
    fn test_list_by_swap_request() {
        let f = fixture();
        let other_request = f
            .db
            .create_swap_request(f.outsider, None, "cooking", "photography")
            .unwrap()
            .id;

        let first = f.db.create_interaction(f.swap_request, f.responder, Some("one")).unwrap();
        let second = f.db.create_interaction(f.swap_request, f.outsider, Some("two")).unwrap();
        f.db.create_interaction(other_request, f.responder, Some("elsewhere")).unwrap();

        f.db.append_update(second.id, note("progress")).unwrap();
        f.db.mark_rejected(first.id, f.requester).unwrap();

        let all = f.db.list_interactions(f.swap_request, None).unwrap();
        assert_eq!(
            all.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
        assert_eq!(all[1].updates.len(), 1);
        assert!(all[0].updates.is_empty());

        let pending = f
            .db
            .list_interactions(f.swap_request, Some(InteractionStatus::Pending))
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);

        assert!(matches!(
            f.db.list_interactions(Uuid::new_v4(), None),
            Err(StoreError::NotFound { entity: "swap request", .. })
        ));
    }

    #[test]
    fn test_complete_marks_parent_only() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;

        assert!(matches!(
            f.db.complete(id, f.outsider),
            Err(StoreError::Forbidden { .. })
        ));

        let request = f.db.complete(id, f.requester).unwrap();
        assert_eq!(request.status, skillswap_types::SwapRequestStatus::Completed);
        assert!(request.completed_at.is_some());
        assert_eq!(f.db.get_interaction(id).unwrap().status, InteractionStatus::Pending);

        assert!(matches!(
            f.db.complete(id, f.requester),
            Err(StoreError::AlreadyCompleted(req)) if req == f.swap_request
        ));
    }

    #[test]
    fn test_concurrent_decisions_have_one_winner() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;
        let requester = f.requester;
        let db = Arc::new(f.db);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [Decision::Accept, Decision::Reject]
            .into_iter()
            .map(|decision| {
                let db = db.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    db.decide(id, decision, requester)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(matches!(
                err,
                StoreError::InvalidTransition(_) | StoreError::Conflict(_)
            ));
        }

        let stored = db.get_interaction(id).unwrap();
        assert_eq!(stored.status, winners[0].status);
    }

    #[test]
    fn test_concurrent_appends_are_all_kept() {
        let f = fixture();
        let id = f.db.create_interaction(f.swap_request, f.responder, None).unwrap().id;
        let db = Arc::new(f.db);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let db = db.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        let message = format!("thread {} note {}", t, i);
                        db.append_update(id, note(&message)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let log = db.get_interaction(id).unwrap().updates;
        assert_eq!(log.len(), 80);
        let sequences: Vec<u32> = log.iter().map(|u| u.sequence).collect();
        assert_eq!(sequences, (1..=80).collect::<Vec<u32>>());
        assert!(log.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }
}
