use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const SCHEMA_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE swap_requests (
                id              TEXT PRIMARY KEY,
                requester_id    TEXT NOT NULL REFERENCES users(id),
                recipient_id    TEXT REFERENCES users(id),
                skill_offered   TEXT NOT NULL,
                skill_wanted    TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'open'
                                CHECK (status IN ('open', 'completed')),
                created_at      TEXT NOT NULL,
                completed_at    TEXT
            );

            CREATE TABLE interactions (
                id                  TEXT PRIMARY KEY,
                swap_request_id     TEXT NOT NULL REFERENCES swap_requests(id),
                user_id             TEXT NOT NULL REFERENCES users(id),
                message             TEXT NOT NULL DEFAULT '',
                status              TEXT NOT NULL DEFAULT 'pending'
                                    CHECK (status IN ('pending', 'accepted', 'rejected')),
                created_at          TEXT NOT NULL,
                decided_by          TEXT REFERENCES users(id),
                decided_at          TEXT
            );

            CREATE INDEX idx_interactions_swap_request
                ON interactions(swap_request_id, created_at);

            CREATE TABLE interaction_updates (
                interaction_id  TEXT NOT NULL REFERENCES interactions(id),
                sequence        INTEGER NOT NULL,
                user_id         TEXT REFERENCES users(id),
                message         TEXT NOT NULL,
                percentage      INTEGER CHECK (percentage BETWEEN 0 AND 100),
                client_token    TEXT,
                created_at      TEXT NOT NULL,
                PRIMARY KEY (interaction_id, sequence)
            );

            CREATE UNIQUE INDEX idx_interaction_updates_token
                ON interaction_updates(interaction_id, client_token)
                WHERE client_token IS NOT NULL;

            -- The update log is append-only.
            CREATE TRIGGER interaction_updates_no_update
                BEFORE UPDATE ON interaction_updates
            BEGIN
                SELECT RAISE(ABORT, 'interaction updates are append-only');
            END;

            CREATE TRIGGER interaction_updates_no_delete
                BEFORE DELETE ON interaction_updates
            BEGIN
                SELECT RAISE(ABORT, 'interaction updates are append-only');
            END;

            CREATE TRIGGER interactions_immutable_refs
                BEFORE UPDATE OF swap_request_id, user_id, created_at ON interactions
            BEGIN
                SELECT RAISE(ABORT, 'interaction references are immutable');
            END;

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", SCHEMA_VERSION);
    Ok(())
}
