use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            email           TEXT NOT NULL UNIQUE,
            full_name       TEXT NOT NULL,
            hashed_password TEXT NOT NULL,
            role            TEXT NOT NULL CHECK (role IN ('manager', 'employee')),
            is_active       INTEGER NOT NULL DEFAULT 1,
            manager_id      INTEGER REFERENCES users(id),
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_users_manager
            ON users(manager_id);

        CREATE TABLE IF NOT EXISTS feedback_requests (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL REFERENCES users(id),
            status      TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_requests_employee
            ON feedback_requests(employee_id);

        CREATE TABLE IF NOT EXISTS feedback (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            content             TEXT NOT NULL,
            strengths           TEXT NOT NULL,
            areas_to_improve    TEXT NOT NULL,
            sentiment           TEXT NOT NULL CHECK (sentiment IN ('positive', 'neutral', 'negative')),
            is_anonymous        INTEGER NOT NULL DEFAULT 0,
            is_acknowledged     INTEGER NOT NULL DEFAULT 0,
            manager_id          INTEGER NOT NULL REFERENCES users(id),
            employee_id         INTEGER NOT NULL REFERENCES users(id),
            feedback_request_id INTEGER REFERENCES feedback_requests(id),
            created_at          TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_feedback_giver
            ON feedback(manager_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_feedback_receiver
            ON feedback(employee_id, created_at);

        CREATE TABLE IF NOT EXISTS feedback_comments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            feedback_id INTEGER NOT NULL REFERENCES feedback(id) ON DELETE CASCADE,
            author_id   INTEGER NOT NULL REFERENCES users(id),
            comment     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_feedback
            ON feedback_comments(feedback_id);

        CREATE TABLE IF NOT EXISTS feedback_tags (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            feedback_id INTEGER NOT NULL REFERENCES feedback(id) ON DELETE CASCADE,
            tag_name    TEXT NOT NULL,
            UNIQUE(feedback_id, tag_name)
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id             INTEGER NOT NULL REFERENCES users(id),
            message             TEXT NOT NULL,
            read                INTEGER NOT NULL DEFAULT 0,
            related_feedback_id INTEGER REFERENCES feedback(id) ON DELETE SET NULL,
            related_request_id  INTEGER REFERENCES feedback_requests(id) ON DELETE SET NULL,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
