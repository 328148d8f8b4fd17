use rusqlite::Connection;

use crate::error::AppError;

/// Run the consolidated schema migration.
/// Every statement is idempotent, so re-running on an existing database is a no-op.
pub fn run(conn: &Connection) -> Result<(), AppError> {
    tracing::debug!("Running database migrations");

    conn.execute_batch(SCHEMA)?;

    tracing::info!("Database migrations complete");
    Ok(())
}

const SCHEMA: &str = r#"

-- ============================================================================
-- Users (must precede the other tables due to FK)
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    name        TEXT,
    phone       TEXT UNIQUE,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_users_phone ON users(phone);

-- ============================================================================
-- Agenda Events
-- ============================================================================

CREATE TABLE IF NOT EXISTS events (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    description TEXT,
    date        TEXT NOT NULL,              -- YYYY-MM-DD
    time        TEXT,                       -- HH:MM, NULL = all-day
    status      TEXT NOT NULL DEFAULT 'pending' CHECK(status IN ('pending', 'notified')),
    notified    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_user ON events(user_id);
CREATE INDEX IF NOT EXISTS idx_events_due  ON events(date, notified);

-- ============================================================================
-- Financial Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS transactions (
    id            TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind          TEXT NOT NULL CHECK(kind IN ('income', 'expense')),
    description   TEXT NOT NULL,
    amount        REAL,                     -- NULL when the message carried no number
    category      TEXT NOT NULL DEFAULT 'outros',
    date          TEXT NOT NULL,            -- YYYY-MM-DD
    paid          INTEGER NOT NULL DEFAULT 0,
    reminder_sent INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
CREATE INDEX IF NOT EXISTS idx_transactions_due  ON transactions(kind, paid, date);

-- ============================================================================
-- Message Log (inbound simulator traffic + outbound reminders)
-- ============================================================================

CREATE TABLE IF NOT EXISTS messages (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    channel     TEXT NOT NULL DEFAULT 'simulator' CHECK(channel IN ('simulator', 'reminder')),
    from_phone  TEXT,
    body        TEXT NOT NULL,
    intent_json TEXT,
    reply       TEXT,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_user    ON messages(user_id);
CREATE INDEX IF NOT EXISTS idx_messages_channel ON messages(channel);
"#;
