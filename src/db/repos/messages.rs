use rusqlite::{params, Row};

use crate::db::models::{CreateMessageInput, Message};
use crate::db::DbPool;
use crate::error::AppError;

// ============================================================================
// Row Mappers
// ============================================================================

fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        channel: row.get("channel")?,
        from_phone: row.get("from_phone")?,
        body: row.get("body")?,
        intent_json: row.get("intent_json")?,
        reply: row.get("reply")?,
        created_at: row.get("created_at")?,
    })
}

// ============================================================================
// Messages
// ============================================================================

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<Message, AppError> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT * FROM messages WHERE id = ?1",
        params![id],
        row_to_message,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("Message {id}")),
        other => AppError::Database(other),
    })
}

/// Record an inbound simulator message along with its classified intent.
/// The reply is filled in later via [`set_reply`] once the intent is applied.
pub fn record_inbound(pool: &DbPool, input: CreateMessageInput) -> Result<Message, AppError> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO messages (id, user_id, channel, from_phone, body, intent_json, created_at)
             VALUES (?1, ?2, 'simulator', ?3, ?4, ?5, ?6)",
            params![id, input.user_id, input.from_phone, input.body, input.intent_json, now],
        )?;
    }

    get_by_id(pool, &id)
}

pub fn set_reply(pool: &DbPool, id: &str, reply: &str) -> Result<(), AppError> {
    let conn = pool.get()?;
    let rows = conn.execute(
        "UPDATE messages SET reply = ?1 WHERE id = ?2",
        params![reply, id],
    )?;
    if rows == 0 {
        return Err(AppError::NotFound(format!("Message {id}")));
    }
    Ok(())
}

/// Record an outbound reminder on the reminder channel. `from_phone` holds the
/// recipient's phone so the log reads like the delivery that would have happened.
pub fn record_reminder(
    pool: &DbPool,
    user_id: &str,
    phone: &str,
    body: &str,
    reply: &str,
) -> Result<Message, AppError> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO messages (id, user_id, channel, from_phone, body, reply, created_at)
             VALUES (?1, ?2, 'reminder', ?3, ?4, ?5, ?6)",
            params![id, user_id, phone, body, reply, now],
        )?;
    }

    get_by_id(pool, &id)
}

pub fn list_by_channel(
    pool: &DbPool,
    user_id: &str,
    channel: &str,
    limit: Option<i64>,
) -> Result<Vec<Message>, AppError> {
    let limit = limit.unwrap_or(50);
    let conn = pool.get()?;

    let mut stmt = conn.prepare(
        "SELECT * FROM messages
         WHERE user_id = ?1 AND channel = ?2
         ORDER BY created_at DESC
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![user_id, channel, limit], row_to_message)?;
    let messages = rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)?;
    Ok(messages)
}
