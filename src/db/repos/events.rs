use rusqlite::{params, Row};

use crate::db::models::{CreateEventInput, Event};
use crate::db::repos::{validate_date, validate_time};
use crate::db::DbPool;
use crate::error::AppError;

fn row_to_event(row: &Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        date: row.get("date")?,
        time: row.get("time")?,
        status: row.get("status")?,
        notified: row.get::<_, i32>("notified")? != 0,
        created_at: row.get("created_at")?,
    })
}

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<Event, AppError> {
    let conn = pool.get()?;
    conn.query_row("SELECT * FROM events WHERE id = ?1", params![id], row_to_event)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("Event {id}")),
            other => AppError::Database(other),
        })
}

pub fn create(pool: &DbPool, input: CreateEventInput) -> Result<Event, AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::Validation("Title cannot be empty".into()));
    }
    validate_date(&input.date)?;
    if let Some(time) = input.time.as_deref() {
        validate_time(time)?;
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO events (id, user_id, title, description, date, time, status, notified, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', 0, ?7)",
            params![id, input.user_id, input.title, input.description, input.date, input.time, now],
        )?;
    }

    get_by_id(pool, &id)
}

pub fn get_by_user_id(
    pool: &DbPool,
    user_id: &str,
    limit: Option<i64>,
) -> Result<Vec<Event>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT * FROM events WHERE user_id = ?1 ORDER BY date ASC, time ASC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id, limit.unwrap_or(50)], row_to_event)?;
    let events = rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)?;
    Ok(events)
}

/// Pending, unnotified events due on `date` at or before `time_cutoff`.
/// All-day events (NULL time) are due from the first tick of the day and
/// sort ahead of timed ones.
pub fn find_due(
    pool: &DbPool,
    date: &str,
    time_cutoff: &str,
    limit: i64,
) -> Result<Vec<Event>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT * FROM events
         WHERE date = ?1
           AND (time IS NULL OR time <= ?2)
           AND status = 'pending'
           AND notified = 0
         ORDER BY time ASC, created_at ASC
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![date, time_cutoff, limit], row_to_event)?;
    let events = rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)?;
    Ok(events)
}

/// Claim the event for notification. Returns false when the event is gone
/// or another tick already took it.
pub fn mark_notified(pool: &DbPool, id: &str) -> Result<bool, AppError> {
    let conn = pool.get()?;
    let rows = conn.execute(
        "UPDATE events SET status = 'notified', notified = 1 WHERE id = ?1 AND notified = 0",
        params![id],
    )?;
    Ok(rows > 0)
}
