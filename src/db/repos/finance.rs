use rusqlite::{params, Row};

use crate::db::models::{CreateTransactionInput, FinancialRecord};
use crate::db::repos::validate_date;
use crate::db::DbPool;
use crate::error::AppError;

const VALID_KINDS: &[&str] = &["income", "expense"];
const DEFAULT_CATEGORY: &str = "outros";

fn validate_kind(kind: &str) -> Result<(), AppError> {
    if !VALID_KINDS.contains(&kind) {
        return Err(AppError::Validation(format!(
            "Invalid kind '{}'. Must be one of: {}",
            kind,
            VALID_KINDS.join(", ")
        )));
    }
    Ok(())
}

fn row_to_record(row: &Row) -> rusqlite::Result<FinancialRecord> {
    Ok(FinancialRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        kind: row.get("kind")?,
        description: row.get("description")?,
        amount: row.get("amount")?,
        category: row.get("category")?,
        date: row.get("date")?,
        paid: row.get::<_, i32>("paid")? != 0,
        reminder_sent: row.get::<_, i32>("reminder_sent")? != 0,
        created_at: row.get("created_at")?,
    })
}

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<FinancialRecord, AppError> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT * FROM transactions WHERE id = ?1",
        params![id],
        row_to_record,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("Transaction {id}")),
        other => AppError::Database(other),
    })
}

pub fn create(pool: &DbPool, input: CreateTransactionInput) -> Result<FinancialRecord, AppError> {
    validate_kind(&input.kind)?;
    if input.description.trim().is_empty() {
        return Err(AppError::Validation("Description cannot be empty".into()));
    }
    validate_date(&input.date)?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let category = input
        .category
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let paid = input.paid.unwrap_or(false) as i32;

    {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO transactions
             (id, user_id, kind, description, amount, category, date, paid, reminder_sent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
            params![
                id,
                input.user_id,
                input.kind,
                input.description,
                input.amount,
                category,
                input.date,
                paid,
                now
            ],
        )?;
    }

    get_by_id(pool, &id)
}

pub fn get_by_user_id(
    pool: &DbPool,
    user_id: &str,
    limit: Option<i64>,
) -> Result<Vec<FinancialRecord>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT * FROM transactions WHERE user_id = ?1 ORDER BY date DESC, created_at DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id, limit.unwrap_or(50)], row_to_record)?;
    let records = rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)?;
    Ok(records)
}

/// Unpaid expenses due on `date`. With `only_unreminded` the query also
/// skips bills whose one-shot reminder already went out.
pub fn find_bills_due(
    pool: &DbPool,
    date: &str,
    only_unreminded: bool,
    limit: i64,
) -> Result<Vec<FinancialRecord>, AppError> {
    let conn = pool.get()?;
    let sql = if only_unreminded {
        "SELECT * FROM transactions
         WHERE kind = 'expense' AND paid = 0 AND reminder_sent = 0 AND date = ?1
         ORDER BY created_at ASC
         LIMIT ?2"
    } else {
        "SELECT * FROM transactions
         WHERE kind = 'expense' AND paid = 0 AND date = ?1
         ORDER BY created_at ASC
         LIMIT ?2"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![date, limit], row_to_record)?;
    let records = rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)?;
    Ok(records)
}

/// Claim the bill's one-shot reminder flag. Returns false when a previous
/// daily tick already sent it.
pub fn mark_reminder_sent(pool: &DbPool, id: &str) -> Result<bool, AppError> {
    let conn = pool.get()?;
    let rows = conn.execute(
        "UPDATE transactions SET reminder_sent = 1 WHERE id = ?1 AND reminder_sent = 0",
        params![id],
    )?;
    Ok(rows > 0)
}

/// Mark the bill paid. Returns false when it was already paid or is missing.
pub fn mark_paid(pool: &DbPool, id: &str) -> Result<bool, AppError> {
    let conn = pool.get()?;
    let rows = conn.execute(
        "UPDATE transactions SET paid = 1 WHERE id = ?1 AND paid = 0",
        params![id],
    )?;
    Ok(rows > 0)
}
