use rusqlite::{params, Row};

use crate::db::models::{CreateUserInput, User};
use crate::db::DbPool;
use crate::error::AppError;

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        name: row.get("name")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
    })
}

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<User, AppError> {
    let conn = pool.get()?;
    conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], row_to_user)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("User {id}")),
            other => AppError::Database(other),
        })
}

pub fn get_by_phone(pool: &DbPool, phone: &str) -> Result<User, AppError> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT * FROM users WHERE phone = ?1",
        params![phone],
        row_to_user,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            AppError::NotFound(format!("User with phone {phone}"))
        }
        other => AppError::Database(other),
    })
}

pub fn create(pool: &DbPool, input: CreateUserInput) -> Result<User, AppError> {
    if input.email.trim().is_empty() {
        return Err(AppError::Validation("Email cannot be empty".into()));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO users (id, email, name, phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, input.email, input.name, input.phone, now],
        )?;
    }

    get_by_id(pool, &id)
}

/// Resolve a user by phone, provisioning a placeholder account on first contact.
pub fn find_or_create_by_phone(pool: &DbPool, phone: &str) -> Result<User, AppError> {
    if phone.trim().is_empty() {
        return Err(AppError::Validation("Phone cannot be empty".into()));
    }

    match get_by_phone(pool, phone) {
        Ok(user) => Ok(user),
        Err(AppError::NotFound(_)) => create(
            pool,
            CreateUserInput {
                email: format!("{phone}@temp.com"),
                name: Some(format!("Usuário {phone}")),
                phone: Some(phone.to_string()),
            },
        ),
        Err(e) => Err(e),
    }
}
