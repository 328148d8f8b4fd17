pub mod events;
pub mod finance;
pub mod messages;
pub mod users;

use chrono::{NaiveDate, NaiveTime};

use crate::error::AppError;

// Dates and times are compared as strings in SQL, so only the
// zero-padded form is accepted.
pub(crate) fn validate_date(date: &str) -> Result<(), AppError> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("Invalid date '{date}'. Expected YYYY-MM-DD"))
    })?;
    if parsed.format("%Y-%m-%d").to_string() != date {
        return Err(AppError::Validation(format!(
            "Invalid date '{date}'. Expected YYYY-MM-DD"
        )));
    }
    Ok(())
}

pub(crate) fn validate_time(time: &str) -> Result<(), AppError> {
    let parsed = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
        AppError::Validation(format!("Invalid time '{time}'. Expected HH:MM"))
    })?;
    if parsed.format("%H:%M").to_string() != time {
        return Err(AppError::Validation(format!(
            "Invalid time '{time}'. Expected HH:MM"
        )));
    }
    Ok(())
}
