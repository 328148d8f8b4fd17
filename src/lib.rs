pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;

pub use config::{AppConfig, BillReminderPolicy};
pub use db::DbPool;
pub use engine::classifier::{classify, Intent, PartialDate};
pub use error::AppError;
