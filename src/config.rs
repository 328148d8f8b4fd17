use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// How often the daily tick re-announces a pending bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillReminderPolicy {
    /// Remind on every daily tick until the bill is marked paid.
    #[default]
    EveryDayUntilPaid,
    /// Remind exactly once per bill.
    Once,
}

impl FromStr for BillReminderPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "every_day" | "every_day_until_paid" => Ok(Self::EveryDayUntilPaid),
            "once" => Ok(Self::Once),
            other => Err(AppError::Validation(format!(
                "Invalid ATLAS_BILL_REMINDER '{other}'. Must be 'daily' or 'once'"
            ))),
        }
    }
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the SQLite database and log files.
    pub data_dir: PathBuf,
    pub bill_reminder_policy: BillReminderPolicy,
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// `ATLAS_DATA_DIR` overrides the platform-local data directory and
    /// `ATLAS_BILL_REMINDER` ("daily" or "once") selects the bill policy.
    pub fn from_env() -> Result<Self, AppError> {
        let data_dir = match std::env::var("ATLAS_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir(),
        };
        let bill_reminder_policy = match std::env::var("ATLAS_BILL_REMINDER") {
            Ok(raw) => raw.parse()?,
            Err(_) => BillReminderPolicy::default(),
        };
        Ok(Self {
            data_dir,
            bill_reminder_policy,
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("atlas"))
        .unwrap_or_else(|| PathBuf::from("data"))
}
