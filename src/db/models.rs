use serde::{Deserialize, Serialize};

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

// ============================================================================
// Agenda Event
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM, `None` = all-day
    pub time: Option<String>,
    pub status: String,
    pub notified: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventInput {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub time: Option<String>,
}

// ============================================================================
// Financial Record
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub description: String,
    pub amount: Option<f64>,
    pub category: String,
    /// YYYY-MM-DD
    pub date: String,
    pub paid: bool,
    pub reminder_sent: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionInput {
    pub user_id: String,
    pub kind: String,
    pub description: String,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub date: String,
    pub paid: Option<bool>,
}

// ============================================================================
// Message
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub channel: String,
    pub from_phone: Option<String>,
    pub body: String,
    pub intent_json: Option<String>,
    pub reply: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageInput {
    pub user_id: String,
    pub from_phone: Option<String>,
    pub body: String,
    pub intent_json: Option<String>,
}
