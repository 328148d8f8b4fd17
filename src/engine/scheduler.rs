//! Reminder tick execution.
//!
//! Two entry points, one per timer: [`run_minute_tick`] delivers event
//! reminders and [`run_daily_tick`] warns about next-day bills. Both take the
//! clock as an argument, so tests and the loop host control time instead of
//! the functions reading it themselves.

use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::Serialize;

use crate::config::BillReminderPolicy;
use crate::db::models::{Event, FinancialRecord};
use crate::db::repos::{events, finance, messages, users};
use crate::db::DbPool;
use crate::error::AppError;

/// Upper bound on candidates per tick so a backlog cannot wedge the loop.
pub const TICK_BATCH_LIMIT: i64 = 200;

/// What a single tick did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickSummary {
    pub candidates: u64,
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
}

// ============================================================================
// Minute tick: agenda event reminders
// ============================================================================

/// Notify every pending event due at or before `now` on `now`'s date.
///
/// Per-event failures are logged and counted, never propagated, so one broken
/// row cannot starve the rest of the batch.
pub fn run_minute_tick(pool: &DbPool, now: DateTime<Local>) -> Result<TickSummary, AppError> {
    let today = now.date_naive().to_string();
    let cutoff = now.format("%H:%M").to_string();

    let due = events::find_due(pool, &today, &cutoff, TICK_BATCH_LIMIT)?;
    let mut summary = TickSummary {
        candidates: due.len() as u64,
        ..Default::default()
    };

    for event in &due {
        match notify_event(pool, event) {
            Ok(true) => summary.sent += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(event_id = %event.id, "Event reminder failed: {}", e);
            }
        }
    }

    Ok(summary)
}

/// Deliver one event reminder. Returns false when a concurrent tick already
/// claimed the event.
fn notify_event(pool: &DbPool, event: &Event) -> Result<bool, AppError> {
    // Claim before send: if the process dies past this point the event stays
    // notified, which keeps delivery at-most-once.
    if !events::mark_notified(pool, &event.id)? {
        tracing::debug!(event_id = %event.id, "Event already claimed, skipping");
        return Ok(false);
    }

    let user = users::get_by_id(pool, &event.user_id)?;
    let (body, reply) = event_reminder_text(event);

    tracing::info!(
        event_id = %event.id,
        user_id = %user.id,
        title = %event.title,
        "Event reminder sent"
    );

    if let Some(phone) = user.phone.as_deref() {
        messages::record_reminder(pool, &user.id, phone, &body, &reply)?;
    }

    Ok(true)
}

fn event_reminder_text(event: &Event) -> (String, String) {
    let body = format!("Lembrete automático: {}", event.title);
    let reply = match event.time.as_deref() {
        Some(time) => format!("⏰ {}\n📅 {} às {}", event.title, event.date, time),
        None => format!("⏰ {}\n📅 {}", event.title, event.date),
    };
    (body, reply)
}

// ============================================================================
// Daily tick: bill due-tomorrow warnings
// ============================================================================

/// Warn about unpaid bills due the day after `today`.
///
/// With [`BillReminderPolicy::EveryDayUntilPaid`] the same bill is re-announced
/// on every tick until someone marks it paid. With [`BillReminderPolicy::Once`]
/// the one-shot flag is claimed before sending.
pub fn run_daily_tick(
    pool: &DbPool,
    today: NaiveDate,
    policy: BillReminderPolicy,
) -> Result<TickSummary, AppError> {
    let due_date = (today + Duration::days(1)).to_string();
    let only_unreminded = policy == BillReminderPolicy::Once;

    let bills = finance::find_bills_due(pool, &due_date, only_unreminded, TICK_BATCH_LIMIT)?;
    let mut summary = TickSummary {
        candidates: bills.len() as u64,
        ..Default::default()
    };

    for bill in &bills {
        match remind_bill(pool, bill, policy) {
            Ok(true) => summary.sent += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(transaction_id = %bill.id, "Bill reminder failed: {}", e);
            }
        }
    }

    Ok(summary)
}

fn remind_bill(
    pool: &DbPool,
    bill: &FinancialRecord,
    policy: BillReminderPolicy,
) -> Result<bool, AppError> {
    if policy == BillReminderPolicy::Once {
        // Claim the one-shot flag first so a crash cannot double-send.
        if !finance::mark_reminder_sent(pool, &bill.id)? {
            tracing::debug!(transaction_id = %bill.id, "Bill already reminded, skipping");
            return Ok(false);
        }
    }

    let user = users::get_by_id(pool, &bill.user_id)?;
    let (body, reply) = bill_reminder_text(bill);

    tracing::info!(
        transaction_id = %bill.id,
        user_id = %user.id,
        description = %bill.description,
        "Bill reminder sent"
    );

    if let Some(phone) = user.phone.as_deref() {
        messages::record_reminder(pool, &user.id, phone, &body, &reply)?;
    }

    Ok(true)
}

fn bill_reminder_text(bill: &FinancialRecord) -> (String, String) {
    let body = format!("Lembrete de conta: {}", bill.description);
    let mut reply = format!("💰 {} vence amanhã!", bill.description);
    if let Some(amount) = bill.amount {
        reply.push_str(&format!("\nValor: R$ {amount:.2}"));
    }
    reply.push_str(&format!("\nData: {}", bill.date));
    (body, reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::db::init_test_db;
    use crate::db::models::{CreateEventInput, CreateTransactionInput, CreateUserInput};

    fn create_test_user(pool: &DbPool, phone: Option<&str>) -> crate::db::models::User {
        users::create(
            pool,
            CreateUserInput {
                email: format!("{}@example.com", uuid::Uuid::new_v4()),
                name: Some("Test User".into()),
                phone: phone.map(String::from),
            },
        )
        .unwrap()
    }

    fn make_event(pool: &DbPool, user_id: &str, date: &str, time: Option<&str>) -> Event {
        events::create(
            pool,
            CreateEventInput {
                user_id: user_id.into(),
                title: "médico".into(),
                description: None,
                date: date.into(),
                time: time.map(String::from),
            },
        )
        .unwrap()
    }

    fn make_bill(pool: &DbPool, user_id: &str, date: &str, amount: Option<f64>) -> FinancialRecord {
        finance::create(
            pool,
            CreateTransactionInput {
                user_id: user_id.into(),
                kind: "expense".into(),
                description: "conta de luz".into(),
                amount,
                category: None,
                date: date.into(),
                paid: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_minute_tick_sends_exactly_once() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool, Some("5511999990000"));
        let event = make_event(&pool, &user.id, "2026-08-10", Some("09:00"));

        let now = Local.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap();
        let summary = run_minute_tick(&pool, now).unwrap();
        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 0);

        let updated = events::get_by_id(&pool, &event.id).unwrap();
        assert!(updated.notified);
        assert_eq!(updated.status, "notified");

        let reminders = messages::list_by_channel(&pool, &user.id, "reminder", None).unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].body, "Lembrete automático: médico");
        assert_eq!(
            reminders[0].reply.as_deref(),
            Some("⏰ médico\n📅 2026-08-10 às 09:00")
        );

        // A second tick finds nothing: the event is already claimed.
        let again = run_minute_tick(&pool, now).unwrap();
        assert_eq!(again.candidates, 0);
        assert_eq!(again.sent, 0);

        let reminders = messages::list_by_channel(&pool, &user.id, "reminder", None).unwrap();
        assert_eq!(reminders.len(), 1);
    }

    #[test]
    fn test_minute_tick_respects_time_cutoff() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool, Some("5511999990000"));
        make_event(&pool, &user.id, "2026-08-10", Some("14:00"));

        let before = Local.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap();
        let summary = run_minute_tick(&pool, before).unwrap();
        assert_eq!(summary.candidates, 0);

        // The exact due minute counts as due.
        let at = Local.with_ymd_and_hms(2026, 8, 10, 14, 0, 0).unwrap();
        let summary = run_minute_tick(&pool, at).unwrap();
        assert_eq!(summary.sent, 1);
    }

    #[test]
    fn test_minute_tick_all_day_event() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool, Some("5511999990000"));
        make_event(&pool, &user.id, "2026-08-10", None);

        let now = Local.with_ymd_and_hms(2026, 8, 10, 8, 0, 0).unwrap();
        let summary = run_minute_tick(&pool, now).unwrap();
        assert_eq!(summary.sent, 1);

        let reminders = messages::list_by_channel(&pool, &user.id, "reminder", None).unwrap();
        assert_eq!(reminders[0].reply.as_deref(), Some("⏰ médico\n📅 2026-08-10"));
    }

    #[test]
    fn test_minute_tick_phoneless_user() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool, None);
        let event = make_event(&pool, &user.id, "2026-08-10", Some("09:00"));

        let now = Local.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap();
        let summary = run_minute_tick(&pool, now).unwrap();

        // The event is claimed and logged even with nowhere to deliver.
        assert_eq!(summary.sent, 1);
        assert!(events::get_by_id(&pool, &event.id).unwrap().notified);
        let reminders = messages::list_by_channel(&pool, &user.id, "reminder", None).unwrap();
        assert!(reminders.is_empty());
    }

    #[test]
    fn test_daily_tick_repeats_until_paid() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool, Some("5511999990000"));
        let bill = make_bill(&pool, &user.id, "2026-08-11", Some(120.5));

        let today = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let policy = BillReminderPolicy::EveryDayUntilPaid;

        let first = run_daily_tick(&pool, today, policy).unwrap();
        assert_eq!(first.sent, 1);
        let second = run_daily_tick(&pool, today, policy).unwrap();
        assert_eq!(second.sent, 1);

        let reminders = messages::list_by_channel(&pool, &user.id, "reminder", None).unwrap();
        assert_eq!(reminders.len(), 2);

        finance::mark_paid(&pool, &bill.id).unwrap();
        let third = run_daily_tick(&pool, today, policy).unwrap();
        assert_eq!(third.candidates, 0);
    }

    #[test]
    fn test_daily_tick_once_policy() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool, Some("5511999990000"));
        make_bill(&pool, &user.id, "2026-08-11", Some(120.5));

        let today = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let policy = BillReminderPolicy::Once;

        let first = run_daily_tick(&pool, today, policy).unwrap();
        assert_eq!(first.sent, 1);
        let second = run_daily_tick(&pool, today, policy).unwrap();
        assert_eq!(second.candidates, 0);

        let reminders = messages::list_by_channel(&pool, &user.id, "reminder", None).unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(
            reminders[0].reply.as_deref(),
            Some("💰 conta de luz vence amanhã!\nValor: R$ 120.50\nData: 2026-08-11")
        );
    }

    #[test]
    fn test_daily_tick_only_warns_tomorrow() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool, Some("5511999990000"));
        make_bill(&pool, &user.id, "2026-08-10", Some(50.0));
        make_bill(&pool, &user.id, "2026-08-12", Some(50.0));

        let today = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let summary =
            run_daily_tick(&pool, today, BillReminderPolicy::EveryDayUntilPaid).unwrap();
        assert_eq!(summary.candidates, 0);
    }

    #[test]
    fn test_reminder_texts() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool, None);

        let timed = make_event(&pool, &user.id, "2026-08-10", Some("14:00"));
        let (body, reply) = event_reminder_text(&timed);
        assert_eq!(body, "Lembrete automático: médico");
        assert_eq!(reply, "⏰ médico\n📅 2026-08-10 às 14:00");

        let all_day = make_event(&pool, &user.id, "2026-08-10", None);
        let (_, reply) = event_reminder_text(&all_day);
        assert_eq!(reply, "⏰ médico\n📅 2026-08-10");

        let no_amount = make_bill(&pool, &user.id, "2026-08-11", None);
        let (body, reply) = bill_reminder_text(&no_amount);
        assert_eq!(body, "Lembrete de conta: conta de luz");
        assert_eq!(reply, "💰 conta de luz vence amanhã!\nData: 2026-08-11");
    }
}
