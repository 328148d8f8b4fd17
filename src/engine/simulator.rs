//! Message simulator: the inbound channel standing in for a real messaging
//! integration. Every line of input becomes a classified, persisted,
//! replied-to message.

use chrono::{Local, NaiveDate};

use crate::db::models::{CreateEventInput, CreateMessageInput, CreateTransactionInput, User};
use crate::db::repos::{events, finance, messages, users};
use crate::db::DbPool;
use crate::engine::classifier::{classify, Intent, PartialDate};
use crate::error::AppError;

/// Result of handling one inbound message.
#[derive(Debug, Clone)]
pub struct InboundOutcome {
    pub message_id: String,
    pub reply: String,
    pub intent: Intent,
}

/// Handle one inbound simulator message end to end: resolve the sender,
/// classify the text, persist the message, apply the intent, store the reply.
pub fn handle_inbound(
    pool: &DbPool,
    from_phone: &str,
    text: &str,
) -> Result<InboundOutcome, AppError> {
    let user = users::find_or_create_by_phone(pool, from_phone)?;
    let intent = classify(text);
    let intent_json = serde_json::to_string(&intent)?;

    let message = messages::record_inbound(
        pool,
        CreateMessageInput {
            user_id: user.id.clone(),
            from_phone: Some(from_phone.to_string()),
            body: text.trim().to_string(),
            intent_json: Some(intent_json),
        },
    )?;

    let reply = apply_intent(pool, &user, &intent, Local::now().date_naive())?;
    messages::set_reply(pool, &message.id, &reply)?;

    tracing::info!(
        message_id = %message.id,
        user_id = %user.id,
        kind = intent.kind(),
        "Inbound message handled"
    );

    Ok(InboundOutcome {
        message_id: message.id,
        reply,
        intent,
    })
}

/// Apply a classified intent against storage and produce the user-facing reply.
///
/// `today` anchors partial dates; a day that does not exist in the current
/// month falls back to today rather than failing the whole message.
pub fn apply_intent(
    pool: &DbPool,
    user: &User,
    intent: &Intent,
    today: NaiveDate,
) -> Result<String, AppError> {
    match intent {
        Intent::Expense {
            description,
            amount,
            date,
            category,
        } => {
            finance::create(
                pool,
                CreateTransactionInput {
                    user_id: user.id.clone(),
                    kind: "expense".into(),
                    description: description.clone(),
                    amount: *amount,
                    category: Some(category.clone()),
                    date: resolve_or_today(*date, today).to_string(),
                    paid: None,
                },
            )?;
            Ok("✅ Despesa registrada!".into())
        }
        Intent::Income {
            description,
            amount,
            date,
            category,
        } => {
            finance::create(
                pool,
                CreateTransactionInput {
                    user_id: user.id.clone(),
                    kind: "income".into(),
                    description: description.clone(),
                    amount: *amount,
                    category: Some(category.clone()),
                    date: resolve_or_today(*date, today).to_string(),
                    paid: None,
                },
            )?;
            Ok("✅ Receita registrada!".into())
        }
        Intent::Event {
            title,
            description,
            date,
            time,
        } => {
            let event_date = resolve_or_today(*date, today).to_string();
            events::create(
                pool,
                CreateEventInput {
                    user_id: user.id.clone(),
                    title: title.clone(),
                    description: Some(description.clone()),
                    date: event_date.clone(),
                    time: time.map(|t| t.format("%H:%M").to_string()),
                },
            )?;
            Ok(format!("✅ Evento agendado para {event_date}"))
        }
        // No ledger table for debts; the intent stays in the message log.
        Intent::Credit { .. } | Intent::Unknown { .. } => Ok("✅ Recebido!".into()),
    }
}

fn resolve_or_today(date: Option<PartialDate>, today: NaiveDate) -> NaiveDate {
    date.and_then(|d| d.resolve(today)).unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;
    use crate::db::models::CreateUserInput;

    fn create_test_user(pool: &DbPool) -> User {
        users::create(
            pool,
            CreateUserInput {
                email: format!("{}@example.com", uuid::Uuid::new_v4()),
                name: Some("Test User".into()),
                phone: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_income_message_end_to_end() {
        let pool = init_test_db().unwrap();

        let outcome = handle_inbound(&pool, "5511999990001", "recebi 3200 salário").unwrap();
        assert_eq!(outcome.reply, "✅ Receita registrada!");
        assert_eq!(outcome.intent.kind(), "income");

        // First contact auto-provisions the sender.
        let user = users::get_by_phone(&pool, "5511999990001").unwrap();
        assert_eq!(user.email, "5511999990001@temp.com");

        let records = finance::get_by_user_id(&pool, &user.id, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "income");
        assert_eq!(records[0].amount, Some(3200.0));
        assert_eq!(records[0].category, "renda");

        let log = messages::list_by_channel(&pool, &user.id, "simulator", None).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].body, "recebi 3200 salário");
        assert!(log[0].intent_json.as_deref().unwrap().contains("income"));
        assert_eq!(log[0].reply.as_deref(), Some("✅ Receita registrada!"));
    }

    #[test]
    fn test_expense_with_day_resolves_in_current_month() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool);
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();

        let intent = classify("pagar conta de luz dia 15");
        let reply = apply_intent(&pool, &user, &intent, today).unwrap();
        assert_eq!(reply, "✅ Despesa registrada!");

        let records = finance::get_by_user_id(&pool, &user.id, None).unwrap();
        assert_eq!(records[0].date, "2026-08-15");
        assert_eq!(records[0].category, "contas");
        assert!(!records[0].paid);
    }

    #[test]
    fn test_event_reply_embeds_resolved_date() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool);
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();

        let intent = classify("médico dia 10 14h");
        let reply = apply_intent(&pool, &user, &intent, today).unwrap();
        assert_eq!(reply, "✅ Evento agendado para 2026-08-10");

        let agenda = events::get_by_user_id(&pool, &user.id, None).unwrap();
        assert_eq!(agenda.len(), 1);
        assert_eq!(agenda[0].date, "2026-08-10");
        assert_eq!(agenda[0].time.as_deref(), Some("14:00"));
        assert_eq!(agenda[0].title, "médico dia 10 14h");
    }

    #[test]
    fn test_event_without_date_lands_today() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool);
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();

        let intent = classify("reunião 15h");
        let reply = apply_intent(&pool, &user, &intent, today).unwrap();
        assert_eq!(reply, "✅ Evento agendado para 2026-08-23");
    }

    #[test]
    fn test_nonexistent_day_falls_back_to_today() {
        let pool = init_test_db().unwrap();
        let user = create_test_user(&pool);
        // April has no 31st; the mention cannot be resolved.
        let today = NaiveDate::from_ymd_opt(2026, 4, 15).unwrap();

        let intent = classify("pagar conta dia 31");
        apply_intent(&pool, &user, &intent, today).unwrap();

        let records = finance::get_by_user_id(&pool, &user.id, None).unwrap();
        assert_eq!(records[0].date, "2026-04-15");
    }

    #[test]
    fn test_unknown_message_creates_nothing() {
        let pool = init_test_db().unwrap();

        let outcome = handle_inbound(&pool, "5511999990002", "oi tudo bem").unwrap();
        assert_eq!(outcome.reply, "✅ Recebido!");
        assert_eq!(outcome.intent.kind(), "unknown");

        let user = users::get_by_phone(&pool, "5511999990002").unwrap();
        assert!(finance::get_by_user_id(&pool, &user.id, None).unwrap().is_empty());
        assert!(events::get_by_user_id(&pool, &user.id, None).unwrap().is_empty());
        assert_eq!(
            messages::list_by_channel(&pool, &user.id, "simulator", None)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_credit_message_is_logged_only() {
        let pool = init_test_db().unwrap();

        let outcome = handle_inbound(&pool, "5511999990003", "maria me deve 50").unwrap();
        assert_eq!(outcome.reply, "✅ Recebido!");
        assert_eq!(outcome.intent.kind(), "credit");

        let user = users::get_by_phone(&pool, "5511999990003").unwrap();
        assert!(finance::get_by_user_id(&pool, &user.id, None).unwrap().is_empty());
    }

    #[test]
    fn test_repeat_sender_reuses_user() {
        let pool = init_test_db().unwrap();

        handle_inbound(&pool, "5511999990004", "pagar conta de luz 120").unwrap();
        handle_inbound(&pool, "5511999990004", "recebi 500").unwrap();

        let user = users::get_by_phone(&pool, "5511999990004").unwrap();
        let log = messages::list_by_channel(&pool, &user.id, "simulator", None).unwrap();
        assert_eq!(log.len(), 2);

        let records = finance::get_by_user_id(&pool, &user.id, None).unwrap();
        assert_eq!(records.len(), 2);
    }
}
