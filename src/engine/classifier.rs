//! Keyword intent classifier for inbound Portuguese messages.
//!
//! [`classify`] is total: every input maps to exactly one [`Intent`], falling
//! back to [`Intent::Unknown`]. Rules are checked in a fixed order and the
//! first hit wins, so a message matching several keyword sets is never
//! ambiguous: "pagar salário dia 5" is an expense, not an income or an event.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+[.,]?\d*").expect("valid amount regex"));
static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dia\s?(\d{1,2})").expect("valid day regex"));
static HOUR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[h:]").expect("valid hour regex"));

/// A day-of-month mention with no month or year attached.
///
/// "dia 10" names a day, not a date. Projection onto a calendar month happens
/// at scheduling time via [`PartialDate::resolve`], never at classification
/// time, so classifying a message today and acting on it tomorrow cannot
/// disagree about what was said.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDate {
    pub day: u32,
}

impl PartialDate {
    pub fn new(day: u32) -> Self {
        Self { day }
    }

    /// Project the day into `today`'s month and year. `None` when the day
    /// does not exist there (dia 31 in a 30-day month).
    pub fn resolve(&self, today: NaiveDate) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(today.year(), today.month(), self.day)
    }
}

/// What an inbound message asks Atlas to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    Expense {
        description: String,
        amount: Option<f64>,
        date: Option<PartialDate>,
        category: String,
    },
    Income {
        description: String,
        amount: Option<f64>,
        date: Option<PartialDate>,
        category: String,
    },
    /// Someone owes the user money. Logged, not ledgered.
    Credit {
        counterparty: String,
        amount: Option<f64>,
    },
    Event {
        title: String,
        description: String,
        date: Option<PartialDate>,
        time: Option<NaiveTime>,
    },
    Unknown {
        raw_text: String,
    },
}

impl Intent {
    /// Stable tag used in logs and in the message log's intent JSON.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::Expense { .. } => "expense",
            Intent::Income { .. } => "income",
            Intent::Credit { .. } => "credit",
            Intent::Event { .. } => "event",
            Intent::Unknown { .. } => "unknown",
        }
    }
}

/// Everything a rule can use, extracted once per message.
struct RuleInput<'a> {
    raw: &'a str,
    normalized: &'a str,
    amount: Option<f64>,
    date: Option<PartialDate>,
    time: Option<NaiveTime>,
}

type IntentBuilder = fn(&RuleInput) -> Intent;

/// Keyword sets in precedence order.
const RULES: &[(&[&str], IntentBuilder)] = &[
    (&["pagar", "pagamento", "conta"], build_expense),
    (&["recebi", "ganhei", "salário"], build_income),
    (&["me deve"], build_credit),
    (&["dia", "reunião", "médico"], build_event),
];

fn build_expense(input: &RuleInput) -> Intent {
    Intent::Expense {
        description: input.raw.to_string(),
        amount: input.amount,
        date: input.date,
        category: "contas".into(),
    }
}

fn build_income(input: &RuleInput) -> Intent {
    Intent::Income {
        description: input.raw.to_string(),
        amount: input.amount,
        date: input.date,
        category: "renda".into(),
    }
}

fn build_credit(input: &RuleInput) -> Intent {
    // "maria me deve 50" -> counterparty "maria"
    let counterparty = input
        .normalized
        .split("me deve")
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    Intent::Credit {
        counterparty,
        amount: input.amount,
    }
}

fn build_event(input: &RuleInput) -> Intent {
    Intent::Event {
        title: input.raw.to_string(),
        description: input.raw.to_string(),
        date: input.date,
        time: input.time,
    }
}

fn extract_amount(normalized: &str) -> Option<f64> {
    let m = AMOUNT_RE.find(normalized)?;
    m.as_str().replace(',', ".").parse().ok()
}

fn extract_day(normalized: &str) -> Option<PartialDate> {
    let caps = DAY_RE.captures(normalized)?;
    let day = caps.get(1)?.as_str().parse().ok()?;
    Some(PartialDate::new(day))
}

fn extract_time(normalized: &str) -> Option<NaiveTime> {
    let caps = HOUR_RE.captures(normalized)?;
    let hour = caps.get(1)?.as_str().parse().ok()?;
    // Minutes are dropped: "14h" and "14:30" both mean 14:00.
    // Out-of-range hours ("25h") yield no time at all.
    NaiveTime::from_hms_opt(hour, 0, 0)
}

/// Classify an inbound message.
///
/// Matching runs on the trimmed, lowercased text; descriptions and titles
/// carry the trimmed original so replies read the way the user typed them.
pub fn classify(text: &str) -> Intent {
    let raw = text.trim();
    let normalized = raw.to_lowercase();

    let input = RuleInput {
        raw,
        normalized: &normalized,
        amount: extract_amount(&normalized),
        date: extract_day(&normalized),
        time: extract_time(&normalized),
    };

    for (keywords, builder) in RULES {
        if keywords.iter().any(|kw| normalized.contains(kw)) {
            return builder(&input);
        }
    }

    Intent::Unknown {
        raw_text: raw.to_string(),
    }
}
