use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::config::BillReminderPolicy;
use crate::db::DbPool;
use crate::engine::scheduler as sched_logic;

/// Runtime state for the scheduler, shared across threads.
pub struct SchedulerState {
    running: AtomicBool,
    minute_ticks: AtomicU64,
    daily_ticks: AtomicU64,
    events_notified: AtomicU64,
    bills_reminded: AtomicU64,
    tick_failures: AtomicU64,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            minute_ticks: AtomicU64::new(0),
            daily_ticks: AtomicU64::new(0),
            events_notified: AtomicU64::new(0),
            bills_reminded: AtomicU64::new(0),
            tick_failures: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            running: self.running.load(Ordering::Relaxed),
            minute_ticks: self.minute_ticks.load(Ordering::Relaxed),
            daily_ticks: self.daily_ticks.load(Ordering::Relaxed),
            events_notified: self.events_notified.load(Ordering::Relaxed),
            bills_reminded: self.bills_reminded.load(Ordering::Relaxed),
            tick_failures: self.tick_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStats {
    pub running: bool,
    pub minute_ticks: u64,
    pub daily_ticks: u64,
    pub events_notified: u64,
    pub bills_reminded: u64,
    pub tick_failures: u64,
}

/// Start both background loops. Returns immediately.
pub fn start_loops(scheduler: Arc<SchedulerState>, pool: DbPool, policy: BillReminderPolicy) {
    scheduler.running.store(true, Ordering::Relaxed);
    tracing::info!(
        ?policy,
        "Scheduler starting: event reminders (60s) + bill warnings (daily at midnight)"
    );

    // Event reminder loop
    tokio::spawn({
        let scheduler = scheduler.clone();
        let pool = pool.clone();
        async move {
            minute_loop(scheduler, pool).await;
        }
    });

    // Bill warning loop
    tokio::spawn({
        let scheduler = scheduler.clone();
        async move {
            daily_loop(scheduler, pool, policy).await;
        }
    });
}

/// Stop both background loops.
pub fn stop_loops(scheduler: &SchedulerState) {
    scheduler.running.store(false, Ordering::Relaxed);
    tracing::info!("Scheduler stopped");
}

/// Event reminders: tick once a minute against the wall clock.
async fn minute_loop(scheduler: Arc<SchedulerState>, pool: DbPool) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        if !scheduler.is_running() {
            break;
        }

        match sched_logic::run_minute_tick(&pool, Local::now()) {
            Ok(summary) => {
                scheduler.minute_ticks.fetch_add(1, Ordering::Relaxed);
                scheduler
                    .events_notified
                    .fetch_add(summary.sent, Ordering::Relaxed);
                if summary.sent > 0 || summary.failed > 0 {
                    tracing::debug!(
                        sent = summary.sent,
                        skipped = summary.skipped,
                        failed = summary.failed,
                        "Minute tick finished"
                    );
                }
            }
            Err(e) => {
                scheduler.tick_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Minute tick error: {}", e);
            }
        }
    }
    tracing::info!("Event reminder loop exited");
}

/// Bill warnings: sleep until each local midnight, then warn about bills due
/// the following day.
async fn daily_loop(scheduler: Arc<SchedulerState>, pool: DbPool, policy: BillReminderPolicy) {
    loop {
        let wait = duration_until_next_midnight(Local::now());
        tracing::debug!(
            seconds = wait.as_secs(),
            "Bill warning loop sleeping until midnight"
        );
        tokio::time::sleep(wait).await;
        if !scheduler.is_running() {
            break;
        }

        match sched_logic::run_daily_tick(&pool, Local::now().date_naive(), policy) {
            Ok(summary) => {
                scheduler.daily_ticks.fetch_add(1, Ordering::Relaxed);
                scheduler
                    .bills_reminded
                    .fetch_add(summary.sent, Ordering::Relaxed);
                tracing::info!(
                    candidates = summary.candidates,
                    sent = summary.sent,
                    failed = summary.failed,
                    "Daily tick finished"
                );
            }
            Err(e) => {
                scheduler.tick_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Daily tick error: {}", e);
            }
        }
    }
    tracing::info!("Bill warning loop exited");
}

/// Time remaining until the next local midnight.
///
/// Falls back to a flat 24h when the local midnight is ambiguous (DST
/// transitions) and to 60s when the target is already behind `now`.
pub fn duration_until_next_midnight(now: DateTime<Local>) -> Duration {
    let next_day = now.date_naive() + chrono::Duration::days(1);
    let midnight = next_day.and_hms_opt(0, 0, 0).unwrap();
    match Local.from_local_datetime(&midnight).earliest() {
        Some(target) => (target - now)
            .to_std()
            .unwrap_or(Duration::from_secs(60)),
        None => Duration::from_secs(60 * 60 * 24),
    }
}
