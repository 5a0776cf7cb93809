//! Reminder dispatch decision logic.
//!
//! One decision tick per user per poll. Each function takes the current
//! record and returns the next one; the store performs the atomic swap.
//! `next_reminder_at` only advances on consumption acknowledgment or
//! postponement, never on the send itself -- an unacknowledged reminder
//! keeps its slot and the idempotency guard prevents re-sends.
//!
//! `now` arrives as a UTC instant and is projected onto the user's
//! local wall-clock before any comparison against the stored
//! times-of-day.

use chrono::{DateTime, Duration, Utc};

use crate::state::ReminderState;

/// What the poller should do after a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing due this tick.
    NoOp,
    /// Deliver this reminder text now.
    SendReminder(String),
}

/// Result of one decision tick: the record to persist and the action to
/// take after persisting.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub state: ReminderState,
    pub action: Action,
}

impl TickOutcome {
    fn noop(state: ReminderState) -> Self {
        Self {
            state,
            action: Action::NoOp,
        }
    }
}

/// Decide whether a reminder is due at `now`.
pub fn tick(state: &ReminderState, now: DateTime<Utc>) -> TickOutcome {
    if !state.is_initialized {
        return TickOutcome::noop(state.clone());
    }

    // Clock anomaly: degrade to a no-op instead of firing on bad data.
    if let Some(last_sent) = state.last_reminder_sent_at {
        if now < last_sent {
            log::warn!(
                "clock skew for user {}: now {} earlier than last send {}",
                state.user_id,
                now,
                last_sent
            );
            return TickOutcome::noop(state.clone());
        }
    }

    let local = state.local_datetime(now);

    let Some(next_at) = state.next_reminder_at else {
        // First-ever scheduling; does not itself trigger a send.
        let mut next = state.clone();
        next.next_reminder_at = Some(next.schedule().compute_next_reminder(local).time());
        return TickOutcome::noop(next);
    };

    if local.time() < next_at {
        return TickOutcome::noop(state.clone());
    }

    // Idempotency guard: an earlier tick already fired for this slot.
    if let Some(last_sent) = state.last_reminder_sent_at {
        if state.local_datetime(last_sent).time() >= next_at {
            return TickOutcome::noop(state.clone());
        }
    }

    // Unreachable when the steps above are consistent; guards against
    // misconfiguration.
    if !state.schedule().in_window(local.time()) {
        return TickOutcome::noop(state.clone());
    }

    let mut next = state.clone();
    next.last_reminder_sent_at = Some(now);
    TickOutcome {
        action: Action::SendReminder(next.reminder_text.clone()),
        state: next,
    }
}

/// Record a drink and re-pace the rest of the day. Called both from
/// explicit logging and from reminder acknowledgment.
pub fn on_consumption_logged(
    state: &ReminderState,
    amount_ml: u32,
    now: DateTime<Utc>,
) -> ReminderState {
    let mut next = state.clone();
    next.consumed_today_ml += amount_ml;
    // Re-pace with the post-increment consumption, and clear the guard
    // so the new slot can fire.
    let local = next.local_datetime(now);
    next.next_reminder_at = Some(next.schedule().compute_next_reminder(local).time());
    next.last_reminder_sent_at = None;
    next
}

/// Defer the current slot without logging consumption. An out-of-window
/// candidate falls back to regular pacing.
pub fn on_postponed(
    state: &ReminderState,
    now: DateTime<Utc>,
    postpone_seconds: f64,
) -> ReminderState {
    let local = state.local_datetime(now);
    let candidate =
        (local + Duration::milliseconds((postpone_seconds * 1000.0).round() as i64)).time();
    let schedule = state.schedule();

    let mut next = state.clone();
    next.next_reminder_at = if schedule.in_window(candidate) {
        Some(candidate)
    } else {
        Some(schedule.compute_next_reminder(local).time())
    };
    next.last_reminder_sent_at = None;
    next
}
