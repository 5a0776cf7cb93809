//! Adaptive pacing engine.
//!
//! `HydrationSchedule` is a pure calculator over a per-user snapshot. It
//! answers two questions: "is this time inside the reminder window?" and
//! "when should the next reminder fire?". Pacing is recomputed from
//! scratch on every call so a late or early drink log immediately
//! re-paces the rest of the day.
//!
//! No I/O, no mutable state. The dispatcher rebuilds a fresh snapshot
//! from the stored record on every decision tick.
//!
//! All times here are the user's local wall-clock (the window bounds are
//! entered and stored local). Callers project the UTC instant onto the
//! user's zone before asking, see `ReminderState::local_datetime`.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// Immutable pacing snapshot for one user on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydrationSchedule {
    /// Total daily target in milliliters.
    pub goal_ml: u32,
    /// Amount logged so far today.
    pub consumed_ml: u32,
    /// Milliliters per reminder/log event.
    pub dose_ml: u32,
    /// Inclusive start of the daily reminder window.
    pub window_start: NaiveTime,
    /// Inclusive end of the daily reminder window.
    pub window_end: NaiveTime,
    /// Floor on spacing between reminders, in seconds.
    pub minimum_interval_seconds: f64,
}

impl HydrationSchedule {
    /// Milliliters still to drink today.
    pub fn remaining_ml(&self) -> u32 {
        self.goal_ml.saturating_sub(self.consumed_ml)
    }

    /// Number of doses still needed to reach the goal. Zero once the
    /// goal is met or exceeded.
    pub fn remaining_doses(&self) -> u32 {
        self.remaining_ml().div_ceil(self.dose_ml.max(1))
    }

    /// Whether `t` lies inside the reminder window. Both bounds are
    /// inclusive.
    pub fn in_window(&self, t: NaiveTime) -> bool {
        self.window_start <= t && t <= self.window_end
    }

    /// Seconds left between `from` and the window end, clamped at zero.
    pub fn remaining_window_seconds(&self, from: NaiveTime) -> i64 {
        let end = self.window_end.num_seconds_from_midnight() as i64;
        let now = from.num_seconds_from_midnight() as i64;
        (end - now).max(0)
    }

    /// Ideal spacing between the remaining reminders, ignoring the
    /// minimum-interval floor. `None` when the goal is already met or
    /// the window is over for today.
    pub fn ideal_interval_seconds(&self, from: NaiveTime) -> Option<f64> {
        let doses = self.remaining_doses();
        if doses == 0 {
            return None;
        }
        let remaining = self.remaining_window_seconds(from);
        if remaining == 0 {
            return None;
        }
        Some(remaining as f64 / doses as f64)
    }

    /// Ideal spacing, floored at `minimum_interval_seconds`.
    pub fn effective_interval_seconds(&self, from: NaiveTime) -> Option<f64> {
        self.ideal_interval_seconds(from)
            .map(|ideal| ideal.max(self.minimum_interval_seconds))
    }

    /// Whether the daily goal can still be met with ideal pacing. When
    /// the minimum-interval floor kicks in the user simply receives
    /// fewer reminders than doses remain; that is surfaced here, not
    /// treated as a scheduling failure.
    pub fn goal_reachable(&self, from: NaiveTime) -> bool {
        self.ideal_interval_seconds(from).is_some()
    }

    /// Compute the instant of the next reminder relative to `from`.
    ///
    /// Before the window opens the next slot is today's `window_start`;
    /// past `window_end` it is tomorrow's. Inside the window, a day with
    /// nothing logged yet gets its first reminder immediately; otherwise
    /// the paced candidate is `from` plus the effective interval. When
    /// no further reminder fits today (goal met, window exhausted, or
    /// the candidate overshoots `window_end`) the result is tomorrow's
    /// first slot.
    pub fn compute_next_reminder(&self, from: NaiveDateTime) -> NaiveDateTime {
        let time_of_day = from.time();

        if time_of_day < self.window_start {
            return at_time(from, self.window_start);
        }
        if time_of_day > self.window_end {
            return at_time(from, self.window_start) + Duration::days(1);
        }

        // Nothing logged yet today: the first reminder is due right away.
        if self.consumed_ml == 0 && self.remaining_doses() > 0 {
            return from;
        }

        let Some(interval) = self.effective_interval_seconds(time_of_day) else {
            return at_time(from, self.window_start) + Duration::days(1);
        };

        let candidate = from + Duration::milliseconds((interval * 1000.0).round() as i64);
        let candidate_time = candidate.time();

        if candidate_time < self.window_start {
            // Guarded: pacing never lands here when `from` is inside the window.
            at_time(candidate, self.window_start)
        } else if candidate_time > self.window_end {
            at_time(candidate, self.window_start) + Duration::days(1)
        } else {
            candidate
        }
    }
}

/// Same calendar day as `instant`, at time-of-day `t`.
fn at_time(instant: NaiveDateTime, t: NaiveTime) -> NaiveDateTime {
    instant.date().and_time(t)
}
