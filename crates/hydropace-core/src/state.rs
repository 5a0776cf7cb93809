//! Per-user reminder state and validated profile input.
//!
//! `ReminderState` is the persisted record the dispatcher reads and
//! rewrites on every decision tick. Times-of-day (window bounds, the
//! next-reminder slot) are stored in the user's local wall-clock, which
//! keeps a window like 08:00-22:00 representable for every zone;
//! instants (`last_reminder_sent_at`) are UTC, and `local_datetime`
//! bridges the two.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::schedule::HydrationSchedule;

/// Allowed dose range in milliliters.
pub const DOSE_RANGE_ML: (u32, u32) = (100, 500);

/// Validated setup input for one user. Construction is the only place
/// profile invariants are checked; everything downstream assumes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationProfile {
    pub daily_goal_ml: u32,
    pub dose_ml: u32,
    /// Local wall-clock start of the daily window.
    pub window_start: NaiveTime,
    /// Local wall-clock end of the daily window.
    pub window_end: NaiveTime,
    pub minimum_interval_seconds: f64,
    pub default_postpone_seconds: f64,
    pub reminder_text: String,
    /// The user's zone as an offset from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

impl HydrationProfile {
    /// Validate raw setup input.
    ///
    /// # Errors
    /// Returns a `ValidationError` when the dose is outside 100-500 ml,
    /// the window is inverted, the goal is zero, or an interval is
    /// negative.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        daily_goal_ml: u32,
        dose_ml: u32,
        window_start: NaiveTime,
        window_end: NaiveTime,
        minimum_interval_seconds: f64,
        default_postpone_seconds: f64,
        reminder_text: String,
        utc_offset_minutes: i32,
    ) -> Result<Self, ValidationError> {
        let (min, max) = DOSE_RANGE_ML;
        if dose_ml < min || dose_ml > max {
            return Err(ValidationError::DoseOutOfRange { dose_ml, min, max });
        }
        if window_start > window_end {
            return Err(ValidationError::WindowInverted {
                start: window_start,
                end: window_end,
            });
        }
        if daily_goal_ml == 0 {
            return Err(ValidationError::NonPositiveGoal {
                goal_ml: daily_goal_ml,
            });
        }
        if minimum_interval_seconds < 0.0 {
            return Err(ValidationError::NegativeInterval {
                field: "minimum interval",
                seconds: minimum_interval_seconds,
            });
        }
        if default_postpone_seconds < 0.0 {
            return Err(ValidationError::NegativeInterval {
                field: "default postpone",
                seconds: default_postpone_seconds,
            });
        }
        Ok(Self {
            daily_goal_ml,
            dose_ml,
            window_start,
            window_end,
            minimum_interval_seconds,
            default_postpone_seconds,
            reminder_text,
            utc_offset_minutes,
        })
    }
}

/// Persisted reminder state for one user.
///
/// Updated snapshot-in, snapshot-out: the dispatcher functions return a
/// new record and the store performs the atomic swap, detecting
/// concurrent writers through `version`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderState {
    /// Chat/user identifier.
    pub user_id: i64,
    pub daily_goal_ml: u32,
    /// Resets to zero at local midnight (external daily-reset contract).
    /// Not clamped to the goal; may exceed it.
    pub consumed_today_ml: u32,
    pub dose_ml: u32,
    /// Local wall-clock window bounds.
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub minimum_interval_seconds: f64,
    pub default_postpone_seconds: f64,
    pub reminder_text: String,
    pub utc_offset_minutes: i32,
    /// When the next reminder is due, in local wall-clock time. `None`
    /// means uninitialized: schedule on the next tick without sending.
    pub next_reminder_at: Option<NaiveTime>,
    /// Idempotency guard: set when a reminder fires, cleared on every
    /// reschedule.
    pub last_reminder_sent_at: Option<DateTime<Utc>>,
    /// No reminders are dispatched until setup completes.
    pub is_initialized: bool,
    /// Optimistic-concurrency counter, bumped by the store on save.
    #[serde(default)]
    pub version: i64,
}

impl ReminderState {
    /// Build an initialized record from a validated profile, with the
    /// first reminder already scheduled relative to `now`.
    pub fn from_profile(user_id: i64, profile: HydrationProfile, now: DateTime<Utc>) -> Self {
        let mut state = Self {
            user_id,
            daily_goal_ml: profile.daily_goal_ml,
            consumed_today_ml: 0,
            dose_ml: profile.dose_ml,
            window_start: profile.window_start,
            window_end: profile.window_end,
            minimum_interval_seconds: profile.minimum_interval_seconds,
            default_postpone_seconds: profile.default_postpone_seconds,
            reminder_text: profile.reminder_text,
            utc_offset_minutes: profile.utc_offset_minutes,
            next_reminder_at: None,
            last_reminder_sent_at: None,
            is_initialized: true,
            version: 0,
        };
        state.next_reminder_at = Some(
            state
                .schedule()
                .compute_next_reminder(state.local_datetime(now))
                .time(),
        );
        state
    }

    /// Project a UTC instant onto the user's local wall-clock.
    pub fn local_datetime(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        (instant + Duration::minutes(self.utc_offset_minutes as i64)).naive_utc()
    }

    /// Fresh pacing snapshot from the current record.
    pub fn schedule(&self) -> HydrationSchedule {
        HydrationSchedule {
            goal_ml: self.daily_goal_ml,
            consumed_ml: self.consumed_today_ml,
            dose_ml: self.dose_ml,
            window_start: self.window_start,
            window_end: self.window_end,
            minimum_interval_seconds: self.minimum_interval_seconds,
        }
    }

    pub fn remaining_ml(&self) -> u32 {
        self.schedule().remaining_ml()
    }

    pub fn goal_met(&self) -> bool {
        self.consumed_today_ml >= self.daily_goal_ml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn profile() -> HydrationProfile {
        HydrationProfile::new(
            2000,
            250,
            hm(8, 0),
            hm(22, 0),
            300.0,
            900.0,
            "Time to hydrate!".into(),
            0,
        )
        .unwrap()
    }

    #[test]
    fn rejects_dose_outside_range() {
        let err = HydrationProfile::new(2000, 50, hm(8, 0), hm(22, 0), 300.0, 900.0, "x".into(), 0)
            .unwrap_err();
        assert!(matches!(err, ValidationError::DoseOutOfRange { .. }));
        let err =
            HydrationProfile::new(2000, 600, hm(8, 0), hm(22, 0), 300.0, 900.0, "x".into(), 0)
                .unwrap_err();
        assert!(matches!(err, ValidationError::DoseOutOfRange { .. }));
    }

    #[test]
    fn rejects_inverted_window() {
        let err = HydrationProfile::new(2000, 250, hm(22, 0), hm(8, 0), 300.0, 900.0, "x".into(), 0)
            .unwrap_err();
        assert!(matches!(err, ValidationError::WindowInverted { .. }));
    }

    #[test]
    fn rejects_zero_goal_and_negative_intervals() {
        assert!(matches!(
            HydrationProfile::new(0, 250, hm(8, 0), hm(22, 0), 300.0, 900.0, "x".into(), 0),
            Err(ValidationError::NonPositiveGoal { .. })
        ));
        assert!(matches!(
            HydrationProfile::new(2000, 250, hm(8, 0), hm(22, 0), -1.0, 900.0, "x".into(), 0),
            Err(ValidationError::NegativeInterval { .. })
        ));
    }

    #[test]
    fn from_profile_schedules_first_reminder() {
        let now = NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_time(hm(7, 0))
            .and_utc();
        let state = ReminderState::from_profile(42, profile(), now);
        assert!(state.is_initialized);
        assert_eq!(state.consumed_today_ml, 0);
        // Nothing consumed yet and before the window: first slot is the
        // window start.
        assert_eq!(state.next_reminder_at, Some(hm(8, 0)));
        assert!(state.last_reminder_sent_at.is_none());
    }

    #[test]
    fn west_of_utc_window_stays_local_and_validates() {
        // 08:00-22:00 local at -05:00 would invert if forced into UTC
        // times-of-day; stored local it stays a plain forward window.
        let profile = HydrationProfile::new(
            2000,
            250,
            hm(8, 0),
            hm(22, 0),
            300.0,
            900.0,
            "Time to hydrate!".into(),
            -300,
        )
        .unwrap();

        // 12:00 UTC is 07:00 local: first slot at the local window start.
        let now = NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_time(hm(12, 0))
            .and_utc();
        let state = ReminderState::from_profile(9, profile, now);
        assert_eq!(state.local_datetime(now).time(), hm(7, 0));
        assert_eq!(state.next_reminder_at, Some(hm(8, 0)));
    }
}
