//! Orchestration over the injected collaborators.
//!
//! `ReminderService` wires the pure dispatcher to a record store, a
//! messaging client, and a clock. Persistence happens before delivery
//! (at-most-once reminders), stale saves are retried by reloading and
//! recomputing, and the poll loop isolates failures per user.

use crate::clock::Clock;
use crate::dispatcher::{self, Action};
use crate::error::{Result, StoreError};
use crate::messaging::{MessagingClient, SendOptions};
use crate::overview;
use crate::state::{HydrationProfile, ReminderState};
use crate::store::UserRecordStore;

/// Retries for a read-modify-write that lost a race.
const MAX_SAVE_ATTEMPTS: usize = 3;

/// Aggregate result of one poll pass over all users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub polled: usize,
    pub sent: usize,
    pub failed: usize,
}

pub struct ReminderService<S, M, C> {
    store: S,
    messenger: M,
    clock: C,
}

impl<S, M, C> ReminderService<S, M, C>
where
    S: UserRecordStore,
    M: MessagingClient,
    C: Clock,
{
    pub fn new(store: S, messenger: M, clock: C) -> Self {
        Self {
            store,
            messenger,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create (or replace) an initialized record for the user, with the
    /// first reminder scheduled relative to now.
    pub fn setup_profile(&self, user_id: i64, profile: HydrationProfile) -> Result<ReminderState> {
        let mut state = ReminderState::from_profile(user_id, profile, self.clock.now());
        // Replacing an existing record: carry its version forward so the
        // save does not spuriously report staleness.
        match self.store.load(user_id) {
            Ok(existing) => state.version = existing.version,
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self.store.save(&state)?)
    }

    /// Run one decision tick for one user. State is persisted before the
    /// send, so delivery failures never cause duplicate reminders.
    pub fn run_tick(&self, user_id: i64) -> Result<Action> {
        let now = self.clock.now();
        let (action, state) = self.read_modify_write(user_id, |state| {
            let outcome = dispatcher::tick(state, now);
            (outcome.action, outcome.state)
        })?;

        if let Action::SendReminder(text) = &action {
            self.messenger.send(
                user_id,
                text,
                &SendOptions::with_ack("reply with `drink` when done"),
            )?;
            log::info!(
                "reminder sent to user {user_id}, slot {}",
                overview::display_next_reminder(&state)
            );
        }
        Ok(action)
    }

    /// Poll every initialized user. A failing user is logged and skipped;
    /// the loop never aborts early.
    pub fn run_all_ticks(&self) -> Result<PollReport> {
        let mut report = PollReport::default();
        for user_id in self.store.list_initialized()? {
            report.polled += 1;
            match self.run_tick(user_id) {
                Ok(Action::SendReminder(_)) => report.sent += 1,
                Ok(Action::NoOp) => {}
                Err(e) => {
                    report.failed += 1;
                    log::error!("tick failed for user {user_id}: {e}");
                }
            }
        }
        Ok(report)
    }

    /// Log a drink (defaulting to the user's dose) and re-pace the day.
    /// Returns the confirmation text after delivering it to the user.
    pub fn log_consumption(&self, user_id: i64, amount_ml: Option<u32>) -> Result<String> {
        let now = self.clock.now();
        let (amount, state) = self.read_modify_write(user_id, |state| {
            let amount = amount_ml.unwrap_or(state.dose_ml);
            (amount, dispatcher::on_consumption_logged(state, amount, now))
        })?;

        let text = overview::consumption_confirmation(&state, amount);
        self.messenger.send(user_id, &text, &SendOptions::default())?;
        Ok(text)
    }

    /// Defer the current slot without logging consumption.
    pub fn postpone(&self, user_id: i64, postpone_seconds: Option<f64>) -> Result<String> {
        let now = self.clock.now();
        let ((), state) = self.read_modify_write(user_id, |state| {
            let seconds = postpone_seconds.unwrap_or(state.default_postpone_seconds);
            ((), dispatcher::on_postponed(state, now, seconds))
        })?;
        Ok(format!(
            "Reminder postponed. Next reminder scheduled at {}.",
            overview::display_next_reminder(&state)
        ))
    }

    /// Today's consumption overview.
    pub fn daily_overview(&self, user_id: i64) -> Result<String> {
        let state = self.store.load(user_id)?;
        Ok(overview::daily_overview(&state))
    }

    /// Delete the user's record; no further reminders are dispatched.
    pub fn unsubscribe(&self, user_id: i64) -> Result<()> {
        self.store.delete(user_id)?;
        Ok(())
    }

    /// Local-midnight reset contract: zero consumption, slot back to the
    /// window start, guard cleared. Returns the number of users reset.
    pub fn reset_daily(&self) -> Result<usize> {
        let mut count = 0;
        for user_id in self.store.list_initialized()? {
            let result = self.read_modify_write(user_id, |state| {
                let mut next = state.clone();
                next.consumed_today_ml = 0;
                next.next_reminder_at = Some(next.window_start);
                next.last_reminder_sent_at = None;
                ((), next)
            });
            match result {
                Ok(_) => count += 1,
                Err(e) => log::error!("daily reset failed for user {user_id}: {e}"),
            }
        }
        Ok(count)
    }

    /// Load-apply-save with stale-save retries. Saves only when the
    /// record actually changed.
    fn read_modify_write<T>(
        &self,
        user_id: i64,
        mut apply: impl FnMut(&ReminderState) -> (T, ReminderState),
    ) -> Result<(T, ReminderState)> {
        let mut attempts = 0;
        loop {
            let current = self.store.load(user_id)?;
            let (value, next) = apply(&current);
            if next == current {
                return Ok((value, current));
            }
            match self.store.save(&next) {
                Ok(stored) => return Ok((value, stored)),
                Err(StoreError::Stale { .. }) if attempts + 1 < MAX_SAVE_ATTEMPTS => {
                    attempts += 1;
                    log::warn!("stale save for user {user_id}, retrying (attempt {attempts})");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::{CoreError, DeliveryError};
    use crate::store::SqliteUserStore;
    use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
    use std::sync::Mutex;

    struct RecordingMessenger {
        sent: Mutex<Vec<(i64, String)>>,
        fail: bool,
    }

    impl RecordingMessenger {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn sent(&self) -> Vec<(i64, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl MessagingClient for RecordingMessenger {
        fn send(
            &self,
            user_id: i64,
            text: &str,
            _options: &SendOptions,
        ) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError {
                    user_id,
                    message: "chat platform unavailable".into(),
                });
            }
            self.sent.lock().unwrap().push((user_id, text.to_string()));
            Ok(())
        }
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_time(hm(h, m))
            .and_utc()
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

    fn service(
        clock_start: DateTime<Utc>,
    ) -> ReminderService<SqliteUserStore, RecordingMessenger, FixedClock> {
        ReminderService::new(
            SqliteUserStore::open_memory().unwrap(),
            RecordingMessenger::new(),
            FixedClock::new(clock_start),
        )
    }

    #[test]
    fn full_day_walk_spaces_seven_reminders_two_hours_apart() {
        // Goal 2000 ml, dose 250 ml, window 08:00-22:00: after the 08:00
        // acknowledgment, 1750 ml over 14 h means a reminder every 2 h.
        let svc = service(at(7, 0));
        svc.setup_profile(1, profile()).unwrap();

        // Before the window nothing fires; the slot sits at 08:00.
        assert_eq!(svc.run_tick(1).unwrap(), Action::NoOp);

        let mut fired_at = Vec::new();
        let clock = &svc.clock;
        for hour in [8, 10, 12, 14, 16, 18, 20, 22] {
            clock.set(at(hour, 0));
            let action = svc.run_tick(1).unwrap();
            assert!(
                matches!(action, Action::SendReminder(_)),
                "expected a send at {hour}:00"
            );
            fired_at.push(hour);

            // A poll half an hour later must not double-fire.
            clock.advance(Duration::minutes(30));
            assert_eq!(svc.run_tick(1).unwrap(), Action::NoOp);

            clock.set(at(hour, 0));
            svc.log_consumption(1, None).unwrap();
        }

        assert_eq!(fired_at.len(), 8);
        let state = svc.store().load(1).unwrap();
        assert_eq!(state.consumed_today_ml, state.daily_goal_ml);
        // Day complete: deferred to the next window opening.
        assert_eq!(state.next_reminder_at, Some(hm(8, 0)));
    }

    #[test]
    fn west_of_utc_user_walks_the_day_on_local_time() {
        // Local window 08:00-22:00 at -05:00 spans 13:00 UTC to 03:00
        // UTC the next day; scheduling runs on the local wall-clock.
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
        let svc = service(at(12, 0)); // 07:00 local
        svc.setup_profile(1, profile).unwrap();
        assert_eq!(svc.run_tick(1).unwrap(), Action::NoOp);

        // 13:00 UTC is the 08:00 local window start.
        svc.clock.set(at(13, 0));
        assert!(matches!(svc.run_tick(1).unwrap(), Action::SendReminder(_)));
        svc.log_consumption(1, None).unwrap();

        // 1750 ml over 14 local hours: next slot 10:00 local, 15:00 UTC.
        let state = svc.store().load(1).unwrap();
        assert_eq!(state.next_reminder_at, Some(hm(10, 0)));
        svc.clock.set(at(14, 30));
        assert_eq!(svc.run_tick(1).unwrap(), Action::NoOp);
        svc.clock.set(at(15, 0));
        assert!(matches!(svc.run_tick(1).unwrap(), Action::SendReminder(_)));
    }

    #[test]
    fn delivery_failure_keeps_the_guard_set() {
        let store = SqliteUserStore::open_memory().unwrap();
        let clock = FixedClock::new(at(7, 0));
        let svc = ReminderService::new(store, RecordingMessenger::failing(), clock);
        svc.setup_profile(1, profile()).unwrap();

        svc.clock.set(at(8, 0));
        let err = svc.run_tick(1).unwrap_err();
        assert!(matches!(err, CoreError::Delivery(_)));

        // The state mutation preceded the send attempt: at-most-once.
        let state = svc.store().load(1).unwrap();
        assert_eq!(state.last_reminder_sent_at, Some(at(8, 0)));
        svc.clock.set(at(8, 1));
        assert_eq!(svc.run_tick(1).unwrap(), Action::NoOp);
    }

    /// Store wrapper whose load fails for one user, to exercise per-user
    /// failure isolation in the poll loop.
    struct FlakyStore {
        inner: SqliteUserStore,
        broken_user: i64,
    }

    impl UserRecordStore for FlakyStore {
        fn load(&self, user_id: i64) -> Result<ReminderState, StoreError> {
            if user_id == self.broken_user {
                return Err(StoreError::QueryFailed("disk I/O error".into()));
            }
            self.inner.load(user_id)
        }

        fn save(&self, state: &ReminderState) -> Result<ReminderState, StoreError> {
            self.inner.save(state)
        }

        fn delete(&self, user_id: i64) -> Result<(), StoreError> {
            self.inner.delete(user_id)
        }

        fn list_initialized(&self) -> Result<Vec<i64>, StoreError> {
            self.inner.list_initialized()
        }
    }

    #[test]
    fn poll_pass_isolates_user_failures() {
        let inner = SqliteUserStore::open_memory().unwrap();
        inner
            .save(&ReminderState::from_profile(1, profile(), at(8, 0)))
            .unwrap();
        inner
            .save(&ReminderState::from_profile(2, profile(), at(8, 0)))
            .unwrap();

        let store = FlakyStore {
            inner,
            broken_user: 1,
        };
        let svc = ReminderService::new(store, RecordingMessenger::new(), FixedClock::new(at(8, 0)));

        let report = svc.run_all_ticks().unwrap();
        assert_eq!(report.polled, 2);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(
            svc.messenger.sent(),
            vec![(2, "Time to hydrate!".to_string())]
        );
    }

    #[test]
    fn postpone_moves_slot_and_falls_back_to_default_seconds() {
        let svc = service(at(7, 0));
        svc.setup_profile(1, profile()).unwrap();
        svc.clock.set(at(12, 0));
        svc.log_consumption(1, Some(250)).unwrap();

        let msg = svc.postpone(1, None).unwrap();
        assert!(msg.contains("12:15"));
        assert_eq!(svc.store().load(1).unwrap().next_reminder_at, Some(hm(12, 15)));
    }

    #[test]
    fn daily_reset_restores_the_morning_state() {
        let svc = service(at(7, 0));
        svc.setup_profile(1, profile()).unwrap();
        svc.clock.set(at(9, 0));
        svc.run_tick(1).unwrap();
        svc.log_consumption(1, Some(500)).unwrap();

        assert_eq!(svc.reset_daily().unwrap(), 1);
        let state = svc.store().load(1).unwrap();
        assert_eq!(state.consumed_today_ml, 0);
        assert_eq!(state.next_reminder_at, Some(hm(8, 0)));
        assert!(state.last_reminder_sent_at.is_none());
    }

    #[test]
    fn unsubscribe_stops_everything() {
        let svc = service(at(8, 0));
        svc.setup_profile(1, profile()).unwrap();
        svc.unsubscribe(1).unwrap();
        assert!(svc.run_tick(1).is_err());
        assert_eq!(svc.run_all_ticks().unwrap(), PollReport::default());
    }
}
