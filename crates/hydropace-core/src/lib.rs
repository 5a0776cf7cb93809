//! # Hydropace Core Library
//!
//! Core business logic for Hydropace, an adaptive hydration reminder
//! scheduler. The library decides when a user should next be reminded to
//! drink water, given their daily goal, what they have logged so far,
//! and how much of their reminder window remains. An external poller
//! invokes the dispatcher once per active user per tick; delivery,
//! chat-platform glue, and the setup conversation live outside this
//! crate.
//!
//! ## Architecture
//!
//! - **Schedule engine**: a pure calculator that re-paces the remaining
//!   doses over the remaining window on every call, so a late or early
//!   drink log immediately reshapes the rest of the day
//! - **Dispatcher**: snapshot-in, snapshot-out decision functions for
//!   one poll tick (send / skip / reschedule), with an idempotency
//!   guard against duplicate sends
//! - **Service**: orchestration over injected `UserRecordStore`,
//!   `MessagingClient`, and `Clock` collaborators
//! - **Storage**: SQLite user records with version-checked saves
//!
//! ## Key Components
//!
//! - [`HydrationSchedule`]: pure pacing math
//! - [`ReminderState`]: the persisted per-user record
//! - [`ReminderService`]: one-stop entry point for pollers and commands

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod messaging;
pub mod overview;
pub mod schedule;
pub mod service;
pub mod state;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Defaults;
pub use dispatcher::{Action, TickOutcome};
pub use error::{CoreError, DeliveryError, StoreError, ValidationError};
pub use messaging::{ConsoleMessenger, MessagingClient, SendOptions};
pub use schedule::HydrationSchedule;
pub use service::{PollReport, ReminderService};
pub use state::{HydrationProfile, ReminderState};
pub use store::{SqliteUserStore, UserRecordStore};
