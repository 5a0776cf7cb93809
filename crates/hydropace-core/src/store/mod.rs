//! User-record persistence.

pub mod sqlite;

pub use sqlite::SqliteUserStore;

use std::path::PathBuf;

use crate::error::StoreError;
use crate::state::ReminderState;

/// Transactional per-user record store. Each save is an atomic swap of
/// the whole record; a concurrent writer surfaces as `StoreError::Stale`
/// and the caller reloads and recomputes.
pub trait UserRecordStore: Send {
    /// Load the record for one user.
    fn load(&self, user_id: i64) -> Result<ReminderState, StoreError>;

    /// Persist the record, returning the stored copy with its bumped
    /// version. Fails with `Stale` when the record changed underneath.
    fn save(&self, state: &ReminderState) -> Result<ReminderState, StoreError>;

    /// Remove the record entirely (unsubscribe).
    fn delete(&self, user_id: i64) -> Result<(), StoreError>;

    /// Ids of every user who completed setup, for the poll loop.
    fn list_initialized(&self) -> Result<Vec<i64>, StoreError>;
}

/// Returns `~/.config/hydropace[-dev]/` based on HYDROPACE_ENV.
///
/// Set HYDROPACE_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HYDROPACE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("hydropace-dev")
    } else {
        base_dir.join("hydropace")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
