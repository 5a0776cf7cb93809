pub mod drink;
pub mod postpone;
pub mod remind;
pub mod reset;
pub mod setup;
pub mod status;
pub mod stop;

use hydropace_core::{ConsoleMessenger, ReminderService, SqliteUserStore, SystemClock};

pub type CliService = ReminderService<SqliteUserStore, ConsoleMessenger, SystemClock>;

/// Open the on-disk store and wire it to console delivery and the wall
/// clock.
pub fn open_service() -> Result<CliService, Box<dyn std::error::Error>> {
    let store = SqliteUserStore::open()?;
    Ok(ReminderService::new(store, ConsoleMessenger, SystemClock))
}
