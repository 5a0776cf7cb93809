//! TOML-based setup defaults.
//!
//! Prefills the interactive setup with the stock profile values.
//! Stored at `~/.config/hydropace/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::store::data_dir;

/// Default profile values offered during setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_goal_ml")]
    pub daily_goal_ml: u32,
    #[serde(default = "default_dose_ml")]
    pub dose_ml: u32,
    /// Local time of day, `HH:MM`.
    #[serde(default = "default_window_start")]
    pub window_start: String,
    #[serde(default = "default_window_end")]
    pub window_end: String,
    #[serde(default = "default_minimum_interval")]
    pub minimum_interval_seconds: f64,
    #[serde(default = "default_postpone")]
    pub default_postpone_seconds: f64,
    #[serde(default = "default_reminder_text")]
    pub reminder_text: String,
}

fn default_goal_ml() -> u32 {
    3000
}
fn default_dose_ml() -> u32 {
    250
}
fn default_window_start() -> String {
    "08:00".to_string()
}
fn default_window_end() -> String {
    "22:00".to_string()
}
fn default_minimum_interval() -> f64 {
    1200.0
}
fn default_postpone() -> f64 {
    900.0
}
fn default_reminder_text() -> String {
    "Time to hydrate!".to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            daily_goal_ml: default_goal_ml(),
            dose_ml: default_dose_ml(),
            window_start: default_window_start(),
            window_end: default_window_end(),
            minimum_interval_seconds: default_minimum_interval(),
            default_postpone_seconds: default_postpone(),
            reminder_text: default_reminder_text(),
        }
    }
}

impl Defaults {
    fn path() -> Result<PathBuf, std::io::Error> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the defaults, falling back to stock values when the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        let Ok(path) = Self::path() else {
            return Self::default();
        };
        std::fs::read_to_string(path)
            .ok()
            .and_then(|text| toml::from_str(&text).ok())
            .unwrap_or_default()
    }

    /// Persist the defaults.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> Result<(), crate::error::CoreError> {
        let text =
            toml::to_string_pretty(self).map_err(|e| crate::error::CoreError::Custom(e.to_string()))?;
        std::fs::write(Self::path()?, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_defaults_match_the_model() {
        let d = Defaults::default();
        assert_eq!(d.daily_goal_ml, 3000);
        assert_eq!(d.dose_ml, 250);
        assert_eq!(d.window_start, "08:00");
        assert_eq!(d.window_end, "22:00");
        assert_eq!(d.minimum_interval_seconds, 1200.0);
        assert_eq!(d.reminder_text, "Time to hydrate!");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let d: Defaults = toml::from_str("daily_goal_ml = 2500").unwrap();
        assert_eq!(d.daily_goal_ml, 2500);
        assert_eq!(d.dose_ml, 250);
        assert_eq!(d.window_end, "22:00");
    }
}
