use chrono::NaiveTime;
use clap::Args;
use hydropace_core::overview::{display_next_reminder, parse_utc_offset};
use hydropace_core::{Defaults, HydrationProfile};

use super::open_service;

#[derive(Args)]
pub struct SetupArgs {
    /// Daily water goal in milliliters
    #[arg(long)]
    goal: Option<u32>,
    /// Milliliters per reminder/log event (100-500)
    #[arg(long)]
    dose: Option<u32>,
    /// First reminder of the day, local time (HH:MM)
    #[arg(long)]
    window_start: Option<String>,
    /// Last reminder of the day, local time (HH:MM)
    #[arg(long)]
    window_end: Option<String>,
    /// Shortest allowed spacing between reminders, in seconds
    #[arg(long)]
    min_interval: Option<f64>,
    /// Default postpone duration, in seconds
    #[arg(long)]
    postpone: Option<f64>,
    /// Reminder message text
    #[arg(long)]
    text: Option<String>,
    /// Local timezone as a UTC offset, e.g. +02:00
    #[arg(long, default_value = "UTC")]
    utc_offset: String,
}

fn parse_time(input: &str) -> Result<NaiveTime, Box<dyn std::error::Error>> {
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{input}', expected HH:MM").into())
}

pub fn run(user: i64, args: SetupArgs) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = Defaults::load();
    let offset_minutes = parse_utc_offset(&args.utc_offset)
        .ok_or_else(|| format!("invalid UTC offset '{}'", args.utc_offset))?;

    // Window bounds are entered and stored in the user's local time;
    // the offset only matters when comparing against the UTC clock.
    let window_start =
        parse_time(args.window_start.as_deref().unwrap_or(&defaults.window_start))?;
    let window_end = parse_time(args.window_end.as_deref().unwrap_or(&defaults.window_end))?;

    let profile = HydrationProfile::new(
        args.goal.unwrap_or(defaults.daily_goal_ml),
        args.dose.unwrap_or(defaults.dose_ml),
        window_start,
        window_end,
        args.min_interval.unwrap_or(defaults.minimum_interval_seconds),
        args.postpone.unwrap_or(defaults.default_postpone_seconds),
        args.text.unwrap_or(defaults.reminder_text),
        offset_minutes,
    )?;

    let service = open_service()?;
    let state = service.setup_profile(user, profile)?;
    println!(
        "Setup complete for user {user}. First reminder scheduled at {} local time.",
        display_next_reminder(&state)
    );
    Ok(())
}
