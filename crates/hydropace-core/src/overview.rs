//! Presentation boundary: overview, confirmation, and offset parsing.
//!
//! Stored times-of-day are already the user's local wall-clock, so
//! formatting is direct; the offset itself is only parsed here during
//! setup.

use crate::state::ReminderState;

/// Format `next_reminder_at`, or `"N/A"` when no reminder is scheduled.
pub fn display_next_reminder(state: &ReminderState) -> String {
    match state.next_reminder_at {
        Some(t) => t.format("%H:%M").to_string(),
        None => "N/A".to_string(),
    }
}

/// Today's consumption overview with an encouragement line and the next
/// scheduled reminder.
pub fn daily_overview(state: &ReminderState) -> String {
    let consumed = state.consumed_today_ml;
    let goal = state.daily_goal_ml;
    let mut msg = format!(
        "Today's water consumption overview:\n\
         You have consumed {consumed}ml out of your daily goal of {goal}ml."
    );
    if state.goal_met() {
        msg.push_str("\nCongratulations! You've met your daily hydration goal!");
    } else if consumed as f64 >= 0.8 * goal as f64 {
        msg.push_str("\nYou've almost met your daily hydration goal!");
    } else {
        msg.push_str("\nKeep drinking water to reach your goal!");
    }
    msg.push_str(&format!(
        "\nNext reminder scheduled at {}.",
        display_next_reminder(state)
    ));
    msg
}

/// Confirmation text after a logged drink.
pub fn consumption_confirmation(state: &ReminderState, amount_ml: u32) -> String {
    format!(
        "Logged {amount_ml}ml of water!\n\
         Total consumed today: {}ml/{}ml.\n\
         Next reminder scheduled at {} local time.",
        state.consumed_today_ml,
        state.daily_goal_ml,
        display_next_reminder(state)
    )
}

/// Parse a `±HH:MM` UTC offset (also accepts `Z`, `UTC`, and bare
/// `±HH`) into minutes.
pub fn parse_utc_offset(input: &str) -> Option<i32> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc")
    {
        return Some(0);
    }
    let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1, rest)
    } else {
        (1, trimmed)
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (rest.parse::<i32>().ok()?, 0),
    };
    if hours > 14 || !(0..60).contains(&minutes) {
        return None;
    }
    Some(sign * (hours * 60 + minutes))
}
