//! Shared utilities for CLI commands.

use anyhow::bail;

use cw_core::clock::{day_label, weekday_name};
use cw_core::{BookingDate, Clock, DayLabel};

/// Minimum length of a car number.
const MIN_CAR_NUMBER_LEN: usize = 3;

/// Splits `"MODEL NUMBER"` into its two parts.
///
/// The model is the first word; the number is the rest of the text and must
/// be at least three characters long. Input that looks like a command
/// (leading `/`) is refused.
pub fn parse_car_info(text: &str) -> anyhow::Result<(String, String)> {
    let text = text.trim();
    if text.starts_with('/') {
        bail!("expected car model and number, not a command (e.g. \"Toyota CAM777\")");
    }
    let Some((model, number)) = text.split_once(char::is_whitespace) else {
        bail!("expected car model and number separated by a space (e.g. \"Kia ABC123\")");
    };
    let number = number.trim();
    if number.chars().count() < MIN_CAR_NUMBER_LEN {
        bail!("car number must be at least {MIN_CAR_NUMBER_LEN} characters, got {number:?}");
    }
    Ok((model.to_string(), number.to_string()))
}

/// Human heading for a day: "Today (Sunday)", "Tomorrow (Monday)" or
/// "Tuesday, 17.06.2025".
pub fn day_heading<C: Clock + ?Sized>(clock: &C, date: BookingDate) -> String {
    let weekday = weekday_name(date.weekday());
    match day_label(clock, date) {
        DayLabel::Today => format!("Today ({weekday})"),
        DayLabel::Tomorrow => format!("Tomorrow ({weekday})"),
        DayLabel::Weekday => format!("{weekday}, {date}"),
    }
}
