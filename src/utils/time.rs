use chrono::NaiveDate;

/// This is the standard way of converting a date to a string in file names.
pub fn date_to_file_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats decimal hours as `5h 30m`. Seconds are dropped.
pub fn format_hours(hours: f64) -> String {
    if hours.is_nan() || hours <= 0. {
        return "0h 0m".into();
    }
    let whole = hours.floor();
    let minutes = ((hours - whole) * 60.).floor();
    format!("{}h {}m", whole as u64, minutes as u64)
}

/// Formats decimal hours as a clock-like `H:MM:SS`.
pub fn format_hours_clock(hours: f64) -> String {
    if hours.is_nan() || hours <= 0. {
        return "0:00:00".into();
    }
    let total_seconds = (hours * 3600.).floor() as u64;
    format!(
        "{}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}
