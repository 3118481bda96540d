//! Time formatting for the status label and the timer window

/// Shown on the status label whenever no countdown is displayed
pub const IDLE_GLYPH: &str = "⏱";

/// Alternating glyphs for the completion flash
pub const FLASH_GLYPHS: [&str; 2] = ["🔔", "⏰"];

/// Number of glyph changes in one completion flash
pub const FLASH_STEPS: u32 = 6;

fn split(total_seconds: u64) -> (u64, u64, u64) {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    (hours, minutes, seconds)
}

/// Status label form: `H:MM:SS` or `M:SS`, idle glyph at zero
pub fn format_compact(total_seconds: u64) -> String {
    if total_seconds == 0 {
        return IDLE_GLYPH.to_string();
    }

    match split(total_seconds) {
        (0, minutes, seconds) => format!("{}:{:02}", minutes, seconds),
        (hours, minutes, seconds) => format!("{}:{:02}:{:02}", hours, minutes, seconds),
    }
}

/// Window form: `HH:MM:SS` or `MM:SS`, `00:00` at zero
pub fn format_padded(total_seconds: u64) -> String {
    if total_seconds == 0 {
        return "00:00".to_string();
    }

    match split(total_seconds) {
        (0, minutes, seconds) => format!("{:02}:{:02}", minutes, seconds),
        (hours, minutes, seconds) => format!("{:02}:{:02}:{:02}", hours, minutes, seconds),
    }
}

/// Elapsed share of the countdown in percent, 0 when nothing was started
pub fn progress_percent(total_time: u64, time_remaining: u64) -> f64 {
    if total_time == 0 {
        return 0.0;
    }

    let elapsed = total_time as f64 - time_remaining as f64;
    (elapsed / total_time as f64 * 100.0).clamp(0.0, 100.0)
}
