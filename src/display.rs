//! Text rendering for the progress and report boxes.

use std::time::Duration;

/// The "already backed up" block shown above the live progress.
pub fn render_already_backed_up(completed: &[String]) -> String {
    let mut text = String::from("Already backed up: \n");
    text.push_str(&completed.join("\n"));
    text
}

pub fn render_progress_text(completed: &[String], directory: &str) -> String {
    format!(
        "{}\n\nBacking up {}",
        render_already_backed_up(completed),
        directory
    )
}

pub fn render_report(completed: &[String], elapsed: Duration) -> String {
    format!(
        "The following directories were backed up:\n{}\n\nDuration: {}",
        render_already_backed_up(completed),
        format_duration(elapsed)
    )
}

/// Human-readable duration, e.g. `42.0s`, `3m 5.0s`, `2h 0m 7.5s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    let whole = duration.as_secs();
    match whole {
        0..=59 => format!("{:.1}s", secs),
        60..=3599 => format!("{}m {:.1}s", whole / 60, secs % 60.0),
        _ => format!(
            "{}h {}m {:.1}s",
            whole / 3600,
            (whole % 3600) / 60,
            secs % 60.0
        ),
    }
}
