use chrono::{Local, TimeZone};
use tubeq_core::{AppViewModel, HistoryRowView, JobRowView, JobStatus};
use tubeq_engine::BackendSettings;

use super::palette::Palette;
use crate::platform::commands::HELP;

const BAR_WIDTH: usize = 24;

/// Renders the whole screen as lines of text.
pub fn render(view: &AppViewModel, settings: &BackendSettings, palette: &Palette) -> Vec<String> {
    let mut lines = Vec::new();

    let mode = if view.polling { "polling" } else { "idle" };
    lines.push(palette.heading(&format!(
        "tubeq  [{} | {} | {} theme]",
        settings.variant.as_str(),
        mode,
        view.theme.as_str()
    )));

    if let Some(banner) = &view.banner {
        lines.push(palette.error(&format!("! {banner}  (:dismiss)")));
    }
    if let Some(error) = &view.validation_error {
        lines.push(palette.error(error));
    }
    if let Some(stats) = &view.last_submit_stats {
        lines.push(palette.muted(&format!(
            "Last submit: enqueued {}, skipped {}",
            stats.enqueued, stats.skipped
        )));
    }

    lines.push(String::new());
    lines.push(palette.heading("Queue"));
    if view.show_empty_placeholder {
        lines.push(palette.muted("  Queue is empty. Paste YouTube links to start."));
    }
    for (index, row) in view.rows.iter().enumerate() {
        render_row(&mut lines, index + 1, row, settings, palette);
    }

    lines.push(String::new());
    lines.push(palette.heading("History"));
    if view.history.is_empty() {
        lines.push(palette.muted("  No download history."));
    }
    for entry in &view.history {
        render_history(&mut lines, entry, settings, palette);
    }

    lines.push(String::new());
    lines.push(palette.muted(HELP));
    lines
}

fn render_row(
    lines: &mut Vec<String>,
    number: usize,
    row: &JobRowView,
    settings: &BackendSettings,
    palette: &Palette,
) {
    let marker = if row.is_current { ">" } else { " " };
    let label = palette.status(row.status, &format!("[{}]", row.status.label()));
    lines.push(format!("{marker}{number:>2}. {label} {}", row.title));
    lines.push(palette.muted(&format!("     {}", row.url)));
    if let Some(thumbnail) = &row.thumbnail {
        lines.push(palette.muted(&format!("     thumbnail: {thumbnail}")));
    }

    if let Some(progress) = &row.progress {
        let mut line = format!(
            "     {} {:>5.1}%",
            progress_bar(progress.percent),
            progress.percent
        );
        if let Some(speed) = &progress.speed {
            line.push_str(&format!("  {speed}"));
        }
        if let Some(eta) = &progress.eta {
            line.push_str(&format!("  ETA {eta}"));
        }
        lines.push(line);
    }
    if row.status == JobStatus::Completed {
        if let Some(filename) = &row.download {
            lines.push(format!("     Download: {}", download_link(settings, filename, palette)));
        }
    }
    if let Some(message) = &row.message {
        lines.push(palette.error(&format!("     {message}")));
    }
    if row.can_retry {
        lines.push(palette.muted(&format!("     retry with :retry {number}")));
    }
}

fn render_history(
    lines: &mut Vec<String>,
    entry: &HistoryRowView,
    settings: &BackendSettings,
    palette: &Palette,
) {
    let when = Local
        .timestamp_millis_opt(entry.timestamp_ms)
        .single()
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    lines.push(format!("  {}  {}", entry.title, palette.muted(&when)));
    lines.push(format!("     {}", download_link(settings, &entry.filename, palette)));
}

fn download_link(settings: &BackendSettings, filename: &str, palette: &Palette) -> String {
    match settings.download_url(filename) {
        Ok(url) => palette.link(url.as_str()),
        Err(_) => filename.to_string(),
    }
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
