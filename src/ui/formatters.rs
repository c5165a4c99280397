use chrono::{DateTime, Local};
use humansize::{format_size, FormatSizeOptions, BINARY};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Binary units, one decimal, no space: `0B`, `512B`, `1.5KiB`, `10MiB`
fn size_format() -> FormatSizeOptions {
    FormatSizeOptions::from(BINARY)
        .decimal_places(1)
        .space_after_value(false)
}

/// Format a byte count for the header and the table alike
pub fn bytes_human(bytes: u64) -> String {
    format_size(bytes, size_format())
}

pub fn kb_human(kb: u64) -> String {
    bytes_human(kb.saturating_mul(1024))
}

/// Bar of `width` cells, filled proportionally to `percent`
pub fn pressure_bar(percent: u8, width: usize) -> String {
    let filled = ((percent.min(100) as f64 / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Format timestamp in human-readable format (YYYY-MM-DD HH:MM:SS)
pub fn format_timestamp(time: DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Cut a string to at most `max_width` display columns
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}
