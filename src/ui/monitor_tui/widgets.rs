use ratatui::prelude::*;

use crate::core::process_monitor::PressureLevel;

/// Resident size (KB) above which a row is drawn red
pub const RSS_CRITICAL_KB: u64 = 1024 * 1024;
/// Resident size (KB) above which a row is drawn yellow
pub const RSS_WARN_KB: u64 = 512 * 1024;

/// Row color from its own resident size
pub fn row_color(rss_kb: u64) -> Color {
    match rss_kb {
        kb if kb > RSS_CRITICAL_KB => Color::LightRed,
        kb if kb > RSS_WARN_KB => Color::LightYellow,
        _ => Color::Reset,
    }
}

pub fn pressure_color(level: PressureLevel) -> Color {
    match level {
        PressureLevel::Normal => Color::Cyan,
        PressureLevel::Warn => Color::LightYellow,
        PressureLevel::Critical => Color::Red,
    }
}

/// Badge text and style for the refresh state
pub fn live_badge(frozen: bool) -> Span<'static> {
    if frozen {
        Span::styled(
            " FROZEN ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            " LIVE ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    }
}
