use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table,
    },
};

use super::app::MonitorApp;
use super::widgets::{live_badge, pressure_color, row_color};
use crate::core::process_monitor::{age_human, ProcessNode, VisibleRow};
use crate::ui::formatters::{
    bytes_human, format_timestamp, kb_human, pressure_bar, truncate_to_width,
};

const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 2;
/// Table borders plus the column header row
const TABLE_CHROME: u16 = 3;

const PID_WIDTH: u16 = 7;
const METRIC_WIDTH: u16 = 9;
const AGE_WIDTH: u16 = 6;
const TREND_WIDTH: u16 = 12;

/// Rows of the process list that fit in a terminal `height` lines tall
pub fn list_height(height: u16) -> usize {
    height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT + TABLE_CHROME) as usize
}

/// Main render function
pub fn render_ui(frame: &mut Frame, app: &MonitorApp) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(TABLE_CHROME),
            Constraint::Length(1), // Key bar or search prompt
            Constraint::Length(1), // Flash, hint and breadcrumb
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_process_table(frame, chunks[1], app);
    render_key_bar(frame, chunks[2], app);
    render_info_line(frame, chunks[3], app);

    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let summary = &app.summary;
    let view = app.coordinator.view();
    let color = pressure_color(summary.pressure_level);

    let line = Line::from(vec![
        Span::styled("RAM: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "{}/{}",
            bytes_human(summary.used_bytes),
            bytes_human(summary.total_bytes)
        )),
        Span::raw("  "),
        Span::styled("Swap: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(bytes_human(summary.swap_used_bytes)),
        Span::raw("  "),
        Span::styled("Pressure: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(pressure_bar(summary.pressure_percent, 10), Style::default().fg(color)),
        Span::styled(
            format!(" {}%", summary.pressure_percent),
            Style::default().fg(color),
        ),
        Span::raw("  "),
        live_badge(view.frozen),
    ]);
    let line = match app.last_updated {
        Some(at) => {
            let mut spans = line.spans;
            spans.push(Span::styled(
                format!("  updated {}", format_timestamp(at)),
                Style::default().fg(Color::DarkGray),
            ));
            Line::from(spans)
        }
        None => line,
    };

    let block = Block::default()
        .title(" ramtree ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_process_table(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let coordinator = &app.coordinator;
    let view = coordinator.view();
    let rows = coordinator.rows();

    let title = if view.filter.is_empty() {
        format!(" Processes ({}) ", coordinator.forest().len())
    } else {
        format!(" Processes ({} matching \"{}\") ", rows.len(), view.filter)
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 {
        return;
    }

    let header = Row::new(
        ["PID", "NAME", "RSS", "VIRT", "DIRTY", "SWAP", "AGE", "TREND"]
            .into_iter()
            .map(|title| {
                let mut style = Style::default().add_modifier(Modifier::BOLD);
                if title == view.sort_key.label() {
                    style = style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);
                }
                Cell::from(title).style(style)
            }),
    )
    .height(1);

    let fixed = PID_WIDTH + METRIC_WIDTH * 4 + AGE_WIDTH + TREND_WIDTH + 7;
    let name_width = inner.width.saturating_sub(fixed).max(8) as usize;

    let page = inner.height.saturating_sub(1) as usize;
    let start = view.scroll_offset.min(rows.len());
    let end = (start + page).min(rows.len());

    let table_rows: Vec<Row> = rows[start..end]
        .iter()
        .enumerate()
        .map(|(offset, row)| {
            let node = coordinator.forest().node(row.node);
            let selected = start + offset == view.cursor;
            process_row(app, row, node, name_width, selected)
        })
        .collect();

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(PID_WIDTH),
            Constraint::Min(8),
            Constraint::Length(METRIC_WIDTH),
            Constraint::Length(METRIC_WIDTH),
            Constraint::Length(METRIC_WIDTH),
            Constraint::Length(METRIC_WIDTH),
            Constraint::Length(AGE_WIDTH),
            Constraint::Length(TREND_WIDTH),
        ],
    )
    .header(header);

    frame.render_widget(table, inner);

    if rows.len() > page {
        let mut state = ScrollbarState::new(rows.len().saturating_sub(page)).position(start);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut state,
        );
    }
}

fn process_row<'a>(
    app: &MonitorApp,
    row: &VisibleRow,
    node: &ProcessNode,
    name_width: usize,
    selected: bool,
) -> Row<'a> {
    let indicator = if node.is_leaf() {
        "  "
    } else if node.expanded {
        "▼ "
    } else {
        "▶ "
    };
    let tree = format!("{}{}{}{}", row.prefix, row.connector(), indicator, node.name);

    let style = if selected {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(row_color(node.rss_kb))
    };

    Row::new(vec![
        Cell::from(node.pid.to_string()),
        Cell::from(truncate_to_width(&tree, name_width)),
        Cell::from(kb_human(node.rss_kb)),
        Cell::from(kb_human(node.vsz_kb)),
        Cell::from(detail_cell(node.detail.dirty_bytes)),
        Cell::from(detail_cell(node.detail.swap_bytes)),
        Cell::from(age_human(node.age_seconds())),
        Cell::from(app.coordinator.ledger().sparkline(node.pid))
            .style(Style::default().fg(Color::Cyan)),
    ])
    .style(style)
}

/// Detail figures read as zero until enrichment has visited the row
fn detail_cell(bytes: u64) -> String {
    if bytes == 0 {
        "-".to_string()
    } else {
        bytes_human(bytes)
    }
}

fn render_key_bar(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let view = app.coordinator.view();

    let line = if view.search_mode {
        Line::from(vec![
            Span::styled(" / ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(format!(" {}", view.filter)),
            Span::styled("█", Style::default().fg(Color::Cyan)),
            Span::styled(
                "   Enter: keep  Esc: clear",
                Style::default().fg(Color::DarkGray),
            ),
        ])
    } else {
        let keys = [
            ("↑↓", "move"),
            ("→←", "expand/collapse"),
            ("f", "freeze"),
            ("s", "sort"),
            ("/", "search"),
            ("x", "export"),
            ("?", "help"),
            ("q", "quit"),
        ];
        let mut spans = Vec::with_capacity(keys.len() * 2 + 1);
        for (key, action) in keys {
            spans.push(Span::styled(
                format!(" {} ", key),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!("{} ", action),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.push(Span::styled(
            format!(" sort: {}", view.sort_key.label()),
            Style::default().fg(Color::White),
        ));
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_info_line(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let width = area.width as usize;

    let line = if let Some(message) = app.flash_message() {
        Line::from(Span::styled(
            format!(" {}", truncate_to_width(message, width.saturating_sub(1))),
            Style::default()
                .fg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        let hint = app.coordinator.view().sort_key.hint();
        let text = match app.coordinator.selected_breadcrumb() {
            Some(crumb) if !crumb.is_empty() => format!(" {}  │  {}", crumb, hint),
            _ => format!(" {}", hint),
        };
        Line::from(Span::styled(
            truncate_to_width(&text, width),
            Style::default().fg(Color::DarkGray),
        ))
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_text = r#"
    ramtree - Help

    Keyboard Shortcuts:
    ─────────────────────────────────────
    ↑↓ / j k      Move selection
    PgUp PgDn     Move one page
    Home End      First / last row
    → / l         Expand process
    ← / h         Collapse (or jump to parent)
    *             Expand everything
    f             Freeze / resume refresh
    r             Refresh now
    s             Cycle sort (RSS VIRT DIRTY SWAP AGE)
    /             Search by name or command
    x             Export visible rows to JSON
    q             Quit

    Press any key to close this help
    "#;

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);
    frame.render_widget(paragraph, popup_area);
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
