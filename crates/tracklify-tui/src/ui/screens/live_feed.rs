use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout as RatatuiLayout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use tracklify_types::LogRecord;

use crate::{
    app::{AppState, FeedSnapshot},
    ui::{Theme, components::StatusBar},
};

const TIME_COL: usize = 8;
const DEVICE_COL: usize = 14;
const APP_COL: usize = 12;
const WINDOW_COL: usize = 20;
const SEVERITY_COL: usize = 8;

/// Live feed screen
pub struct LiveFeedScreen;

/// Pad or truncate to an exact display width, ellipsizing on overflow
fn fit(s: &str, width: usize) -> String {
    if s.width() <= width {
        let pad = width - s.width();
        return format!("{}{}", s, " ".repeat(pad));
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    let pad = width.saturating_sub(used + 1);
    format!("{}{}", out, " ".repeat(pad))
}

impl LiveFeedScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, snapshot: &FeedSnapshot) {
        let area = frame.area();

        let show_search_bar =
            state.ui_state.search_active || !state.ui_state.applied_search.is_empty();

        let mut constraints = vec![Constraint::Length(3)]; // Header
        if show_search_bar {
            constraints.push(Constraint::Length(3)); // Search bar
        }
        constraints.push(Constraint::Min(1)); // Feed
        constraints.push(Constraint::Length(1)); // Status bar

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut idx = 0;
        Self::render_header(frame, chunks[idx], state, snapshot);
        idx += 1;

        if show_search_bar {
            Self::render_search_bar(frame, chunks[idx], state);
            idx += 1;
        }

        Self::render_feed(frame, chunks[idx], state, snapshot);
        idx += 1;

        Self::render_status_bar(frame, chunks[idx], state, snapshot);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState, snapshot: &FeedSnapshot) {
        let device = state.selected_device.as_deref().unwrap_or("all devices");
        let severity = match state.ui_state.severity_filter {
            Some(s) => s.as_str(),
            None => "all",
        };

        let mut spans = vec![
            Span::styled("tracklify", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(device, Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                format!("⏱ {}", state.ui_state.time_range.label()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(format!("sev: {}", severity), Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                snapshot.connection.label(),
                Theme::connection(&snapshot.connection),
            ),
        ];

        if snapshot.using_sample_data {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled(
                "SAMPLE DATA",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        if let Some(err) = &snapshot.last_error {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled(format!("⚠ {}", err), Theme::error()));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_search_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut spans = vec![];

        if state.ui_state.search_active {
            spans.push(Span::styled(
                " /",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                state.ui_state.search_input.clone(),
                Theme::text_highlight(),
            ));
            spans.push(Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
            spans.push(Span::styled(
                "  [Enter] Apply  [Esc] Cancel",
                Theme::text_dim(),
            ));
        } else {
            spans.push(Span::styled(" Search: ", Theme::text_dim()));
            spans.push(Span::styled(
                state.ui_state.applied_search.clone(),
                Theme::text_highlight(),
            ));
            spans.push(Span::styled("  [n] Clear  [/] Edit", Theme::text_dim()));
        }

        let search_bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if state.ui_state.search_active {
                    Style::default().fg(Color::Yellow)
                } else {
                    Theme::border()
                })
                .title(Span::styled(" Search ", Theme::title())),
        );

        frame.render_widget(search_bar, area);
    }

    fn render_feed(frame: &mut Frame, area: Rect, state: &mut AppState, snapshot: &FeedSnapshot) {
        state.last_row_count = snapshot.records.len();

        // Inner height minus the column header row
        let visible = (area.height.saturating_sub(3)) as usize;
        let scroll = state.ui_state.scroll.min(snapshot.records.len().saturating_sub(1));

        let content_width = (area.width.saturating_sub(2)) as usize;
        let fixed = TIME_COL + DEVICE_COL + APP_COL + WINDOW_COL + SEVERITY_COL + 5;
        let keys_col = content_width.saturating_sub(fixed).max(10);

        let mut lines = Vec::with_capacity(visible + 1);
        lines.push(Line::from(Span::styled(
            format!(
                "{} {} {} {} {} {}",
                fit("Time", TIME_COL),
                fit("Device", DEVICE_COL),
                fit("Application", APP_COL),
                fit("Window", WINDOW_COL),
                fit("Keys", keys_col),
                fit("Sev", SEVERITY_COL),
            ),
            Theme::text_dim().add_modifier(Modifier::UNDERLINED),
        )));

        for record in snapshot.records.iter().skip(scroll).take(visible) {
            lines.push(Self::record_line(record, snapshot, keys_col));
        }

        if snapshot.records.is_empty() {
            let notice = if snapshot.window_len == 0 {
                "No keystroke activity yet"
            } else {
                "No records match the current filters"
            };
            lines.push(Line::from(Span::styled(format!("  {}", notice), Theme::text_dim())));
        }

        let title = if state.ui_state.follow {
            " Live Feed (following) "
        } else {
            " Live Feed "
        };

        let feed = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(title, Theme::title())),
        );

        frame.render_widget(feed, area);
    }

    fn record_line<'a>(record: &'a LogRecord, snapshot: &FeedSnapshot, keys_col: usize) -> Line<'a> {
        let time = record.created_at.format("%H:%M:%S").to_string();
        let application = record.application.as_deref().unwrap_or("-");
        let window = record.window_title.as_deref().unwrap_or("-");
        let severity = record.severity.map(|s| s.as_str()).unwrap_or("-");

        let row_style = if snapshot.is_fresh(&record.id) {
            Theme::fresh_row()
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::styled(format!("{} ", fit(&time, TIME_COL)), Theme::text_dim().patch(row_style)),
            Span::styled(
                format!("{} ", fit(&record.device_id, DEVICE_COL)),
                Theme::text().patch(row_style),
            ),
            Span::styled(
                format!("{} ", fit(application, APP_COL)),
                Theme::text().patch(row_style),
            ),
            Span::styled(
                format!("{} ", fit(window, WINDOW_COL)),
                Theme::text_dim().patch(row_style),
            ),
            Span::styled(
                format!("{} ", fit(&record.content, keys_col)),
                Theme::text().patch(row_style),
            ),
            Span::styled(
                fit(severity, SEVERITY_COL),
                Theme::severity(record.severity).patch(row_style),
            ),
        ])
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, snapshot: &FeedSnapshot) {
        let hints = vec![
            ("/", "Search"),
            ("r", "Range"),
            ("v", "Severity"),
            ("f", "Follow"),
            ("e", "Export"),
            ("?", "Help"),
        ];

        let right = if let Some(notice) = &state.ui_state.notice {
            notice.clone()
        } else {
            let mut right = format!(
                "{} shown │ window {}/{}",
                snapshot.records.len(),
                snapshot.window_len,
                snapshot.capacity,
            );
            if snapshot.unresolved_anomalies > 0 {
                right = format!("⚑ {} anomalies │ {}", snapshot.unresolved_anomalies, right);
            }
            right
        };

        let status = StatusBar::new().hints(hints).right(right);

        frame.render_widget(status, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_pads_short_strings() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcd", 4), "abcd");
    }

    #[test]
    fn fit_truncates_with_ellipsis() {
        let out = fit("abcdefgh", 5);
        assert_eq!(out.width(), 5);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn fit_respects_wide_characters() {
        // CJK characters are two columns wide
        let out = fit("日本語テスト", 7);
        assert_eq!(out.width(), 7);
    }
}
