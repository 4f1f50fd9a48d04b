use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use tracklify_types::AgentState;

use crate::{
    app::AppState,
    ui::{
        Layout, Theme,
        components::{ListSelector, ListSelectorExt, StatusBar, list_nav_hints},
    },
};

/// Device selection screen
pub struct DeviceSelectScreen;

impl DeviceSelectScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let area = frame.area();
        let (header_area, content_area, status_area) = Layout::main(area);

        Self::render_header(frame, header_area);
        Self::render_list(frame, content_area, state);
        Self::render_status_bar(frame, status_area, state);
    }

    fn render_header(frame: &mut Frame, area: Rect) {
        let title = Line::from(vec![
            Span::styled("tracklify", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled("Select Device", Theme::text()),
        ]);

        let header = Paragraph::new(title).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_list(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let list_area = Layout::centered_list(area, 80);

        let mut items: Vec<(String, bool)> = vec![("All devices".to_string(), false)];
        items.extend(state.devices.iter().map(|d| {
            let display = format!("{} ({})", d.device_id, d.state.label());
            (display, d.state == AgentState::Offline)
        }));

        let selector = ListSelector::new(" Devices ").items(items);

        frame.render_list_selector(list_area, selector, &mut state.ui_state.list_state);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let device_count = format!("{} devices", state.devices.len());

        let status = StatusBar::new().hints(list_nav_hints()).right(device_count);

        frame.render_widget(status, area);
    }
}
