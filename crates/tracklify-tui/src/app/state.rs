use ratatui::widgets::ListState;
use tokio::sync::mpsc;

use chrono::{DateTime, Utc};
use tracklify_types::{ConnectionState, DeviceInfo, FilterCriteria, LogRecord, Severity, TimeRange};

use super::Action;

/// Screen enumeration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    DeviceSelect,
    LiveFeed,
}

/// A render-ready view of the feed, assembled outside the UI layer
#[derive(Default)]
pub struct FeedSnapshot {
    /// Filtered records, newest first
    pub records: Vec<LogRecord>,
    /// Ids of records still inside the highlight window
    pub fresh_ids: Vec<String>,
    pub connection: ConnectionState,
    pub using_sample_data: bool,
    pub last_error: Option<String>,
    /// Unfiltered window occupancy
    pub window_len: usize,
    pub capacity: usize,
    /// Unresolved anomaly count for the status line
    pub unresolved_anomalies: usize,
}

impl FeedSnapshot {
    pub fn is_fresh(&self, id: &str) -> bool {
        self.fresh_ids.iter().any(|f| f == id)
    }
}

/// UI-specific transient state
pub struct UiState {
    /// Is search/filter bar active?
    pub search_active: bool,

    /// Current search input text
    pub search_input: String,

    /// Applied search term (empty = no text filter)
    pub applied_search: String,

    /// Severity filter (None = all severities)
    pub severity_filter: Option<Severity>,

    /// Selected time range
    pub time_range: TimeRange,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// List state for the device selection screen
    pub list_state: ListState,

    /// Error message to display (if any)
    pub error_message: Option<String>,

    /// Transient notice, e.g. export result
    pub notice: Option<String>,

    /// Scroll offset from the newest record
    pub scroll: usize,

    /// Follow mode keeps the view pinned to the newest record
    pub follow: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            search_active: false,
            search_input: String::new(),
            applied_search: String::new(),
            severity_filter: None,
            time_range: TimeRange::default(),
            help_visible: false,
            list_state: ListState::default(),
            error_message: None,
            notice: None,
            scroll: 0,
            follow: true,
        }
    }
}

/// Global application state
pub struct AppState {
    /// Current screen being displayed
    pub current_screen: Screen,

    /// Navigation stack for back navigation
    pub screen_stack: Vec<Screen>,

    /// Known devices for the selection screen
    pub devices: Vec<DeviceInfo>,

    /// Selected device filter (None = all devices)
    pub selected_device: Option<String>,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,

    /// Channel sender for async actions
    pub action_tx: mpsc::UnboundedSender<Action>,

    /// Dirty flag for rendering, only render when true
    pub render_dirty: bool,

    /// Row count of the last rendered feed view, for scroll clamping
    pub last_row_count: usize,
}

impl AppState {
    pub fn new(action_tx: mpsc::UnboundedSender<Action>) -> Self {
        let mut ui_state = UiState::default();
        ui_state.list_state.select(Some(0));

        Self {
            current_screen: Screen::DeviceSelect,
            screen_stack: Vec::new(),
            devices: Vec::new(),
            selected_device: None,
            ui_state,
            should_quit: false,
            action_tx,
            render_dirty: true,
            last_row_count: 0,
        }
    }

    /// Navigate to a new screen, pushing current to stack
    pub fn navigate_to(&mut self, screen: Screen) {
        self.screen_stack.push(self.current_screen.clone());
        self.current_screen = screen;
        self.ui_state.list_state.select(Some(0));
        self.render_dirty = true;
    }

    /// Go back to previous screen
    pub fn go_back(&mut self) -> bool {
        if let Some(prev_screen) = self.screen_stack.pop() {
            self.current_screen = prev_screen;
            self.ui_state.list_state.select(Some(0));
            self.render_dirty = true;
            true
        } else {
            false
        }
    }

    /// The filter to apply to the feed at `now`
    pub fn criteria(&self, now: DateTime<Utc>) -> FilterCriteria {
        FilterCriteria {
            search_term: self.ui_state.applied_search.clone(),
            device_id: self.selected_device.clone(),
            severity: self.ui_state.severity_filter,
            since: self.ui_state.time_range.since(now),
            until: None,
        }
    }

    /// Entries shown on the device selection screen. Index 0 is the
    /// "all devices" pseudo-entry.
    pub fn device_list_len(&self) -> usize {
        self.devices.len() + 1
    }

    /// Move selection up
    pub fn list_up(&mut self) {
        let len = self.device_list_len();
        let i = match self.ui_state.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.ui_state.list_state.select(Some(i));
        self.render_dirty = true;
    }

    /// Move selection down
    pub fn list_down(&mut self) {
        let len = self.device_list_len();
        let i = match self.ui_state.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.ui_state.list_state.select(Some(i));
        self.render_dirty = true;
    }

    /// Resolve the current list selection to a device filter
    pub fn select_current_device(&mut self) {
        let selected = match self.ui_state.list_state.selected() {
            Some(0) | None => None,
            Some(i) => self.devices.get(i - 1).map(|d| d.device_id.clone()),
        };
        self.selected_device = selected;
        self.navigate_to(Screen::LiveFeed);
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        self.ui_state.error_message = Some(msg);
        self.render_dirty = true;
    }

    /// Dismiss the error message
    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
        self.render_dirty = true;
    }

    pub fn show_notice(&mut self, msg: String) {
        self.ui_state.notice = Some(msg);
        self.render_dirty = true;
    }

    /// Start search input mode, editing the applied term
    pub fn start_search(&mut self) {
        self.ui_state.search_active = true;
        self.ui_state.search_input = self.ui_state.applied_search.clone();
        self.render_dirty = true;
    }

    /// Cancel search input without changing the applied filter
    pub fn cancel_search(&mut self) {
        self.ui_state.search_active = false;
        self.ui_state.search_input.clear();
        self.render_dirty = true;
    }

    /// Apply the current search input as the active term
    pub fn apply_filter(&mut self) {
        self.ui_state.search_active = false;
        self.ui_state.applied_search = self.ui_state.search_input.trim().to_string();
        self.ui_state.scroll = 0;
        self.render_dirty = true;
    }

    /// Clear the applied search term
    pub fn clear_filter(&mut self) {
        self.ui_state.applied_search.clear();
        self.ui_state.search_input.clear();
        self.render_dirty = true;
    }

    /// Add a character to search input
    pub fn search_input_char(&mut self, c: char) {
        self.ui_state.search_input.push(c);
        self.render_dirty = true;
    }

    /// Remove last character from search input
    pub fn search_input_backspace(&mut self) {
        self.ui_state.search_input.pop();
        self.render_dirty = true;
    }

    /// Cycle the severity filter: all, info, warning, critical
    pub fn cycle_severity(&mut self) {
        self.ui_state.severity_filter = match self.ui_state.severity_filter {
            None => Some(Severity::Info),
            Some(Severity::Info) => Some(Severity::Warning),
            Some(Severity::Warning) => Some(Severity::Critical),
            Some(Severity::Critical) => None,
        };
        self.ui_state.scroll = 0;
        self.render_dirty = true;
    }

    pub fn cycle_time_range(&mut self) {
        self.ui_state.time_range = self.ui_state.time_range.next();
        self.ui_state.scroll = 0;
        self.render_dirty = true;
    }

    pub fn cycle_time_range_back(&mut self) {
        self.ui_state.time_range = self.ui_state.time_range.prev();
        self.ui_state.scroll = 0;
        self.render_dirty = true;
    }

    /// Scroll towards older records. Leaves follow mode.
    pub fn scroll_down(&mut self, n: usize) {
        let max = self.last_row_count.saturating_sub(1);
        self.ui_state.scroll = (self.ui_state.scroll + n).min(max);
        self.ui_state.follow = false;
        self.render_dirty = true;
    }

    /// Scroll towards newer records
    pub fn scroll_up(&mut self, n: usize) {
        self.ui_state.scroll = self.ui_state.scroll.saturating_sub(n);
        if self.ui_state.scroll == 0 {
            self.ui_state.follow = true;
        }
        self.render_dirty = true;
    }

    /// Jump to the newest record and resume following
    pub fn scroll_to_top(&mut self) {
        self.ui_state.scroll = 0;
        self.ui_state.follow = true;
        self.render_dirty = true;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.ui_state.scroll = self.last_row_count.saturating_sub(1);
        self.ui_state.follow = false;
        self.render_dirty = true;
    }

    pub fn toggle_follow(&mut self) {
        self.ui_state.follow = !self.ui_state.follow;
        if self.ui_state.follow {
            self.ui_state.scroll = 0;
        }
        self.render_dirty = true;
    }
}
