//! Shared types for tracklify
//!
//! This crate contains data structures used across multiple tracklify crates.

use chrono::{DateTime, Duration, Utc};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Sentinel device selector that matches every device.
pub const ALL_DEVICES: &str = "all";

// ============================================================================
// Log Records
// ============================================================================

/// Derived severity classification for a log record.
///
/// Severity is never authoritative: it is assigned by a pluggable policy on
/// ingest and exists purely to help triage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Parse severity from common spellings
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "inf" | "information" => Some(Self::Info),
            "warning" | "warn" | "wrn" => Some(Self::Warning),
            "critical" | "crit" | "fatal" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Lowercase display string (matches the serialized form)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Get display color for this severity
    pub fn color(&self) -> Color {
        match self {
            Self::Info => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Critical => Color::Red,
        }
    }
}

/// A single captured input/activity event from a monitored endpoint.
///
/// `id` is assigned by the originating collector and is the dedup key;
/// `created_at` is server-assigned. Both are immutable once created. The
/// wire form is a JSON object with these snake_case keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Collector-assigned unique identifier
    pub id: String,

    /// Originating endpoint
    pub device_id: String,

    /// Owning principal, if known
    #[serde(default)]
    pub user_id: Option<String>,

    /// Captured keystroke/text payload (free text, any byte sequence)
    pub content: String,

    /// Foreground application, if reported
    #[serde(default)]
    pub application: Option<String>,

    /// Foreground window title, if reported
    #[serde(default)]
    pub window_title: Option<String>,

    /// Capture timestamp (server-assigned)
    pub created_at: DateTime<Utc>,

    /// Derived classification, absent until a policy assigns one
    #[serde(default)]
    pub severity: Option<Severity>,
}

impl LogRecord {
    /// Create a record with the required fields only
    pub fn new(
        id: impl Into<String>,
        device_id: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            device_id: device_id.into(),
            user_id: None,
            content: content.into(),
            application: None,
            window_title: None,
            created_at,
            severity: None,
        }
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    pub fn with_window_title(mut self, window_title: impl Into<String>) -> Self {
        self.window_title = Some(window_title.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

// ============================================================================
// Feed State
// ============================================================================

/// Health of the live subscription owned by a feed controller.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Subscription requested, no confirmation yet
    #[default]
    Connecting,
    /// Subscription acknowledged, inserts are being delivered
    Live,
    /// Subscription closed normally; terminal for this controller instance
    Disconnected,
    /// Subscription rejected or dropped mid-stream
    Error,
}

impl ConnectionState {
    /// Short display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Live => "LIVE",
            Self::Disconnected => "offline",
            Self::Error => "error",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Connecting => Color::Yellow,
            Self::Live => Color::Green,
            Self::Disconnected => Color::DarkGray,
            Self::Error => Color::Red,
        }
    }
}

// ============================================================================
// Filtering
// ============================================================================

/// Time range preset for the feed view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimeRange {
    /// Last hour
    #[default]
    LastHour,
    /// Last 24 hours
    Last24h,
    /// Last 7 days
    Last7d,
    /// Last 30 days
    Last30d,
    /// No lower bound
    All,
}

impl TimeRange {
    /// Inclusive lower bound relative to `now`, or `None` for all history
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::LastHour => Some(now - Duration::hours(1)),
            Self::Last24h => Some(now - Duration::hours(24)),
            Self::Last7d => Some(now - Duration::days(7)),
            Self::Last30d => Some(now - Duration::days(30)),
            Self::All => None,
        }
    }

    /// Get display label for this time range
    pub fn label(&self) -> &'static str {
        match self {
            Self::LastHour => "1h",
            Self::Last24h => "24h",
            Self::Last7d => "7d",
            Self::Last30d => "30d",
            Self::All => "All",
        }
    }

    /// Cycle to the next time range
    pub fn next(&self) -> Self {
        match self {
            Self::LastHour => Self::Last24h,
            Self::Last24h => Self::Last7d,
            Self::Last7d => Self::Last30d,
            Self::Last30d => Self::All,
            Self::All => Self::LastHour,
        }
    }

    /// Cycle to the previous time range
    pub fn prev(&self) -> Self {
        match self {
            Self::LastHour => Self::All,
            Self::Last24h => Self::LastHour,
            Self::Last7d => Self::Last24h,
            Self::Last30d => Self::Last7d,
            Self::All => Self::Last30d,
        }
    }
}

/// Criteria applied when narrowing the feed window for display.
///
/// Built fresh by the UI per interaction and passed to the filter evaluator;
/// absent criteria are vacuously true.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against content, application,
    /// window title and device id. Empty = no text filter.
    pub search_term: String,

    /// Exact device selector; `None` or [`ALL_DEVICES`] matches everything
    pub device_id: Option<String>,

    /// Exact severity selector
    pub severity: Option<Severity>,

    /// Inclusive lower bound on `created_at`
    pub since: Option<DateTime<Utc>>,

    /// Inclusive upper bound on `created_at`
    pub until: Option<DateTime<Utc>>,
}

impl FilterCriteria {
    /// The device filter actually in effect, with the "all" sentinel and
    /// empty strings collapsed to no filter
    pub fn active_device(&self) -> Option<&str> {
        match self.device_id.as_deref() {
            None | Some(ALL_DEVICES) | Some("") => None,
            Some(d) => Some(d),
        }
    }
}

// ============================================================================
// Devices & Agents
// ============================================================================

/// Liveness of a monitoring agent, derived from how recently it reported
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentState {
    Online,
    Idle,
    Offline,
}

impl AgentState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::Offline => "offline",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Online => Color::Green,
            Self::Idle => Color::Yellow,
            Self::Offline => Color::DarkGray,
        }
    }
}

/// A monitored endpoint known to the dashboard
#[derive(Clone, Debug)]
pub struct DeviceInfo {
    pub device_id: String,
    pub hostname: Option<String>,
    pub platform: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub state: AgentState,
}

impl DeviceInfo {
    pub fn new(device_id: impl Into<String>, last_seen: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.into(),
            hostname: None,
            platform: None,
            last_seen,
            state: AgentState::Online,
        }
    }
}

// ============================================================================
// Anomalies
// ============================================================================

/// A flagged event surfaced in the anomaly list
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub device_id: String,
    /// Short machine-readable category, e.g. "secret_content"
    pub kind: String,
    pub description: String,
    pub detected_at: DateTime<Utc>,
    pub resolved: bool,
}
