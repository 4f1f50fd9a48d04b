use tracklify_types::{LogRecord, Severity};

/// Pluggable severity assignment.
///
/// The classification is a triage hint, not an authoritative judgement; the
/// exact rule is expected to change, so callers depend on the trait rather
/// than the default heuristic.
pub trait SeverityPolicy {
    fn classify(&self, record: &LogRecord) -> Severity;
}

/// Default content heuristic carried over from the dashboard: content that
/// mentions a secret-like marker is critical, unusually long bursts are
/// warnings, everything else is info.
#[derive(Clone, Debug)]
pub struct ContentHeuristic {
    markers: Vec<String>,
    long_content: usize,
}

impl ContentHeuristic {
    pub const DEFAULT_MARKERS: [&'static str; 2] = ["password", "secret"];
    const LONG_CONTENT: usize = 50;

    /// Build a heuristic with custom secret markers (matched
    /// case-insensitively as substrings)
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.into().to_lowercase())
                .collect(),
            long_content: Self::LONG_CONTENT,
        }
    }
}

impl Default for ContentHeuristic {
    fn default() -> Self {
        Self::with_markers(Self::DEFAULT_MARKERS)
    }
}

impl SeverityPolicy for ContentHeuristic {
    fn classify(&self, record: &LogRecord) -> Severity {
        let content = record.content.to_lowercase();
        if self.markers.iter().any(|m| content.contains(m)) {
            return Severity::Critical;
        }
        if record.content.chars().count() > self.long_content {
            return Severity::Warning;
        }
        Severity::Info
    }
}
