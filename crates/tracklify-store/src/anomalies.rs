//! Anomaly tracking
//!
//! Critical records (secret-bearing content and similar) are flagged as
//! anomalies so they survive past the bounded feed window and can be
//! reviewed and resolved independently.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracklify_types::{Anomaly, LogRecord, Severity};
use uuid::Uuid;

/// The anomaly kind assigned to flagged critical records
pub const KIND_CRITICAL_CONTENT: &str = "critical_content";

/// Build an anomaly from a critical record. Returns `None` for anything
/// below critical.
pub fn flag_record(record: &LogRecord) -> Option<Anomaly> {
    if record.severity != Some(Severity::Critical) {
        return None;
    }
    let source = record
        .application
        .as_deref()
        .unwrap_or("unknown application");
    Some(Anomaly {
        id: Uuid::new_v4().to_string(),
        user_id: record.user_id.clone(),
        device_id: record.device_id.clone(),
        kind: KIND_CRITICAL_CONTENT.to_string(),
        description: format!("critical keystroke activity in {source}"),
        detected_at: record.created_at,
        resolved: false,
    })
}

/// Shared in-memory anomaly store
#[derive(Clone, Default)]
pub struct AnomalyStore {
    anomalies: Arc<RwLock<Vec<Anomaly>>>,
}

impl AnomalyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, anomaly: Anomaly) {
        self.anomalies.write().push(anomaly);
    }

    /// Anomalies newest first, optionally including resolved ones
    pub fn list(&self, include_resolved: bool) -> Vec<Anomaly> {
        let mut out: Vec<Anomaly> = self
            .anomalies
            .read()
            .iter()
            .filter(|a| include_resolved || !a.resolved)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
        out
    }

    /// Mark an anomaly resolved. Returns false for unknown ids.
    pub fn resolve(&self, id: &str) -> bool {
        let mut anomalies = self.anomalies.write();
        match anomalies.iter_mut().find(|a| a.id == id) {
            Some(anomaly) => {
                anomaly.resolved = true;
                true
            }
            None => false,
        }
    }

    pub fn unresolved_count(&self) -> usize {
        self.anomalies.read().iter().filter(|a| !a.resolved).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn critical(id: &str, minutes_ago: i64) -> LogRecord {
        let mut record = LogRecord::new(id, "ws-1", "password hunter2", Utc::now())
            .with_application("Chrome");
        record.created_at = Utc::now() - Duration::minutes(minutes_ago);
        record.severity = Some(Severity::Critical);
        record
    }

    #[test]
    fn only_critical_records_are_flagged() {
        let mut record = critical("r1", 0);
        record.severity = Some(Severity::Warning);
        assert!(flag_record(&record).is_none());
        record.severity = None;
        assert!(flag_record(&record).is_none());

        let anomaly = flag_record(&critical("r2", 0)).unwrap();
        assert_eq!(anomaly.kind, KIND_CRITICAL_CONTENT);
        assert_eq!(anomaly.device_id, "ws-1");
        assert!(!anomaly.resolved);
    }

    #[test]
    fn list_is_newest_first_and_skips_resolved() {
        let store = AnomalyStore::new();
        let old = flag_record(&critical("r1", 10)).unwrap();
        let new = flag_record(&critical("r2", 1)).unwrap();
        let old_id = old.id.clone();
        store.record(old);
        store.record(new.clone());

        let listed = store.list(false);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, new.id);

        assert!(store.resolve(&old_id));
        assert_eq!(store.list(false).len(), 1);
        assert_eq!(store.list(true).len(), 2);
        assert_eq!(store.unresolved_count(), 1);
    }

    #[test]
    fn resolving_unknown_id_is_false() {
        let store = AnomalyStore::new();
        assert!(!store.resolve("nope"));
    }
}
