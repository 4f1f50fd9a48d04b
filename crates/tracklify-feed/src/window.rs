use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use tracklify_types::LogRecord;

/// Default window capacity (matches the dashboard page size)
pub const DEFAULT_CAPACITY: usize = 100;

/// How long a newly-arrived record stays marked as fresh (highlight only,
/// not part of the durable window)
pub const FRESH_TTL: Duration = Duration::from_millis(2500);

/// Bounded, deduplicated, newest-first window of recent log records.
///
/// Owned exclusively by the feed controller. Records are kept in delivery
/// order: a new insert lands at index 0 and the tail is evicted beyond
/// capacity. No re-sorting by timestamp is performed.
#[derive(Debug)]
pub struct FeedWindow {
    records: VecDeque<LogRecord>,
    ids: HashSet<String>,
    fresh: HashMap<String, Instant>,
    capacity: usize,
}

impl FeedWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
            fresh: HashMap::new(),
            capacity,
        }
    }

    /// Insert a newly-delivered record at the front, evicting from the tail
    /// beyond capacity. Duplicate ids are ignored (at-least-once delivery).
    /// Returns whether the record was actually inserted.
    pub fn insert(&mut self, record: LogRecord, now: Instant) -> bool {
        if self.ids.contains(&record.id) {
            return false;
        }

        self.ids.insert(record.id.clone());
        self.fresh.insert(record.id.clone(), now);
        self.records.push_front(record);

        while self.records.len() > self.capacity {
            if let Some(evicted) = self.records.pop_back() {
                self.ids.remove(&evicted.id);
                self.fresh.remove(&evicted.id);
            }
        }

        self.prune_fresh(now);
        true
    }

    /// Replace the window contents with a bulk-fetched set, given
    /// newest-first. Duplicate ids keep their first occurrence; the set is
    /// truncated to capacity. Fresh marks are cleared: bulk-loaded records
    /// are not "new".
    pub fn replace(&mut self, records: Vec<LogRecord>) {
        self.records.clear();
        self.ids.clear();
        self.fresh.clear();

        for record in records {
            if self.records.len() >= self.capacity {
                break;
            }
            if self.ids.insert(record.id.clone()) {
                self.records.push_back(record);
            }
        }
    }

    /// Iterate the window newest-first
    pub fn records(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }

    /// Whether the record arrived within the highlight TTL
    pub fn is_fresh(&self, id: &str, now: Instant) -> bool {
        self.fresh
            .get(id)
            .is_some_and(|at| now.duration_since(*at) < FRESH_TTL)
    }

    /// Drop expired fresh marks
    pub fn prune_fresh(&mut self, now: Instant) {
        self.fresh
            .retain(|_, at| now.duration_since(*at) < FRESH_TTL);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.ids.clear();
        self.fresh.clear();
    }
}
