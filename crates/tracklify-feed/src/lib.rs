//! Live feed processing for tracklify
//!
//! This crate provides the feed window, the live-feed controller, filtering,
//! severity classification, and CSV export.

mod controller;
mod error;
mod export;
mod filter;
mod sample;
mod service;
mod severity;
mod window;

pub use controller::{FeedOptions, LiveFeedController};
pub use error::FeedError;
pub use export::{CSV_HEADER, to_csv};
pub use filter::matches;
pub use sample::sample_records;
pub use service::{
    BulkQuery, FeedEvent, FeedService, FeedSubscription, SubscriptionStatus, parse_payload,
};
pub use severity::{ContentHeuristic, SeverityPolicy};
pub use window::{DEFAULT_CAPACITY, FRESH_TTL, FeedWindow};

// Re-export types used in our public API
pub use tracklify_types::{ConnectionState, FilterCriteria, LogRecord, Severity};
