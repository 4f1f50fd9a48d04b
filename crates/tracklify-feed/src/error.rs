use thiserror::Error;

/// Errors surfaced by the feed layer.
///
/// `CollectionNotFound` is recoverable (the controller falls back to sample
/// data); everything else is reported to the caller.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The backing collection has not been provisioned yet
    #[error("collection '{collection}' does not exist")]
    CollectionNotFound { collection: String },

    /// Bulk read failed for a reason other than a missing collection
    #[error("bulk read failed: {0}")]
    Read(String),

    /// Live subscription rejected or dropped
    #[error("subscription failed: {0}")]
    Subscription(String),

    /// A delivered payload is missing a required field
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// CSV serialization failed
    #[error("csv export failed: {0}")]
    Export(String),
}
