use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use tracklify_types::LogRecord;

use crate::error::FeedError;

/// Server-side query for the initial bulk fetch.
///
/// Results are expected newest-first, truncated to `limit`.
#[derive(Clone, Debug, Default)]
pub struct BulkQuery {
    pub principal_id: Option<String>,
    pub device_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: usize,
}

/// Lifecycle updates delivered alongside inserts on a subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Subscription acknowledged by the feed service
    Subscribed,
    /// Subscription rejected or dropped mid-stream
    Error(String),
    /// Subscription ended normally
    Closed,
}

/// A single delivery from the feed service.
///
/// Inserts arrive as raw JSON payloads; the controller parses and validates
/// them so malformed records can be dropped rather than half-constructed.
#[derive(Clone, Debug)]
pub enum FeedEvent {
    Insert(Value),
    Status(SubscriptionStatus),
}

/// Abstract change-feed/storage service the controller consumes.
///
/// Implementations deliver events for a named collection through the sender
/// handed to `subscribe_inserts`, in a single ordered stream per subscription.
#[allow(async_fn_in_trait)]
pub trait FeedService {
    /// One bulk read of the most recent records matching the query,
    /// newest-first.
    async fn bulk_read(
        &self,
        collection: &str,
        query: &BulkQuery,
    ) -> Result<Vec<LogRecord>, FeedError>;

    /// Open a live subscription for insert notifications, scoped to the
    /// principal when one is given. Implementations must send
    /// `Status(Subscribed)` once the subscription is acknowledged.
    fn subscribe_inserts(
        &self,
        collection: &str,
        principal: Option<&str>,
        events: UnboundedSender<FeedEvent>,
    ) -> Result<FeedSubscription, FeedError>;
}

/// Handle for a live subscription.
///
/// Acquired on initialize and released unconditionally on teardown; dropping
/// the handle also cancels, so a leaked subscription cannot keep delivering
/// to a detached consumer.
#[derive(Debug)]
pub struct FeedSubscription {
    cancel: CancellationToken,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl FeedSubscription {
    pub fn new(cancel: CancellationToken, task: tokio::task::JoinHandle<()>) -> Self {
        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Stop delivery. Safe to call multiple times.
    pub fn unsubscribe(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Parse an insert payload into a [`LogRecord`].
///
/// A payload missing `id` or `created_at` (or carrying an empty id) is
/// rejected; callers drop such records instead of inserting synthesized
/// defaults that would corrupt ordering or dedup.
pub fn parse_payload(payload: &Value) -> Result<LogRecord, FeedError> {
    let record: LogRecord = serde_json::from_value(payload.clone())
        .map_err(|e| FeedError::MalformedRecord(e.to_string()))?;
    if record.id.is_empty() {
        return Err(FeedError::MalformedRecord("empty record id".to_string()));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_valid_payload() {
        let payload = json!({
            "id": "r1",
            "device_id": "dev-1",
            "content": "hello",
            "created_at": "2026-08-01T12:00:00Z",
        });
        let record = parse_payload(&payload).unwrap();
        assert_eq!(record.id, "r1");
        assert_eq!(record.device_id, "dev-1");
        assert!(record.severity.is_none());
    }

    #[test]
    fn parse_rejects_missing_id() {
        let payload = json!({
            "device_id": "dev-1",
            "content": "hello",
            "created_at": "2026-08-01T12:00:00Z",
        });
        assert!(matches!(
            parse_payload(&payload),
            Err(FeedError::MalformedRecord(_))
        ));
    }

    #[test]
    fn parse_rejects_empty_id_and_bad_timestamp() {
        let empty_id = json!({
            "id": "",
            "device_id": "dev-1",
            "content": "hello",
            "created_at": "2026-08-01T12:00:00Z",
        });
        assert!(parse_payload(&empty_id).is_err());

        let bad_ts = json!({
            "id": "r1",
            "device_id": "dev-1",
            "content": "hello",
            "created_at": "yesterday",
        });
        assert!(parse_payload(&bad_ts).is_err());
    }

    #[tokio::test]
    async fn unsubscribe_deactivates_and_is_idempotent() {
        let cancel = CancellationToken::new();
        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move { cancel.cancelled().await }
        });
        let mut sub = FeedSubscription::new(cancel, task);
        assert!(sub.is_active());

        sub.unsubscribe();
        assert!(!sub.is_active());

        // calling again must be a no-op
        sub.unsubscribe();
        assert!(!sub.is_active());
    }
}
