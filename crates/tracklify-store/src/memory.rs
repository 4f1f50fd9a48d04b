use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use tracklify_feed::{
    BulkQuery, FeedError, FeedEvent, FeedService, FeedSubscription, SubscriptionStatus,
};
use tracklify_types::LogRecord;

const INSERT_CHANNEL_CAPACITY: usize = 256;

struct Collection {
    records: Vec<LogRecord>,
    inserts: broadcast::Sender<serde_json::Value>,
}

impl Collection {
    fn new() -> Self {
        let (inserts, _) = broadcast::channel(INSERT_CHANNEL_CAPACITY);
        Self {
            records: Vec::new(),
            inserts,
        }
    }
}

/// In-process change-feed/storage service.
///
/// Collections must be provisioned before use; reads and subscriptions
/// against an unprovisioned collection fail with `CollectionNotFound`, which
/// is how the dashboard's "table does not exist yet" state is modeled.
/// Inserts are fanned out as JSON payloads over a broadcast channel, one
/// ordered stream per subscriber.
#[derive(Clone, Default)]
pub struct MemoryFeed {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the collection if it does not exist yet
    pub fn provision(&self, collection: &str) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_insert_with(Collection::new);
    }

    pub fn is_provisioned(&self, collection: &str) -> bool {
        self.collections.read().contains_key(collection)
    }

    /// Append a record and notify live subscribers.
    ///
    /// Delivery is at-least-once from the consumer's point of view;
    /// subscribers are expected to dedup by record id.
    pub fn publish(&self, collection: &str, record: LogRecord) -> Result<(), FeedError> {
        let mut collections = self.collections.write();
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| FeedError::CollectionNotFound {
                collection: collection.to_string(),
            })?;

        let payload = serde_json::to_value(&record)
            .map_err(|e| FeedError::Subscription(e.to_string()))?;
        col.records.push(record);
        // No live subscribers is fine
        let _ = col.inserts.send(payload);
        Ok(())
    }

    pub fn stored_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.records.len())
            .unwrap_or(0)
    }
}

impl FeedService for MemoryFeed {
    async fn bulk_read(
        &self,
        collection: &str,
        query: &BulkQuery,
    ) -> Result<Vec<LogRecord>, FeedError> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| FeedError::CollectionNotFound {
                collection: collection.to_string(),
            })?;

        let mut records: Vec<LogRecord> = col
            .records
            .iter()
            .filter(|r| match query.principal_id.as_deref() {
                Some(principal) => r.user_id.as_deref().is_none_or(|owner| owner == principal),
                None => true,
            })
            .filter(|r| match query.device_id.as_deref() {
                Some(device) => r.device_id == device,
                None => true,
            })
            .filter(|r| query.since.is_none_or(|since| r.created_at >= since))
            .filter(|r| query.until.is_none_or(|until| r.created_at <= until))
            .cloned()
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if query.limit > 0 {
            records.truncate(query.limit);
        }
        Ok(records)
    }

    fn subscribe_inserts(
        &self,
        collection: &str,
        principal: Option<&str>,
        events: UnboundedSender<FeedEvent>,
    ) -> Result<FeedSubscription, FeedError> {
        let mut inserts = {
            let collections = self.collections.read();
            let col = collections
                .get(collection)
                .ok_or_else(|| FeedError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;
            col.inserts.subscribe()
        };

        let principal = principal.map(str::to_string);
        let cancel = CancellationToken::new();
        let guard = cancel.clone();

        let task = tokio::spawn(async move {
            let _ = events.send(FeedEvent::Status(SubscriptionStatus::Subscribed));

            loop {
                tokio::select! {
                    _ = guard.cancelled() => break,

                    delivery = inserts.recv() => match delivery {
                        Ok(payload) => {
                            if let Some(principal) = &principal {
                                let owner = payload.get("user_id").and_then(|v| v.as_str());
                                if owner.is_some_and(|o| o != principal) {
                                    continue;
                                }
                            }
                            if events.send(FeedEvent::Insert(payload)).is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "feed subscriber lagged, inserts dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            let _ = events.send(FeedEvent::Status(SubscriptionStatus::Closed));
                            break;
                        }
                    }
                }
            }
        });

        Ok(FeedSubscription::new(cancel, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tokio::sync::mpsc;

    const COLLECTION: &str = "keystroke_logs";

    fn record(id: &str, minutes_ago: i64) -> LogRecord {
        LogRecord::new(
            id,
            "dev-1",
            format!("content {id}"),
            Utc::now() - Duration::minutes(minutes_ago),
        )
        .with_user("user-1")
    }

    #[tokio::test]
    async fn unprovisioned_collection_is_not_found() {
        let feed = MemoryFeed::new();
        let result = feed.bulk_read(COLLECTION, &BulkQuery::default()).await;
        assert!(matches!(result, Err(FeedError::CollectionNotFound { .. })));

        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(matches!(
            feed.subscribe_inserts(COLLECTION, None, tx),
            Err(FeedError::CollectionNotFound { .. })
        ));

        assert!(matches!(
            feed.publish(COLLECTION, record("a", 0)),
            Err(FeedError::CollectionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn bulk_read_is_newest_first_with_limit() {
        let feed = MemoryFeed::new();
        feed.provision(COLLECTION);
        feed.publish(COLLECTION, record("old", 30)).unwrap();
        feed.publish(COLLECTION, record("new", 1)).unwrap();
        feed.publish(COLLECTION, record("mid", 10)).unwrap();

        let query = BulkQuery {
            limit: 2,
            ..Default::default()
        };
        let records = feed.bulk_read(COLLECTION, &query).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["new", "mid"]);
    }

    #[tokio::test]
    async fn bulk_read_applies_filters() {
        let feed = MemoryFeed::new();
        feed.provision(COLLECTION);
        feed.publish(COLLECTION, record("mine", 1)).unwrap();

        let mut other = record("other", 1);
        other.user_id = Some("user-2".to_string());
        other.device_id = "dev-9".to_string();
        feed.publish(COLLECTION, other).unwrap();

        let query = BulkQuery {
            principal_id: Some("user-1".to_string()),
            ..Default::default()
        };
        let records = feed.bulk_read(COLLECTION, &query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "mine");

        let query = BulkQuery {
            device_id: Some("dev-9".to_string()),
            ..Default::default()
        };
        let records = feed.bulk_read(COLLECTION, &query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "other");

        let query = BulkQuery {
            since: Some(Utc::now() - Duration::minutes(5)),
            ..Default::default()
        };
        let records = feed.bulk_read(COLLECTION, &query).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn subscription_delivers_status_then_inserts() {
        let feed = MemoryFeed::new();
        feed.provision(COLLECTION);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = feed.subscribe_inserts(COLLECTION, None, tx).unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(FeedEvent::Status(SubscriptionStatus::Subscribed))
        ));

        feed.publish(COLLECTION, record("a", 0)).unwrap();
        match rx.recv().await {
            Some(FeedEvent::Insert(payload)) => {
                assert_eq!(payload.get("id").and_then(|v| v.as_str()), Some("a"));
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscription_is_principal_scoped() {
        let feed = MemoryFeed::new();
        feed.provision(COLLECTION);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = feed
            .subscribe_inserts(COLLECTION, Some("user-1"), tx)
            .unwrap();
        let _ = rx.recv().await; // Subscribed

        let mut foreign = record("foreign", 0);
        foreign.user_id = Some("user-2".to_string());
        feed.publish(COLLECTION, foreign).unwrap();
        feed.publish(COLLECTION, record("mine", 0)).unwrap();

        // Only the principal's record comes through
        match rx.recv().await {
            Some(FeedEvent::Insert(payload)) => {
                assert_eq!(payload.get("id").and_then(|v| v.as_str()), Some("mine"));
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_stops_delivery() {
        let feed = MemoryFeed::new();
        feed.provision(COLLECTION);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut subscription = feed.subscribe_inserts(COLLECTION, None, tx).unwrap();
        let _ = rx.recv().await; // Subscribed

        subscription.unsubscribe();
        subscription.unsubscribe();

        feed.publish(COLLECTION, record("late", 0)).unwrap();
        // The forwarding task is gone, so the channel drains to None
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
