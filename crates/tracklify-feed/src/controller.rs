use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;

use tracklify_types::{ConnectionState, FilterCriteria, LogRecord};

use crate::error::FeedError;
use crate::export::to_csv;
use crate::filter::matches;
use crate::sample::sample_records;
use crate::service::{BulkQuery, FeedEvent, FeedService, FeedSubscription, SubscriptionStatus, parse_payload};
use crate::severity::{ContentHeuristic, SeverityPolicy};
use crate::window::{DEFAULT_CAPACITY, FeedWindow};

/// Options for [`LiveFeedController::initialize`].
///
/// `device_id` and `since` are applied server-side to the initial bulk fetch
/// only; live inserts are filtered client-side via `query`.
#[derive(Clone, Debug)]
pub struct FeedOptions {
    pub capacity: usize,
    pub device_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            device_id: None,
            since: None,
        }
    }
}

/// Owns the bounded window of recent records and the live-subscription
/// lifecycle for one principal.
///
/// All mutation happens on the caller's event loop: feed deliveries are
/// funneled through [`handle_event`](Self::handle_event), so no locking is
/// needed and `query` never observes a half-applied insert. After
/// [`dispose`](Self::dispose) every mutation path is a no-op.
pub struct LiveFeedController<F: FeedService> {
    feed: F,
    collection: String,
    options: FeedOptions,
    window: FeedWindow,
    connection: ConnectionState,
    using_sample_data: bool,
    last_error: Option<String>,
    subscription: Option<FeedSubscription>,
    policy: Box<dyn SeverityPolicy + Send>,
    principal: Option<String>,
    disposed: bool,
}

impl<F: FeedService> LiveFeedController<F> {
    pub fn new(feed: F, collection: impl Into<String>, options: FeedOptions) -> Self {
        let window = FeedWindow::new(options.capacity);
        Self {
            feed,
            collection: collection.into(),
            options,
            window,
            connection: ConnectionState::Connecting,
            using_sample_data: false,
            last_error: None,
            subscription: None,
            policy: Box::new(ContentHeuristic::default()),
            principal: None,
            disposed: false,
        }
    }

    /// Swap the severity policy (defaults to the content heuristic)
    pub fn with_policy(mut self, policy: Box<dyn SeverityPolicy + Send>) -> Self {
        self.policy = policy;
        self
    }

    /// Load the initial window and open the live subscription for the given
    /// principal. With no principal, the controller stays idle (not yet
    /// authenticated). Re-initializing tears down any prior subscription
    /// first, so a principal change never double-delivers into the window.
    ///
    /// A missing backing collection is recovered locally by loading the fixed
    /// sample dataset; any other read failure leaves the window empty and is
    /// returned to the caller.
    pub async fn initialize(
        &mut self,
        principal: Option<String>,
        events: UnboundedSender<FeedEvent>,
    ) -> Result<(), FeedError> {
        if self.disposed {
            tracing::warn!("initialize called on a disposed feed controller");
            return Ok(());
        }

        if let Some(mut prior) = self.subscription.take() {
            prior.unsubscribe();
        }
        self.using_sample_data = false;
        self.last_error = None;
        self.connection = ConnectionState::Connecting;

        let Some(principal) = principal else {
            self.principal = None;
            return Ok(());
        };
        self.principal = Some(principal.clone());

        let query = BulkQuery {
            principal_id: Some(principal.clone()),
            device_id: self.options.device_id.clone(),
            since: self.options.since,
            until: None,
            limit: self.window.capacity(),
        };

        match self.feed.bulk_read(&self.collection, &query).await {
            Ok(mut records) => {
                for record in &mut records {
                    if record.severity.is_none() {
                        record.severity = Some(self.policy.classify(record));
                    }
                }
                self.window.replace(records);
            }
            Err(FeedError::CollectionNotFound { collection }) => {
                tracing::info!(%collection, "collection missing, falling back to sample data");
                self.window.replace(sample_records(Utc::now()));
                self.using_sample_data = true;
                self.connection = ConnectionState::Disconnected;
                return Ok(());
            }
            Err(e) => {
                self.connection = ConnectionState::Error;
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        }

        match self
            .feed
            .subscribe_inserts(&self.collection, Some(&principal), events)
        {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(e) => {
                self.connection = ConnectionState::Error;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Apply one feed delivery. Events are processed in delivery order; no
    /// timestamp re-sorting is performed. Called from the owning event loop.
    pub fn handle_event(&mut self, event: FeedEvent, now: Instant) {
        if self.disposed {
            return;
        }

        match event {
            FeedEvent::Insert(payload) => match parse_payload(&payload) {
                Ok(mut record) => {
                    if record.severity.is_none() {
                        record.severity = Some(self.policy.classify(&record));
                    }
                    if !self.window.insert(record, now) {
                        tracing::debug!("duplicate record delivery ignored");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed record");
                }
            },
            FeedEvent::Status(SubscriptionStatus::Subscribed) => {
                self.connection = ConnectionState::Live;
            }
            FeedEvent::Status(SubscriptionStatus::Error(message)) => {
                // Window retained: transport failure loses no data already held
                tracing::warn!(%message, "live subscription error");
                self.connection = ConnectionState::Error;
                self.last_error = Some(message);
            }
            FeedEvent::Status(SubscriptionStatus::Closed) => {
                self.connection = ConnectionState::Disconnected;
            }
        }
    }

    /// The subsequence of the window matching the criteria, newest-first.
    /// Always a fresh derived sequence; never aliases the window.
    pub fn query(&self, criteria: &FilterCriteria) -> Vec<LogRecord> {
        self.window
            .records()
            .filter(|r| matches(r, criteria))
            .cloned()
            .collect()
    }

    /// CSV of the currently-filtered view, so exports reflect what the user
    /// sees rather than the raw window.
    pub fn export_csv(&self, criteria: &FilterCriteria) -> Result<String, FeedError> {
        to_csv(&self.query(criteria))
    }

    /// Release the subscription and freeze the window. Idempotent; after this
    /// call no in-flight or future callback can mutate state.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.connection = ConnectionState::Disconnected;
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn using_sample_data(&self) -> bool {
        self.using_sample_data
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn is_fresh(&self, id: &str, now: Instant) -> bool {
        self.window.is_fresh(id, now)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }
}

impl<F: FeedService> Drop for LiveFeedController<F> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    /// Scripted feed service for controller tests
    #[derive(Clone)]
    struct StubFeed {
        read: Arc<dyn Fn() -> Result<Vec<LogRecord>, FeedError> + Send + Sync>,
        subscriptions: Arc<AtomicUsize>,
    }

    impl StubFeed {
        fn with_read(
            read: impl Fn() -> Result<Vec<LogRecord>, FeedError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                read: Arc::new(read),
                subscriptions: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl FeedService for StubFeed {
        async fn bulk_read(
            &self,
            _collection: &str,
            _query: &BulkQuery,
        ) -> Result<Vec<LogRecord>, FeedError> {
            (self.read)()
        }

        fn subscribe_inserts(
            &self,
            _collection: &str,
            _principal: Option<&str>,
            events: UnboundedSender<FeedEvent>,
        ) -> Result<FeedSubscription, FeedError> {
            self.subscriptions.fetch_add(1, Ordering::SeqCst);
            let _ = events.send(FeedEvent::Status(SubscriptionStatus::Subscribed));
            let cancel = CancellationToken::new();
            let guard = cancel.clone();
            let task = tokio::spawn(async move { guard.cancelled().await });
            Ok(FeedSubscription::new(cancel, task))
        }
    }

    fn insert_payload(id: &str) -> FeedEvent {
        FeedEvent::Insert(json!({
            "id": id,
            "device_id": "dev-1",
            "content": format!("content {id}"),
            "created_at": "2026-08-01T12:00:00Z",
        }))
    }

    fn window_ids<F: FeedService>(controller: &LiveFeedController<F>) -> Vec<String> {
        controller
            .query(&FilterCriteria::default())
            .into_iter()
            .map(|r| r.id)
            .collect()
    }

    #[tokio::test]
    async fn missing_collection_falls_back_to_sample_data() {
        let feed = StubFeed::with_read(|| {
            Err(FeedError::CollectionNotFound {
                collection: "keystroke_logs".to_string(),
            })
        });
        let mut controller =
            LiveFeedController::new(feed.clone(), "keystroke_logs", FeedOptions::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        controller
            .initialize(Some("user-1".to_string()), tx)
            .await
            .unwrap();

        assert!(controller.using_sample_data());
        assert!(!controller.is_empty());
        assert_eq!(controller.connection(), &ConnectionState::Disconnected);
        // No live subscription is opened for sample data
        assert_eq!(feed.subscriptions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn read_failure_is_surfaced_not_masked() {
        let feed = StubFeed::with_read(|| Err(FeedError::Read("permission denied".to_string())));
        let mut controller = LiveFeedController::new(feed, "keystroke_logs", FeedOptions::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = controller.initialize(Some("user-1".to_string()), tx).await;

        assert!(matches!(result, Err(FeedError::Read(_))));
        assert!(controller.is_empty());
        assert!(!controller.using_sample_data());
        assert_eq!(controller.connection(), &ConnectionState::Error);
        assert!(controller.last_error().unwrap().contains("permission denied"));
    }

    #[tokio::test]
    async fn no_principal_means_idle() {
        let feed = StubFeed::with_read(|| panic!("bulk read must not run without a principal"));
        let mut controller = LiveFeedController::new(feed.clone(), "keystroke_logs", FeedOptions::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        controller.initialize(None, tx).await.unwrap();

        assert!(controller.is_empty());
        assert_eq!(feed.subscriptions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn subscribed_status_goes_live_and_inserts_apply() {
        let feed = StubFeed::with_read(|| Ok(Vec::new()));
        let mut controller = LiveFeedController::new(feed, "keystroke_logs", FeedOptions::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        controller
            .initialize(Some("user-1".to_string()), tx)
            .await
            .unwrap();
        assert_eq!(controller.connection(), &ConnectionState::Connecting);

        let status = rx.recv().await.unwrap();
        controller.handle_event(status, Instant::now());
        assert_eq!(controller.connection(), &ConnectionState::Live);

        controller.handle_event(insert_payload("a"), Instant::now());
        controller.handle_event(insert_payload("b"), Instant::now());
        assert_eq!(window_ids(&controller), ["b", "a"]);
        assert!(controller.is_fresh("b", Instant::now()));
    }

    #[tokio::test]
    async fn duplicate_delivery_is_idempotent() {
        let feed = StubFeed::with_read(|| Ok(Vec::new()));
        let mut controller = LiveFeedController::new(feed, "keystroke_logs", FeedOptions::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        controller
            .initialize(Some("user-1".to_string()), tx)
            .await
            .unwrap();

        controller.handle_event(insert_payload("a"), Instant::now());
        let before = window_ids(&controller);
        controller.handle_event(insert_payload("a"), Instant::now());
        assert_eq!(window_ids(&controller), before);
    }

    #[tokio::test]
    async fn malformed_records_are_dropped() {
        let feed = StubFeed::with_read(|| Ok(Vec::new()));
        let mut controller = LiveFeedController::new(feed, "keystroke_logs", FeedOptions::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        controller
            .initialize(Some("user-1".to_string()), tx)
            .await
            .unwrap();

        controller.handle_event(
            FeedEvent::Insert(json!({ "device_id": "dev-1", "content": "no id" })),
            Instant::now(),
        );
        assert!(controller.is_empty());
    }

    #[tokio::test]
    async fn dispose_stops_all_mutation() {
        let feed = StubFeed::with_read(|| Ok(Vec::new()));
        let mut controller = LiveFeedController::new(feed, "keystroke_logs", FeedOptions::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        controller
            .initialize(Some("user-1".to_string()), tx)
            .await
            .unwrap();
        controller.handle_event(insert_payload("a"), Instant::now());

        controller.dispose();
        controller.dispose(); // idempotent

        let before = window_ids(&controller);
        controller.handle_event(insert_payload("b"), Instant::now());
        assert_eq!(window_ids(&controller), before);
        assert_eq!(controller.connection(), &ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn reinitialize_tears_down_prior_subscription() {
        let feed = StubFeed::with_read(|| Ok(Vec::new()));
        let mut controller = LiveFeedController::new(feed.clone(), "keystroke_logs", FeedOptions::default());

        let (tx1, _rx1) = mpsc::unbounded_channel();
        controller
            .initialize(Some("user-1".to_string()), tx1)
            .await
            .unwrap();

        let (tx2, _rx2) = mpsc::unbounded_channel();
        controller
            .initialize(Some("user-2".to_string()), tx2)
            .await
            .unwrap();

        // Two subscriptions were opened, but only one is retained
        assert_eq!(feed.subscriptions.load(Ordering::SeqCst), 2);
        assert_eq!(controller.principal(), Some("user-2"));
    }

    #[tokio::test]
    async fn subscription_error_keeps_window_contents() {
        let feed = StubFeed::with_read(|| Ok(Vec::new()));
        let mut controller = LiveFeedController::new(feed, "keystroke_logs", FeedOptions::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        controller
            .initialize(Some("user-1".to_string()), tx)
            .await
            .unwrap();
        controller.handle_event(insert_payload("a"), Instant::now());

        controller.handle_event(
            FeedEvent::Status(SubscriptionStatus::Error("stream dropped".to_string())),
            Instant::now(),
        );

        assert_eq!(controller.connection(), &ConnectionState::Error);
        assert_eq!(window_ids(&controller), ["a"]);
        assert_eq!(controller.last_error(), Some("stream dropped"));
    }

    #[tokio::test]
    async fn bulk_read_records_get_classified() {
        let feed = StubFeed::with_read(|| {
            Ok(vec![LogRecord::new(
                "r1",
                "dev-1",
                "my password is hunter2",
                Utc::now(),
            )])
        });
        let mut controller = LiveFeedController::new(feed, "keystroke_logs", FeedOptions::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        controller
            .initialize(Some("user-1".to_string()), tx)
            .await
            .unwrap();

        let records = controller.query(&FilterCriteria::default());
        assert_eq!(
            records[0].severity,
            Some(tracklify_types::Severity::Critical)
        );
    }
}
