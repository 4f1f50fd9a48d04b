//! Agent traffic simulator
//!
//! Generates plausible keystroke records into a [`MemoryFeed`] collection on
//! an interval, standing in for real capture agents during development and
//! demos.

use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracklify_types::LogRecord;
use uuid::Uuid;

use crate::MemoryFeed;

const APPLICATIONS: &[(&str, &str)] = &[
    ("Chrome", "Gmail - Inbox"),
    ("Slack", "#engineering"),
    ("VS Code", "main.rs - tracklify"),
    ("Terminal", "bash"),
    ("Outlook", "Quarterly Report - Message"),
    ("Excel", "budget_2026.xlsx"),
];

const PHRASES: &[&str] = &[
    "meeting notes for tomorrow",
    "git push origin main",
    "thanks, looks good to me",
    "cargo test -p tracklify-feed",
    "can you review this when you get a chance",
    "quarterly numbers are attached to the previous email, let me know",
    "deploy is scheduled for friday afternoon, ping ops before starting",
];

const SENSITIVE_PHRASES: &[&str] = &[
    "my password is hunter2",
    "the api secret is sk-test-9f2a",
];

/// How the simulator generates traffic
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Device ids to emit records for
    pub devices: Vec<String>,
    /// Owner attached to every generated record, if any
    pub principal: Option<String>,
    /// Delay between records
    pub interval: Duration,
    /// Chance in percent that a record carries sensitive content
    pub sensitive_percent: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            devices: vec![
                "WS-JDOE-01".to_string(),
                "WS-ASMITH-02".to_string(),
                "LT-MJONES-03".to_string(),
            ],
            principal: None,
            interval: Duration::from_millis(1500),
            sensitive_percent: 10,
        }
    }
}

/// A running simulator task. Dropping the handle stops it.
pub struct AgentSimulator {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AgentSimulator {
    /// Spawn a background task publishing records into `collection`
    pub fn spawn(feed: MemoryFeed, collection: &str, config: SimulatorConfig) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let collection = collection.to_string();
        let task = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut ticker = tokio::time::interval(config.interval.max(Duration::from_millis(10)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let record = generate(&mut rng, &config);
                        if let Err(err) = feed.publish(&collection, record) {
                            tracing::warn!(error = %err, "simulator publish failed, stopping");
                            break;
                        }
                    }
                }
            }
            tracing::debug!("simulator stopped");
        });
        Self {
            cancel,
            task: Some(task),
        }
    }

    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for AgentSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn generate(rng: &mut StdRng, config: &SimulatorConfig) -> LogRecord {
    let device = &config.devices[rng.gen_range(0..config.devices.len())];
    let (application, window) = APPLICATIONS[rng.gen_range(0..APPLICATIONS.len())];
    let content = if rng.gen_range(0..100) < config.sensitive_percent {
        SENSITIVE_PHRASES[rng.gen_range(0..SENSITIVE_PHRASES.len())]
    } else {
        PHRASES[rng.gen_range(0..PHRASES.len())]
    };

    let mut record = LogRecord::new(Uuid::new_v4().to_string(), device, content, Utc::now())
        .with_application(application)
        .with_window_title(window);
    if let Some(principal) = &config.principal {
        record = record.with_user(principal.clone());
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SimulatorConfig {
        SimulatorConfig {
            devices: vec!["sim-1".to_string()],
            principal: Some("user-1".to_string()),
            interval: Duration::from_millis(10),
            sensitive_percent: 0,
        }
    }

    #[tokio::test]
    async fn publishes_records_until_stopped() {
        let feed = MemoryFeed::new();
        feed.provision("keystroke_logs");

        let mut sim = AgentSimulator::spawn(feed.clone(), "keystroke_logs", fast_config());
        tokio::time::sleep(Duration::from_millis(100)).await;
        sim.stop();

        let count = feed.stored_count("keystroke_logs");
        assert!(count > 0, "expected generated records, got {count}");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(feed.stored_count("keystroke_logs"), count);
    }

    #[tokio::test]
    async fn stops_when_collection_is_missing() {
        let feed = MemoryFeed::new();
        let _sim = AgentSimulator::spawn(feed.clone(), "nope", fast_config());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(feed.stored_count("nope"), 0);
    }

    #[test]
    fn generated_records_carry_the_principal() {
        let mut rng = StdRng::seed_from_u64(7);
        let record = generate(&mut rng, &fast_config());
        assert_eq!(record.user_id.as_deref(), Some("user-1"));
        assert_eq!(record.device_id, "sim-1");
        assert!(!record.content.is_empty());
        assert!(record.application.is_some());
    }
}
