//! Device registry
//!
//! Tracks the monitored devices the feed has seen and their liveness. A
//! device is observed every time a record arrives from it; liveness decays
//! to idle and then offline as observations age out.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracklify_types::{AgentState, DeviceInfo};

/// No records for this long and a device is considered idle
const IDLE_AFTER_SECS: i64 = 120;
/// No records for this long and a device is considered offline
const OFFLINE_AFTER_SECS: i64 = 600;

/// Shared registry of known devices
#[derive(Clone, Default)]
pub struct DeviceRegistry {
    devices: Arc<RwLock<HashMap<String, DeviceInfo>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a device produced activity at `now`
    pub fn observe(&self, device_id: &str, now: DateTime<Utc>) {
        let mut devices = self.devices.write();
        devices
            .entry(device_id.to_string())
            .and_modify(|d| {
                d.last_seen = now;
                d.state = AgentState::Online;
            })
            .or_insert_with(|| DeviceInfo::new(device_id, now));
    }

    /// Register or update device metadata reported by an agent
    pub fn register(&self, info: DeviceInfo) {
        self.devices.write().insert(info.device_id.clone(), info);
    }

    pub fn set_state(&self, device_id: &str, state: AgentState) {
        if let Some(device) = self.devices.write().get_mut(device_id) {
            device.state = state;
        }
    }

    pub fn remove(&self, device_id: &str) -> bool {
        self.devices.write().remove(device_id).is_some()
    }

    /// Decay liveness states based on how long ago each device was seen
    pub fn refresh_states(&self, now: DateTime<Utc>) {
        let mut devices = self.devices.write();
        for device in devices.values_mut() {
            let age = now - device.last_seen;
            device.state = if age >= Duration::seconds(OFFLINE_AFTER_SECS) {
                AgentState::Offline
            } else if age >= Duration::seconds(IDLE_AFTER_SECS) {
                AgentState::Idle
            } else {
                AgentState::Online
            };
        }
    }

    /// All known devices, sorted by id for stable display
    pub fn list(&self) -> Vec<DeviceInfo> {
        let mut devices: Vec<DeviceInfo> = self.devices.read().values().cloned().collect();
        devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        devices
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}
