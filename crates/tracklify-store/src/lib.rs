//! Storage and transport for tracklify
//!
//! This crate provides the in-process feed service, session persistence,
//! the device registry, the anomaly store, and the demo agent simulator.

mod anomalies;
mod memory;
mod registry;
mod session;
mod simulator;

pub use anomalies::{AnomalyStore, flag_record};
pub use memory::MemoryFeed;
pub use registry::DeviceRegistry;
pub use session::{Session, SessionStore};
pub use simulator::{AgentSimulator, SimulatorConfig};

// Re-export types used in our public API
pub use tracklify_types::{Anomaly, DeviceInfo, LogRecord};
