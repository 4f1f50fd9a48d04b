//! Optional config file at `~/.tracklify/config.toml`
//!
//! Loaded leniently: a missing file yields defaults, a malformed file is
//! reported on stderr and otherwise ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed window capacity
    pub capacity: usize,
    /// Fresh-row highlight duration, informational for external consumers
    pub highlight_ms: u64,
    /// Content markers that force critical severity
    pub secret_markers: Vec<String>,
    /// Interval between simulated agent records
    pub simulate_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 100,
            highlight_ms: 2500,
            secret_markers: vec!["password".to_string(), "secret".to_string()],
            simulate_interval_ms: 1500,
        }
    }
}

impl Config {
    /// Load from the default location under the home directory
    pub fn load() -> Self {
        let Some(home) = dirs::home_dir() else {
            return Self::default();
        };
        Self::load_from(&home.join(".tracklify").join("config.toml"))
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml"));
        assert_eq!(config.capacity, 100);
        assert_eq!(config.highlight_ms, 2500);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "capacity = 50\nsecret_markers = [\"token\"]\n").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.capacity, 50);
        assert_eq!(config.secret_markers, vec!["token"]);
        assert_eq!(config.simulate_interval_ms, 1500);
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "capacity = \"not a number").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.capacity, 100);
    }
}
