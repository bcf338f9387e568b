//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::{Config, Transport};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

/// Test environment that sets up a haulboard home directory with a Config.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with a Config and a maps API key.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("haulboard");
        let key_path = temp_dir.path().join("maps_key.txt");
        std::fs::write(&key_path, "test-maps-key\n").unwrap();

        let config = Config::create(&root, "http://localhost:9/api/", Some(key_path.as_path()))
            .await
            .unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }
}

/// A `Transport` that points nowhere, for collaborators that never use the network.
pub fn transport() -> Transport {
    Transport::new(
        Url::parse("http://localhost:9/api/").unwrap(),
        Some("test-maps-key".to_string()),
        None,
        Duration::from_secs(5),
    )
    .unwrap()
}
