//! Application state for the web front-end
//!
//! Holds the configuration and the model registry. Both are built once at
//! start-up and only read afterwards.

use std::sync::Arc;
use std::time::Instant;

use brain_classifier::{AppConfig, ModelRegistry};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    /// One model slot per test type
    pub registry: ModelRegistry,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, registry: ModelRegistry) -> Self {
        Self {
            config,
            registry,
            started_at: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;
