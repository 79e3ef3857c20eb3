//! Logging Module
//!
//! Structured logging on top of `tracing`. Both the CLI and the web server
//! initialise their subscriber through [`init_logging`], so `RUST_LOG`
//! overrides behave the same everywhere. Log lines go to stderr; stdout is
//! left to command output.

use std::time::Instant;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is not set
    pub level: LevelFilter,
    /// Show module paths
    pub include_target: bool,
    /// Show thread ids (the prefetch producer runs on its own thread)
    pub include_thread_ids: bool,
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            include_target: false,
            include_thread_ids: false,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    pub fn verbose() -> Self {
        Self {
            level: LevelFilter::DEBUG,
            include_target: true,
            include_thread_ids: true,
            ansi_colors: true,
        }
    }

    /// Errors only
    pub fn quiet() -> Self {
        Self {
            level: LevelFilter::ERROR,
            ..Self::default()
        }
    }

    /// Long-running server output: no colors, module paths on
    pub fn production() -> Self {
        Self {
            level: LevelFilter::INFO,
            include_target: true,
            include_thread_ids: false,
            ansi_colors: false,
        }
    }
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.level` when it is set.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_ansi(config.ansi_colors)
                .with_target(config.include_target)
                .with_thread_ids(config.include_thread_ids),
        )
        .with(filter)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}

/// Logs progress of a long file operation at every tenth of the way
pub struct ProgressLogger {
    label: String,
    total: usize,
    done: usize,
    step: usize,
    started: Instant,
}

impl ProgressLogger {
    pub fn new(label: impl Into<String>, total: usize) -> Self {
        Self {
            label: label.into(),
            total,
            done: 0,
            step: (total / 10).max(1),
            started: Instant::now(),
        }
    }

    pub fn tick(&mut self) {
        self.done += 1;
        if self.done % self.step == 0 || self.done == self.total {
            tracing::debug!("{}: {}/{}", self.label, self.done, self.total);
        }
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn finish(&self) {
        tracing::info!(
            "{}: {} of {} done in {:.2}s",
            self.label,
            self.done,
            self.total,
            self.started.elapsed().as_secs_f64()
        );
    }
}
