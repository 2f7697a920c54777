//! Configuration for nvstore
//!
//! Centralized configuration with sensible defaults.

/// Main configuration for a store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Layout Configuration
    // -------------------------------------------------------------------------
    /// Directory on the medium holding the rotation ring.
    /// Internal structure:
    ///   {dir}/
    ///     ├── persist0.bin
    ///     ├── persist1.bin     (at most two of the three exist at once)
    ///     └── persist2.bin
    pub dir: String,

    // -------------------------------------------------------------------------
    // Commit Scheduling
    // -------------------------------------------------------------------------
    /// Minimum milliseconds between commit attempts. Bounds media wear and
    /// I/O pressure; repeated failures are rate-limited by the same clock.
    pub min_commit_interval_ms: u64,

    /// Consecutive commit failures tolerated before pending writes are
    /// dropped to avoid retrying forever against a failed medium.
    pub max_commit_failures: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: "persist".to_string(),
            min_commit_interval_ms: 1000,
            max_commit_failures: 5,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the ring directory name on the medium
    pub fn dir(mut self, dir: impl Into<String>) -> Self {
        self.config.dir = dir.into();
        self
    }

    /// Set the minimum interval between commit attempts (in milliseconds)
    pub fn min_commit_interval_ms(mut self, ms: u64) -> Self {
        self.config.min_commit_interval_ms = ms;
        self
    }

    /// Set the consecutive-failure threshold
    pub fn max_commit_failures(mut self, count: u32) -> Self {
        self.config.max_commit_failures = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
