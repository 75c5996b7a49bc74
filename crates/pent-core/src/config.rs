//! Loader configuration
//!
//! Defaults suit the cooperative single-task case. Environment overrides use
//! the `PENT_LOADER_*` variables.

use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Configuration for a context's [`PentLoader`](crate::PentLoader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Distinct identifiers a batch window accepts before it closes
    #[serde(
        default = "default_max_batch_size",
        deserialize_with = "deserialize_batch_size"
    )]
    pub max_batch_size: usize,

    /// Time-bounded window in milliseconds. `None` closes the window at the
    /// next scheduler yield instead.
    #[serde(default)]
    pub batch_delay_ms: Option<u64>,

    /// Keep resolved entries for the rest of the context
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
}

fn default_max_batch_size() -> usize {
    100
}

fn default_cache_enabled() -> bool {
    true
}

fn deserialize_batch_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    match usize::deserialize(deserializer)? {
        0 => {
            warn!("Invalid max_batch_size value: 0");
            Ok(default_max_batch_size())
        }
        size => Ok(size),
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            batch_delay_ms: None,
            cache_enabled: default_cache_enabled(),
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by `PENT_LOADER_MAX_BATCH_SIZE`,
    /// `PENT_LOADER_BATCH_DELAY_MS` and `PENT_LOADER_CACHE_ENABLED`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(max_batch_size) = lookup("PENT_LOADER_MAX_BATCH_SIZE") {
            match max_batch_size.parse::<usize>() {
                Ok(size) if size > 0 => config.max_batch_size = size,
                _ => warn!("Invalid PENT_LOADER_MAX_BATCH_SIZE value: {}", max_batch_size),
            }
        }

        if let Some(delay) = lookup("PENT_LOADER_BATCH_DELAY_MS") {
            if delay.to_lowercase() == "none" {
                config.batch_delay_ms = None;
            } else if let Ok(ms) = delay.parse::<u64>() {
                config.batch_delay_ms = Some(ms);
            } else {
                warn!("Invalid PENT_LOADER_BATCH_DELAY_MS value: {}", delay);
            }
        }

        if let Some(cache_enabled) = lookup("PENT_LOADER_CACHE_ENABLED") {
            match cache_enabled.to_lowercase().as_str() {
                "true" | "1" => config.cache_enabled = true,
                "false" | "0" => config.cache_enabled = false,
                _ => warn!("Invalid PENT_LOADER_CACHE_ENABLED value: {}", cache_enabled),
            }
        }

        config
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay_ms = Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Window size the loader enforces. Zero set on the field directly means
    /// the default.
    pub fn batch_limit(&self) -> usize {
        match self.max_batch_size {
            0 => default_max_batch_size(),
            size => size,
        }
    }

    pub fn batch_delay(&self) -> Option<Duration> {
        self.batch_delay_ms.map(Duration::from_millis)
    }
}
