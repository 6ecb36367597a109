// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Buffer configuration.
//!
//! Capacity is a *soft* admission-control watermark, not a hard ceiling:
//! `push` and `wait_for_space` respect it, while `push_even_if_full` and the
//! batch push may drive the aggregate size above it. The default is a sizing
//! policy supplied at construction time, never a constant baked into the
//! buffer itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a spill buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Soft capacity watermark in bytes.
    #[serde(default = "default_capacity_bytes")]
    pub capacity_bytes: u64,

    /// Pause between retries of a transiently conflicting store operation.
    #[serde(default = "default_conflict_retry_delay")]
    #[serde(with = "duration_millis")]
    pub conflict_retry_delay: Duration,
}

fn default_capacity_bytes() -> u64 {
    256 * 1024 * 1024 // 256 MB
}

fn default_conflict_retry_delay() -> Duration {
    Duration::from_millis(1)
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: default_capacity_bytes(),
            conflict_retry_delay: default_conflict_retry_delay(),
        }
    }
}

impl BufferConfig {
    /// Creates a new buffer configuration builder.
    pub fn builder() -> BufferConfigBuilder {
        BufferConfigBuilder::default()
    }

    /// Creates a configuration for testing (small watermark, no retry pause).
    pub fn for_testing() -> Self {
        Self {
            capacity_bytes: 4 * 1024, // 4 KB
            conflict_retry_delay: Duration::ZERO,
        }
    }
}

/// Builder for BufferConfig.
#[derive(Debug, Default)]
pub struct BufferConfigBuilder {
    config: BufferConfig,
}

impl BufferConfigBuilder {
    /// Sets the soft capacity watermark in bytes.
    pub fn capacity_bytes(mut self, bytes: u64) -> Self {
        self.config.capacity_bytes = bytes;
        self
    }

    /// Sets the conflict retry pause.
    pub fn conflict_retry_delay(mut self, delay: Duration) -> Self {
        self.config.conflict_retry_delay = delay;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> BufferConfig {
        self.config
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BufferConfig::default();
        assert_eq!(config.capacity_bytes, 256 * 1024 * 1024);
        assert_eq!(config.conflict_retry_delay, Duration::from_millis(1));
    }

    #[test]
    fn test_builder() {
        let config = BufferConfig::builder()
            .capacity_bytes(1024)
            .conflict_retry_delay(Duration::from_millis(5))
            .build();

        assert_eq!(config.capacity_bytes, 1024);
        assert_eq!(config.conflict_retry_delay, Duration::from_millis(5));
    }

    #[test]
    fn test_testing_preset_is_small() {
        let config = BufferConfig::for_testing();
        assert!(config.capacity_bytes < BufferConfig::default().capacity_bytes);
        assert_eq!(config.conflict_retry_delay, Duration::ZERO);
    }
}
