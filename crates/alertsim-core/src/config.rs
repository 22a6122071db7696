use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors raised by eager configuration validation, before any task starts.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("message_count must be positive")]
    ZeroMessageCount,

    #[error("sender_count must be positive")]
    ZeroSenderCount,

    #[error("failure_rate must be in [0.0, 1.0), got {0}")]
    FailureRateOutOfRange(f64),

    #[error("monitor_interval_secs must be positive")]
    ZeroMonitorInterval,

    #[error("sender id cannot be blank")]
    BlankSenderId,
}

/// Parameters for one simulation run. Constant once the run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Total number of messages the producer generates.
    pub message_count: u64,
    /// Number of concurrent sender workers.
    pub sender_count: usize,
    /// Probability that a delivery attempt is marked failed.
    pub failure_rate: f64,
    /// Mean simulated delivery latency per message, in milliseconds.
    pub mean_delay_ms: u64,
    /// Interval between progress reports, in seconds.
    pub monitor_interval_secs: u64,
    /// Pause between message generations, in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub producer_pacing_ms: u64,
    /// Deterministic seed for reproducible runs; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_pacing_ms() -> u64 {
    10
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            message_count: 1000,
            sender_count: 10,
            failure_rate: 0.1,
            mean_delay_ms: 100,
            monitor_interval_secs: 1,
            producer_pacing_ms: default_pacing_ms(),
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SimConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Reject invalid parameters before the simulation is constructed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message_count == 0 {
            return Err(ConfigError::ZeroMessageCount);
        }
        if self.sender_count == 0 {
            return Err(ConfigError::ZeroSenderCount);
        }
        // The comparison is written so that NaN also lands in the error arm.
        if !(self.failure_rate >= 0.0 && self.failure_rate < 1.0) {
            return Err(ConfigError::FailureRateOutOfRange(self.failure_rate));
        }
        if self.monitor_interval_secs == 0 {
            return Err(ConfigError::ZeroMonitorInterval);
        }
        Ok(())
    }

    pub fn mean_delay(&self) -> Duration {
        Duration::from_millis(self.mean_delay_ms)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    pub fn producer_pacing(&self) -> Duration {
        Duration::from_millis(self.producer_pacing_ms)
    }

    /// Queue capacity: a small multiple of the worker count, so the producer
    /// cannot outrun slow senders by more than a bounded amount.
    pub fn queue_capacity(&self) -> usize {
        self.sender_count * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_message_count_rejected() {
        let config = SimConfig {
            message_count: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMessageCount));
    }

    #[test]
    fn test_zero_sender_count_rejected() {
        let config = SimConfig {
            sender_count: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSenderCount));
    }

    #[test]
    fn test_failure_rate_bounds() {
        for rate in [-0.1, 1.0, 1.5, f64::NAN] {
            let config = SimConfig {
                failure_rate: rate,
                ..Default::default()
            };
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::FailureRateOutOfRange(_))
                ),
                "failure_rate {rate} should be rejected"
            );
        }

        // Zero is a legal rate; it just means nothing ever fails.
        let config = SimConfig {
            failure_rate: 0.0,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_monitor_interval_rejected() {
        let config = SimConfig {
            monitor_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMonitorInterval));
    }

    #[test]
    fn test_queue_capacity_tracks_sender_count() {
        let config = SimConfig {
            sender_count: 7,
            ..Default::default()
        };
        assert_eq!(config.queue_capacity(), 14);
    }

    #[test]
    fn test_config_serde() {
        let config_str = r#"
message_count = 500
sender_count = 4
failure_rate = 0.25
mean_delay_ms = 50
monitor_interval_secs = 2
seed = 42
        "#;

        let config: SimConfig = toml::from_str(config_str).unwrap();
        assert_eq!(config.message_count, 500);
        assert_eq!(config.sender_count, 4);
        assert_eq!(config.failure_rate, 0.25);
        assert_eq!(config.mean_delay_ms, 50);
        assert_eq!(config.monitor_interval_secs, 2);
        assert_eq!(config.producer_pacing_ms, 10);
        assert_eq!(config.seed, Some(42));
        config.validate().unwrap();
    }
}
