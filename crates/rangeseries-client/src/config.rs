//! Client Configuration
//!
//! Every [`crate::RangeStoreClient`] owns one immutable `ClientConfig`. There is
//! no process-wide configuration: two clients in the same process can point at
//! different tables with different credentials.
//!
//! ## ClientConfig
//!
//! - **tableName**: table holding the events (required)
//! - **connectionOptions**: handed verbatim to the store connector
//!   (credentials, endpoint, region)
//! - **compress**: LZ4-compress payloads by default (default: false)
//! - **batch**: bulk write tuning, see [`BatchConfig`]
//!
//! ## Usage
//!
//! ```ignore
//! use rangeseries_client::ClientConfig;
//!
//! let config = ClientConfig::from_json_str(r#"{
//!     "tableName": "events",
//!     "connectionOptions": { "region": "eu-west-1" },
//!     "batch": { "maxRetries": 8 }
//! }"#)?;
//! ```

use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;
use crate::store::{ConnectionOptions, DEFAULT_MAX_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Table holding the events
    #[serde(default)]
    pub table_name: String,

    /// Options for the store connector, passed through untouched
    #[serde(default)]
    pub connection_options: ConnectionOptions,

    /// Compress payloads unless a call says otherwise (default: false)
    #[serde(default)]
    pub compress: bool,

    #[serde(default)]
    pub batch: BatchConfig,
}

impl ClientConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            connection_options: ConnectionOptions::new(),
            compress: false,
            batch: BatchConfig::default(),
        }
    }

    /// Parse a JSON document. Missing tunables take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ClientError::ConfigError(format!("invalid client config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(ClientError::ConfigError("tableName is required".to_string()));
        }
        self.batch.validate()
    }
}

/// Bulk write tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfig {
    /// Upper bound on records per batch request; the store's own limit also applies (default: 25)
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Resubmissions after the first attempt (default: 5)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// First backoff in milliseconds (default: 50)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds (default: 5000)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Growth factor between attempts (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Randomize each backoff by ±25% (default: true)
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
        }
    }
}

impl BatchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
            self.backoff_multiplier,
        )
    }

    fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(ClientError::ConfigError(
                "batch.maxBatchSize must be at least 1".to_string(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ClientError::ConfigError(format!(
                "batch.backoffMultiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ClientError::ConfigError(
                "batch.initialBackoffMs exceeds batch.maxBackoffMs".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

fn default_max_retries() -> usize {
    5
}

fn default_initial_backoff_ms() -> u64 {
    50
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("events");
        assert_eq!(config.table_name, "events");
        assert!(!config.compress);
        assert!(config.connection_options.is_empty());
        assert_eq!(config.batch.max_batch_size, 25);
        assert!(config.batch.jitter);
        assert_eq!(config.batch.retry_policy(), RetryPolicy::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = ClientConfig::from_json_str(
            r#"{
                "tableName": "events",
                "connectionOptions": { "region": "eu-west-1" },
                "compress": true,
                "batch": { "maxRetries": 8, "jitter": false }
            }"#,
        )
        .unwrap();

        assert_eq!(config.table_name, "events");
        assert_eq!(config.connection_options.get("region").map(String::as_str), Some("eu-west-1"));
        assert!(config.compress);
        assert_eq!(config.batch.max_retries, 8);
        assert!(!config.batch.jitter);
        assert_eq!(config.batch.max_batch_size, 25);
        assert_eq!(config.batch.initial_backoff_ms, 50);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = ClientConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ClientError::ConfigError(_)));
    }

    #[test]
    fn test_json_roundtrip_uses_camel_case() {
        let json = serde_json::to_value(ClientConfig::new("events")).unwrap();
        assert_eq!(json["tableName"], "events");
        assert_eq!(json["batch"]["maxBatchSize"], 25);
        assert_eq!(json["batch"]["backoffMultiplier"], 2.0);
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn test_missing_table_name() {
        let config = ClientConfig::from_json_str("{}").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tableName"));

        assert!(ClientConfig::new("   ").validate().is_err());
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = ClientConfig::new("events");
        config.batch.max_batch_size = 0;
        assert!(matches!(config.validate(), Err(ClientError::ConfigError(_))));
    }

    #[test]
    fn test_bad_backoff_settings() {
        let mut config = ClientConfig::new("events");
        config.batch.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::new("events");
        config.batch.initial_backoff_ms = 10_000;
        assert!(config.validate().is_err());
    }
}
