//! Configuration settings structures

use mhc_types::constants::limits::{
	DEFAULT_BASE_BACKOFF_MS, DEFAULT_DAYS_BACK, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_RETRIES,
	DEFAULT_PERIOD_SECONDS, DEFAULT_RECOMMENDED_VERSION, MAX_CONCURRENCY, MAX_RETRIES,
};
use mhc_types::metrics::DEFAULT_NAMESPACE;
use mhc_types::SuppressionThresholds;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
	pub collection: CollectionSettings,
	pub analysis: AnalysisSettings,
	pub source: SourceSettings,
	pub logging: LoggingSettings,
}

/// Telemetry retrieval configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CollectionSettings {
	/// Days of history to analyze
	pub days_back: u32,
	/// Sampling period requested per datapoint
	pub period_seconds: u32,
	/// Maximum queries in flight at once
	pub max_concurrency: usize,
	/// Attempts per query, including the first one
	pub max_retries: u32,
	/// Delay before the second attempt; doubles on each further attempt
	pub base_backoff_ms: u64,
	pub namespace: String,
}

impl Default for CollectionSettings {
	fn default() -> Self {
		Self {
			days_back: DEFAULT_DAYS_BACK,
			period_seconds: DEFAULT_PERIOD_SECONDS,
			max_concurrency: DEFAULT_MAX_CONCURRENCY,
			max_retries: DEFAULT_MAX_RETRIES,
			base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
			namespace: DEFAULT_NAMESPACE.to_string(),
		}
	}
}

/// Rule evaluation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisSettings {
	/// Broker software version clusters are compared against
	pub recommended_version: String,
	pub suppression: SuppressionThresholds,
}

impl Default for AnalysisSettings {
	fn default() -> Self {
		Self {
			recommended_version: DEFAULT_RECOMMENDED_VERSION.to_string(),
			suppression: SuppressionThresholds::default(),
		}
	}
}

/// Where telemetry and the cluster descriptor come from
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SourceSettings {
	/// JSON snapshot replayed instead of a live telemetry API
	pub snapshot_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
			structured: false,
		}
	}
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

/// Settings that load but cannot drive a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
	#[error("collection.days_back must be at least 1")]
	ZeroDayWindow,

	#[error("collection.period_seconds must be at least 1")]
	ZeroPeriod,

	#[error("collection.max_concurrency must be between 1 and {max}, got {value}")]
	InvalidConcurrency { value: usize, max: usize },

	#[error("collection.max_retries must be between 1 and {max}, got {value}")]
	InvalidRetries { value: u32, max: u32 },

	#[error("analysis.recommended_version must not be empty")]
	EmptyRecommendedVersion,

	#[error("analysis.suppression.{field} must be a non-negative number")]
	InvalidSuppression { field: &'static str },
}

impl Settings {
	/// Check the settings for values that would make a run meaningless
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		let collection = &self.collection;
		if collection.days_back == 0 {
			return Err(ConfigValidationError::ZeroDayWindow);
		}
		if collection.period_seconds == 0 {
			return Err(ConfigValidationError::ZeroPeriod);
		}
		if collection.max_concurrency == 0 || collection.max_concurrency > MAX_CONCURRENCY {
			return Err(ConfigValidationError::InvalidConcurrency {
				value: collection.max_concurrency,
				max: MAX_CONCURRENCY,
			});
		}
		if collection.max_retries == 0 || collection.max_retries > MAX_RETRIES {
			return Err(ConfigValidationError::InvalidRetries {
				value: collection.max_retries,
				max: MAX_RETRIES,
			});
		}
		if self.analysis.recommended_version.trim().is_empty() {
			return Err(ConfigValidationError::EmptyRecommendedVersion);
		}

		let suppression = &self.analysis.suppression;
		for (field, value) in [
			("min_network_mb_per_sec", suppression.min_network_mb_per_sec),
			("min_messages_per_sec", suppression.min_messages_per_sec),
			("min_cpu_percent", suppression.min_cpu_percent),
		] {
			if !value.is_finite() || value < 0.0 {
				return Err(ConfigValidationError::InvalidSuppression { field });
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_are_valid() {
		let settings = Settings::default();
		assert!(settings.validate().is_ok());
		assert_eq!(settings.collection.max_concurrency, 10);
		assert_eq!(settings.collection.max_retries, 3);
		assert_eq!(settings.collection.period_seconds, 3_600);
		assert_eq!(settings.analysis.recommended_version, "3.8");
		assert_eq!(settings.analysis.suppression.min_cpu_percent, 30.0);
	}

	#[test]
	fn test_zero_values_rejected() {
		let mut settings = Settings::default();
		settings.collection.max_concurrency = 0;
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::InvalidConcurrency { .. })
		));

		let mut settings = Settings::default();
		settings.collection.max_retries = 0;
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::InvalidRetries { .. })
		));

		let mut settings = Settings::default();
		settings.collection.days_back = 0;
		assert_eq!(settings.validate(), Err(ConfigValidationError::ZeroDayWindow));
	}

	#[test]
	fn test_negative_suppression_rejected() {
		let mut settings = Settings::default();
		settings.analysis.suppression.min_messages_per_sec = -1.0;
		assert_eq!(
			settings.validate(),
			Err(ConfigValidationError::InvalidSuppression {
				field: "min_messages_per_sec"
			})
		);
	}
}
