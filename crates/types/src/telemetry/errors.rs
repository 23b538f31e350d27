//! Error types for the external telemetry and descriptor collaborators

use thiserror::Error;

/// Failures returned by a telemetry source for one query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
	#[error("Request throttled: {0}")]
	Throttled(String),

	#[error("Telemetry service unavailable: {0}")]
	ServiceUnavailable(String),

	#[error("Query timed out after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("Network error: {0}")]
	Network(String),

	#[error("Invalid query for metric {metric_name}: {reason}")]
	InvalidQuery { metric_name: String, reason: String },

	#[error("Access denied: {0}")]
	AccessDenied(String),

	#[error("Malformed response: {0}")]
	MalformedResponse(String),

	#[error("Telemetry error: {0}")]
	Other(String),
}

impl TelemetryError {
	/// Whether the same query may succeed if attempted again
	pub fn is_transient(&self) -> bool {
		matches!(
			self,
			TelemetryError::Throttled(_)
				| TelemetryError::ServiceUnavailable(_)
				| TelemetryError::Timeout { .. }
				| TelemetryError::Network(_)
		)
	}
}

/// Failures while obtaining the cluster descriptor
#[derive(Error, Debug)]
pub enum DescriptorError {
	#[error("Serverless cluster {cluster} is not supported; only provisioned and express clusters can be analyzed")]
	UnsupportedServerless { cluster: String },

	#[error("Cluster not found: {cluster}")]
	NotFound { cluster: String },

	#[error("Descriptor is missing required field: {field}")]
	MissingField { field: String },

	#[error("Invalid descriptor: {reason}")]
	Invalid { reason: String },

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
pub type DescriptorResult<T> = Result<T, DescriptorError>;
