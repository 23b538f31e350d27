//! Low-activity floors below which imbalance checks are not meaningful

use serde::{Deserialize, Serialize};

use super::limits::{
	DEFAULT_MIN_CPU_PERCENT, DEFAULT_MIN_MESSAGES_PER_SEC, DEFAULT_MIN_NETWORK_MB_PER_SEC,
};

/// Overridable activity floors for imbalance suppression
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SuppressionThresholds {
	/// Average per-broker throughput (MB/s) under which byte-rate imbalance is ignored
	pub min_network_mb_per_sec: f64,
	/// Average per-broker message rate under which message imbalance is ignored
	pub min_messages_per_sec: f64,
	/// Cluster peak CPU percentage under which CPU imbalance is ignored
	pub min_cpu_percent: f64,
}

impl Default for SuppressionThresholds {
	fn default() -> Self {
		Self {
			min_network_mb_per_sec: DEFAULT_MIN_NETWORK_MB_PER_SEC,
			min_messages_per_sec: DEFAULT_MIN_MESSAGES_PER_SEC,
			min_cpu_percent: DEFAULT_MIN_CPU_PERCENT,
		}
	}
}
