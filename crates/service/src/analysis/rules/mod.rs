//! Rule catalog
//!
//! Rules are grouped by what they read:
//! - `cluster`: cluster-wide series (controller, partitions, topics, connections)
//! - `broker`: per-broker series, one rule per metric
//! - `composite`: rules combining two or more metrics (CPU total, throughput, churn)
//! - `configuration`: descriptor-only checks

pub mod broker;
pub mod cluster;
pub mod composite;
pub mod configuration;

pub use broker::{
	CreationRateRule, DiskUsageRule, HeapMemoryRule, ImbalanceRule, MemoryUtilizationRule,
	PartitionCapacityRule, UnderMinIsrRule, UnderReplicatedRule,
};
pub use cluster::{
	ConnectionCountRule, ControllerRule, GlobalPartitionRule, OfflinePartitionsRule,
	TopicCountRule,
};
pub use composite::{ConnectionChurnRule, CpuTotalRule, ThroughputRule};
pub use configuration::{
	AuthenticationRule, AvailabilityZoneRule, InstanceFamilyRule, LoggingRule,
	SoftwareVersionRule, StorageAutoScalingRule,
};

use mhc_types::SeriesStatistics;
use serde_json::{json, Value};

/// Statistics as an evidence value
pub(crate) fn statistics_evidence(stats: &SeriesStatistics) -> Value {
	json!({
		"min": stats.min,
		"max": stats.max,
		"avg": stats.mean,
		"p95": stats.p95,
		"p99": stats.p99,
	})
}

/// `part / whole` as a percentage; zero when `whole` is not positive
pub(crate) fn utilization_pct(part: f64, whole: f64) -> f64 {
	if whole > 0.0 {
		part / whole * 100.0
	} else {
		0.0
	}
}
