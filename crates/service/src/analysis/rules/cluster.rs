//! Rules over cluster-wide series

use super::{statistics_evidence, utilization_pct};
use crate::analysis::{Requirement, Rule, RuleContext};
use mhc_types::{names, Category, Finding, Severity};

const TOPIC_COUNT_THRESHOLD: f64 = 1_000.0;

/// Exactly one active controller over the whole window
#[derive(Debug, Default)]
pub struct ControllerRule;

impl Rule for ControllerRule {
	fn name(&self) -> &str {
		"controller_count"
	}

	fn requirement(&self) -> Requirement {
		Requirement::ClusterSeries(names::ACTIVE_CONTROLLER_COUNT)
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let Some(series) = ctx.cluster_series(names::ACTIVE_CONTROLLER_COUNT) else {
			return Vec::new();
		};
		let stats = series.statistics();

		let finding = if stats.min < 1.0 {
			Finding::new(
				names::ACTIVE_CONTROLLER_COUNT,
				Severity::Critical,
				Category::Reliability,
				"Active Controller Count Dropped Below 1",
				format!(
					"Active controller count dropped to {:.0} during the monitoring period. This indicates a cluster stability issue.",
					stats.min
				),
			)
			.with_current_value(stats.min)
		} else if stats.max > 1.0 {
			Finding::new(
				names::ACTIVE_CONTROLLER_COUNT,
				Severity::Warning,
				Category::Reliability,
				"Multiple Active Controllers Detected",
				format!(
					"Active controller count reached {:.0}. Expected exactly 1.",
					stats.max
				),
			)
			.with_current_value(stats.max)
		} else {
			Finding::new(
				names::ACTIVE_CONTROLLER_COUNT,
				Severity::Healthy,
				Category::Reliability,
				"Active Controller Count Normal",
				"Active controller count is healthy at 1 throughout the monitoring period.",
			)
			.with_current_value(stats.max)
		};

		vec![finding
			.with_threshold(1.0)
			.with_evidence("statistics", statistics_evidence(stats))]
	}
}

/// Latest total partition count against the cluster's recommended capacity
#[derive(Debug, Default)]
pub struct GlobalPartitionRule;

impl Rule for GlobalPartitionRule {
	fn name(&self) -> &str {
		"global_partition_count"
	}

	fn requirement(&self) -> Requirement {
		Requirement::ClusterSeries(names::GLOBAL_PARTITION_COUNT)
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let Some(series) = ctx.cluster_series(names::GLOBAL_PARTITION_COUNT) else {
			return Vec::new();
		};

		let limit_per_broker = ctx.partition_limit();
		let broker_count = ctx.descriptor.entity_count;
		let max_recommended = u64::from(limit_per_broker) * u64::from(broker_count);
		let current = series.last_value().max(0.0) as u64;
		let utilization = utilization_pct(current as f64, max_recommended as f64);

		let (severity, title, description) = if utilization > 100.0 {
			(
				Severity::Critical,
				"Partition Count Exceeded Capacity",
				format!(
					"Partition count ({}) exceeds cluster capacity ({}). Immediate action required.",
					current, max_recommended
				),
			)
		} else if utilization >= 90.0 {
			(
				Severity::Warning,
				"Partition Count Near Capacity",
				format!(
					"Partition count ({}) at {:.1}% of cluster capacity ({}). Plan capacity expansion.",
					current, utilization, max_recommended
				),
			)
		} else {
			(
				Severity::Healthy,
				"Partition Count OK",
				format!(
					"Partition count ({}) at {:.1}% of cluster capacity ({}). Within healthy range.",
					current, utilization, max_recommended
				),
			)
		};

		vec![Finding::new(
			names::GLOBAL_PARTITION_COUNT,
			severity,
			Category::Performance,
			title,
			description,
		)
		.with_current_value(current as f64)
		.with_threshold(max_recommended as f64)
		.with_evidence("current_partitions", current)
		.with_evidence("max_recommended", max_recommended)
		.with_evidence("limit_per_broker", limit_per_broker)
		.with_evidence("broker_count", broker_count)
		.with_evidence("instance_type", ctx.descriptor.instance_class.as_str())]
	}
}

#[derive(Debug, Default)]
pub struct TopicCountRule;

impl Rule for TopicCountRule {
	fn name(&self) -> &str {
		"topic_count"
	}

	fn requirement(&self) -> Requirement {
		Requirement::ClusterSeries(names::GLOBAL_TOPIC_COUNT)
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let Some(series) = ctx.cluster_series(names::GLOBAL_TOPIC_COUNT) else {
			return Vec::new();
		};
		let topics = series.statistics().mean.max(0.0) as u64;

		let finding = if topics as f64 > TOPIC_COUNT_THRESHOLD {
			Finding::new(
				names::GLOBAL_TOPIC_COUNT,
				Severity::Warning,
				Category::Performance,
				"High Topic Count",
				format!(
					"Cluster has {} topics. High topic counts can increase operational complexity.",
					topics
				),
			)
		} else {
			Finding::new(
				names::GLOBAL_TOPIC_COUNT,
				Severity::Healthy,
				Category::Performance,
				"Topic Count OK",
				format!("Cluster has {} topics, within recommended range.", topics),
			)
		};

		vec![finding
			.with_current_value(topics as f64)
			.with_threshold(TOPIC_COUNT_THRESHOLD)
			.with_evidence("current_topics", topics)]
	}
}

#[derive(Debug, Default)]
pub struct OfflinePartitionsRule;

impl Rule for OfflinePartitionsRule {
	fn name(&self) -> &str {
		"offline_partitions"
	}

	fn requirement(&self) -> Requirement {
		Requirement::ClusterSeries(names::OFFLINE_PARTITIONS_COUNT)
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let Some(series) = ctx.cluster_series(names::OFFLINE_PARTITIONS_COUNT) else {
			return Vec::new();
		};
		let stats = series.statistics();

		let finding = if stats.max > 0.0 {
			Finding::new(
				names::OFFLINE_PARTITIONS_COUNT,
				Severity::Critical,
				Category::Reliability,
				"Offline Partitions Detected",
				format!(
					"Detected up to {} offline partitions. This indicates data unavailability.",
					stats.max as u64
				),
			)
		} else {
			Finding::new(
				names::OFFLINE_PARTITIONS_COUNT,
				Severity::Healthy,
				Category::Reliability,
				"No Offline Partitions",
				"All partitions are online and available.",
			)
		};

		vec![finding
			.with_current_value(stats.max)
			.with_threshold(0.0)
			.with_evidence("statistics", statistics_evidence(stats))]
	}
}

/// Client connections against the cluster connection limit
///
/// Uses the cluster series when one exists, otherwise the sum of the
/// per-broker peaks.
#[derive(Debug, Default)]
pub struct ConnectionCountRule;

impl Rule for ConnectionCountRule {
	fn name(&self) -> &str {
		"connection_count"
	}

	fn requirement(&self) -> Requirement {
		Requirement::AnySeries(&[names::CLIENT_CONNECTION_COUNT])
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let max_connections = match ctx.cluster_series(names::CLIENT_CONNECTION_COUNT) {
			Some(series) => series.statistics().max,
			None => {
				let brokers = ctx.entity_series(names::CLIENT_CONNECTION_COUNT);
				if brokers.is_empty() {
					return Vec::new();
				}
				brokers.iter().map(|s| s.statistics().max).sum()
			},
		};

		let broker_count = ctx.descriptor.entity_count;
		let cluster_limit = u64::from(ctx.connection_limit()) * u64::from(broker_count);
		let utilization = utilization_pct(max_connections, cluster_limit as f64);
		let usage = format!(
			"Connection count at {:.1}% of cluster limit ({}/{}).",
			utilization, max_connections as u64, cluster_limit
		);

		let (severity, title, description) = if utilization >= 90.0 {
			(
				Severity::Critical,
				"Critical Connection Count",
				format!("{} Risk of connection exhaustion.", usage),
			)
		} else if utilization >= 80.0 {
			(
				Severity::Warning,
				"High Connection Count",
				format!("{} Consider connection pooling.", usage),
			)
		} else {
			(Severity::Healthy, "Connection Count Normal", usage)
		};

		vec![Finding::new(
			names::CLIENT_CONNECTION_COUNT,
			severity,
			Category::Performance,
			title,
			description,
		)
		.with_current_value(utilization)
		.with_threshold(80.0)
		.with_evidence("max_connections", max_connections)
		.with_evidence("cluster_limit", cluster_limit)
		.with_evidence("broker_count", broker_count)]
	}
}
