//! Cross-broker imbalance detection
//!
//! Every broker contributes one representative value for a metric: its latest
//! sample for gauge-style counters (leaders, partitions) and its window mean
//! otherwise. The largest relative deviation of a representative from the
//! cluster mean is compared against a metric-specific threshold. Low-activity
//! clusters are exempt, since a few messages per second spread unevenly says
//! nothing about balance.

use super::rules::utilization_pct;
use mhc_types::constants::limits::BYTES_PER_MB;
use mhc_types::{
	names, CapacityTable, Category, ClusterDescriptor, Finding, MetricSeries, Severity,
	SuppressionThresholds,
};

/// Deviation allowed for message rate, partition and leader counts
pub const STRICT_IMBALANCE_THRESHOLD: f64 = 10.0;
/// Deviation allowed for connection counts
pub const CONNECTION_IMBALANCE_THRESHOLD: f64 = 15.0;
/// Deviation allowed for every other metric
pub const DEFAULT_IMBALANCE_THRESHOLD: f64 = 20.0;

/// Cluster utilization under which a partition imbalance is fixed by moving
/// partitions rather than adding capacity
const REBALANCE_UTILIZATION_CEILING: f64 = 80.0;

/// Summary of one metric across brokers
#[derive(Debug, Clone, PartialEq)]
pub struct ImbalanceMeasurement {
	pub entity_count: usize,
	/// One value per broker, in entity order
	pub representatives: Vec<f64>,
	pub mean: f64,
	pub min: f64,
	pub max: f64,
	/// Largest `|v - mean| / mean` over brokers, as a percentage
	pub max_deviation: f64,
}

/// Whether brokers are represented by their latest sample instead of the mean
pub fn uses_latest_value(metric_name: &str) -> bool {
	matches!(metric_name, names::LEADER_COUNT | names::PARTITION_COUNT)
}

/// Deviation percentage above which a metric counts as imbalanced
pub fn imbalance_threshold(metric_name: &str) -> f64 {
	match metric_name {
		names::MESSAGES_IN_PER_SEC | names::PARTITION_COUNT | names::LEADER_COUNT => {
			STRICT_IMBALANCE_THRESHOLD
		},
		names::CONNECTION_COUNT => CONNECTION_IMBALANCE_THRESHOLD,
		_ => DEFAULT_IMBALANCE_THRESHOLD,
	}
}

impl ImbalanceMeasurement {
	/// Measure a metric over its per-broker series; `None` without series
	pub fn from_series(metric_name: &str, series: &[&MetricSeries]) -> Option<Self> {
		if series.is_empty() {
			return None;
		}

		let latest = uses_latest_value(metric_name);
		let representatives: Vec<f64> = series
			.iter()
			.map(|s| {
				if latest {
					s.last_value()
				} else {
					s.statistics().mean
				}
			})
			.collect();

		let mean = representatives.iter().sum::<f64>() / representatives.len() as f64;
		let (min, max) = if latest {
			(
				representatives.iter().copied().fold(f64::INFINITY, f64::min),
				representatives
					.iter()
					.copied()
					.fold(f64::NEG_INFINITY, f64::max),
			)
		} else {
			(
				series
					.iter()
					.map(|s| s.statistics().min)
					.fold(f64::INFINITY, f64::min),
				series
					.iter()
					.map(|s| s.statistics().max)
					.fold(f64::NEG_INFINITY, f64::max),
			)
		};

		let max_deviation = if mean > 0.0 {
			representatives
				.iter()
				.map(|v| (v - mean).abs() / mean * 100.0)
				.fold(0.0, f64::max)
		} else {
			0.0
		};

		Some(Self {
			entity_count: series.len(),
			representatives,
			mean,
			min,
			max,
			max_deviation,
		})
	}
}

/// Reusable imbalance check shared by the per-broker rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ImbalanceDetector {
	suppression: SuppressionThresholds,
}

impl ImbalanceDetector {
	pub fn new(suppression: SuppressionThresholds) -> Self {
		Self { suppression }
	}

	/// Whether activity is too low for a deviation to mean anything
	pub fn is_suppressed(&self, metric_name: &str, measurement: &ImbalanceMeasurement) -> bool {
		match metric_name {
			names::BYTES_IN_PER_SEC | names::BYTES_OUT_PER_SEC => {
				measurement.mean / BYTES_PER_MB < self.suppression.min_network_mb_per_sec
			},
			names::MESSAGES_IN_PER_SEC => measurement.mean < self.suppression.min_messages_per_sec,
			names::CPU_USER | names::CPU_SYSTEM | names::CPU_IDLE => {
				measurement.max < self.suppression.min_cpu_percent
			},
			_ => false,
		}
	}

	/// One warning when the metric is imbalanced, otherwise one healthy finding
	pub fn detect(
		&self,
		metric_name: &str,
		series: &[&MetricSeries],
		descriptor: &ClusterDescriptor,
		capacity: &CapacityTable,
	) -> Option<Finding> {
		let m = ImbalanceMeasurement::from_series(metric_name, series)?;
		let threshold = imbalance_threshold(metric_name);

		if m.max_deviation > threshold && !self.is_suppressed(metric_name, &m) {
			let description = imbalance_description(metric_name, &m, threshold, descriptor, capacity);
			return Some(
				Finding::new(
					metric_name,
					Severity::Warning,
					Category::Performance,
					format!("{} - Broker Imbalance Detected", metric_name),
					description,
				)
				.with_current_value(m.max_deviation)
				.with_threshold(threshold)
				.with_evidence("broker_count", m.entity_count)
				.with_evidence("deviation", m.max_deviation),
			);
		}

		Some(
			Finding::new(
				metric_name,
				Severity::Healthy,
				Category::Performance,
				format!("{} - Balanced Across Brokers", metric_name),
				format!(
					"Metric is balanced across {} brokers. Avg: {:.2}, min: {:.2}, max: {:.2}",
					m.entity_count, m.mean, m.min, m.max
				),
			)
			.with_current_value(m.mean)
			.with_evidence("broker_count", m.entity_count),
		)
	}
}

fn imbalance_description(
	metric_name: &str,
	m: &ImbalanceMeasurement,
	threshold: f64,
	descriptor: &ClusterDescriptor,
	capacity: &CapacityTable,
) -> String {
	match metric_name {
		names::PARTITION_COUNT => {
			let limit = capacity.partition_limit(&descriptor.instance_class);
			let total_capacity = f64::from(limit) * m.entity_count as f64;
			let total_partitions: f64 = m.representatives.iter().sum();
			let utilization = utilization_pct(total_partitions, total_capacity);

			let action = if utilization < REBALANCE_UTILIZATION_CEILING {
				let mut tools = String::from("Use Cruise Control or kafka-reassign-partitions tool");
				if descriptor.is_express() {
					tools.push_str(" or enable intelligent rebalancing");
				}
				format!(
					"Rebalance partitions across all {} brokers. Cluster has {:.1}% capacity utilization ({}/{} partitions). {}.",
					m.entity_count, utilization, total_partitions as u64, total_capacity as u64, tools
				)
			} else {
				format!(
					"Cluster capacity at {:.1}% ({}/{} partitions). Consider adding more brokers or upgrading instance type.",
					utilization, total_partitions as u64, total_capacity as u64
				)
			};

			format!(
				"Partition distribution imbalance detected ({:.1}% deviation exceeds {}% threshold). Cluster avg: {:.0}, min: {:.0}, max: {:.0}. {}",
				m.max_deviation, threshold, m.mean, m.min, m.max, action
			)
		},
		names::MESSAGES_IN_PER_SEC => {
			let action = if descriptor.intelligent_rebalancing_enabled {
				"Automatic rebalancing is enabled and will handle this."
			} else {
				"Consider rebalancing partitions using Cruise Control or manual reassignment."
			};
			format!(
				"Message distribution imbalance detected ({:.1}% deviation exceeds {}% threshold). Cluster avg: {:.0} msg/s, min: {:.0}, max: {:.0}. {}",
				m.max_deviation, threshold, m.mean, m.min, m.max, action
			)
		},
		_ => format!(
			"Significant imbalance detected ({:.1}% deviation). Cluster avg: {:.2}, min: {:.2}, max: {:.2}",
			m.max_deviation, m.mean, m.min, m.max
		),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};

	fn series(metric: &str, entity: u32, values: &[f64]) -> MetricSeries {
		let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		MetricSeries::hourly(metric, Some(entity), start, values).unwrap()
	}

	fn descriptor() -> ClusterDescriptor {
		ClusterDescriptor::new("orders", "kafka.m5.large", 3, "3.6.0")
	}

	fn detect(metric: &str, sets: &[MetricSeries]) -> Finding {
		let refs: Vec<&MetricSeries> = sets.iter().collect();
		ImbalanceDetector::default()
			.detect(metric, &refs, &descriptor(), &CapacityTable::default())
			.unwrap()
	}

	#[test]
	fn test_thresholds() {
		assert_eq!(imbalance_threshold(names::MESSAGES_IN_PER_SEC), 10.0);
		assert_eq!(imbalance_threshold(names::LEADER_COUNT), 10.0);
		assert_eq!(imbalance_threshold(names::CONNECTION_COUNT), 15.0);
		assert_eq!(imbalance_threshold(names::MEMORY_USED), 20.0);
	}

	#[test]
	fn test_latest_value_representatives() {
		let sets = [
			series(names::LEADER_COUNT, 1, &[500.0, 100.0]),
			series(names::LEADER_COUNT, 2, &[10.0, 100.0]),
		];
		let refs: Vec<&MetricSeries> = sets.iter().collect();
		let m = ImbalanceMeasurement::from_series(names::LEADER_COUNT, &refs).unwrap();
		assert_eq!(m.representatives, vec![100.0, 100.0]);
		assert_eq!(m.max_deviation, 0.0);
		assert_eq!((m.min, m.max), (100.0, 100.0));
	}

	#[test]
	fn test_zero_mean_has_no_deviation() {
		let sets = [
			series(names::MEMORY_USED, 1, &[0.0]),
			series(names::MEMORY_USED, 2, &[0.0]),
		];
		let refs: Vec<&MetricSeries> = sets.iter().collect();
		let m = ImbalanceMeasurement::from_series(names::MEMORY_USED, &refs).unwrap();
		assert_eq!(m.max_deviation, 0.0);
	}

	#[test]
	fn test_imbalanced_metric_warns() {
		let finding = detect(
			names::MEMORY_USED,
			&[
				series(names::MEMORY_USED, 1, &[100.0]),
				series(names::MEMORY_USED, 2, &[50.0]),
			],
		);
		assert_eq!(finding.severity, Severity::Warning);
		assert_eq!(finding.title, "MemoryUsed - Broker Imbalance Detected");
		// mean 75, deviation 25/75
		assert!((finding.current_value.unwrap() - 33.333333).abs() < 1e-3);
		assert_eq!(finding.threshold_value, Some(20.0));
	}

	#[test]
	fn test_low_network_throughput_is_suppressed() {
		let mb = BYTES_PER_MB;
		// 90% deviation at an average of 5 MB/s per broker
		let finding = detect(
			names::BYTES_IN_PER_SEC,
			&[
				series(names::BYTES_IN_PER_SEC, 1, &[9.5 * mb]),
				series(names::BYTES_IN_PER_SEC, 2, &[0.5 * mb]),
			],
		);
		assert_eq!(finding.severity, Severity::Healthy);
		assert_eq!(finding.title, "BytesInPerSec - Balanced Across Brokers");
	}

	#[test]
	fn test_low_cpu_is_suppressed_but_high_cpu_is_not() {
		let quiet = detect(
			names::CPU_USER,
			&[
				series(names::CPU_USER, 1, &[20.0]),
				series(names::CPU_USER, 2, &[2.0]),
			],
		);
		assert_eq!(quiet.severity, Severity::Healthy);

		let busy = detect(
			names::CPU_USER,
			&[
				series(names::CPU_USER, 1, &[50.0]),
				series(names::CPU_USER, 2, &[10.0]),
			],
		);
		assert_eq!(busy.severity, Severity::Warning);
	}

	#[test]
	fn test_message_imbalance_mentions_rebalancing_mode() {
		let sets = [
			series(names::MESSAGES_IN_PER_SEC, 1, &[1_000.0]),
			series(names::MESSAGES_IN_PER_SEC, 2, &[500.0]),
		];
		let refs: Vec<&MetricSeries> = sets.iter().collect();
		let detector = ImbalanceDetector::default();
		let capacity = CapacityTable::default();

		let manual = detector
			.detect(names::MESSAGES_IN_PER_SEC, &refs, &descriptor(), &capacity)
			.unwrap();
		assert!(manual.description.contains("Cruise Control or manual reassignment"));

		let automatic = detector
			.detect(
				names::MESSAGES_IN_PER_SEC,
				&refs,
				&descriptor().with_intelligent_rebalancing(true),
				&capacity,
			)
			.unwrap();
		assert!(automatic
			.description
			.contains("Automatic rebalancing is enabled"));
	}

	#[test]
	fn test_partition_imbalance_recommends_rebalance_or_scale() {
		let low = detect(
			names::PARTITION_COUNT,
			&[
				series(names::PARTITION_COUNT, 1, &[300.0]),
				series(names::PARTITION_COUNT, 2, &[100.0]),
			],
		);
		assert!(low.description.contains("Rebalance partitions across all 2 brokers"));
		assert!(low.description.contains("(400/2000 partitions)"));

		let high = detect(
			names::PARTITION_COUNT,
			&[
				series(names::PARTITION_COUNT, 1, &[990.0]),
				series(names::PARTITION_COUNT, 2, &[700.0]),
			],
		);
		assert!(high.description.contains("Consider adding more brokers"));
	}

	#[test]
	fn test_partition_imbalance_with_zero_limit_stays_finite() {
		let capacity = CapacityTable::default().with_partition_limit("kafka.m5.large", 0);
		let sets = [
			series(names::PARTITION_COUNT, 1, &[300.0]),
			series(names::PARTITION_COUNT, 2, &[100.0]),
		];
		let refs: Vec<&MetricSeries> = sets.iter().collect();

		let finding = ImbalanceDetector::default()
			.detect(names::PARTITION_COUNT, &refs, &descriptor(), &capacity)
			.unwrap();
		assert_eq!(finding.severity, Severity::Warning);
		assert!(!finding.description.contains("NaN"));
		assert!(!finding.description.contains("inf"));
		assert!(finding.description.contains("0.0% capacity utilization (400/0 partitions)"));
	}
}
