//! Rules over per-broker series
//!
//! Threshold rules here look at every broker on its own and report each
//! broker that breaches, with the broker id in the title. When no broker
//! breaches, a single healthy summary covers the cluster.

use super::{statistics_evidence, utilization_pct};
use crate::analysis::imbalance::{ImbalanceDetector, ImbalanceMeasurement};
use crate::analysis::{Requirement, Rule, RuleContext};
use mhc_types::{names, AuthMethod, Category, ClusterDescriptor, Finding, MetricSeries, Severity};

const DISK_CRITICAL_PERCENT: f64 = 80.0;
const DISK_WARNING_PERCENT: f64 = 70.0;
/// Projections further out than this are left out of descriptions
const DISK_PROJECTION_HORIZON_DAYS: f64 = 90.0;

const HEAP_WARNING_PERCENT: f64 = 60.0;
const MEMORY_WARNING_PERCENT: f64 = 85.0;

/// Cluster creation rate above which connection churn is worth a note
const CREATION_RATE_NOTABLE: f64 = 5.0;

fn broker_id(series: &MetricSeries) -> u32 {
	series.entity_id().unwrap_or_default()
}

fn window_days(ctx: &RuleContext<'_>) -> i64 {
	ctx.collection.window().duration().num_days()
}

/// Linear growth of a percentage series towards the critical disk level
#[derive(Debug, Clone, Copy, PartialEq)]
struct DiskGrowth {
	rate_per_day: Option<f64>,
	days_until_full: Option<f64>,
}

impl DiskGrowth {
	fn of(series: &MetricSeries) -> Self {
		let elapsed = series.elapsed_days();
		let (first, last) = (series.first_value(), series.last_value());
		if series.len() < 2 || elapsed <= 0.0 || last <= first {
			return Self {
				rate_per_day: None,
				days_until_full: None,
			};
		}

		let rate = (last - first) / elapsed;
		let days = (last < DISK_CRITICAL_PERCENT).then(|| (DISK_CRITICAL_PERCENT - last) / rate);
		Self {
			rate_per_day: Some(rate),
			days_until_full: days,
		}
	}

	fn projection_note(&self) -> Option<String> {
		self.days_until_full
			.filter(|days| *days < DISK_PROJECTION_HORIZON_DAYS)
			.map(|days| {
				format!(
					" Projected to reach 80% in ~{} days at current growth rate.",
					days as u64
				)
			})
	}
}

/// Data volume usage per broker, with a days-to-full projection
///
/// Skipped for clusters without provisioned storage.
#[derive(Debug, Default)]
pub struct DiskUsageRule;

impl Rule for DiskUsageRule {
	fn name(&self) -> &str {
		"disk_usage"
	}

	fn requirement(&self) -> Requirement {
		Requirement::EntitySeries(names::KAFKA_DATA_LOGS_DISK_USED)
	}

	fn applies_to(&self, descriptor: &ClusterDescriptor) -> bool {
		descriptor.capacity_class.has_provisioned_storage()
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let brokers = ctx.entity_series(names::KAFKA_DATA_LOGS_DISK_USED);
		if brokers.is_empty() {
			return Vec::new();
		}

		let mut findings = Vec::new();
		for series in &brokers {
			let stats = series.statistics();
			let growth = DiskGrowth::of(series);
			let id = broker_id(series);

			let (severity, title, description) = if stats.max >= DISK_CRITICAL_PERCENT {
				(
					Severity::Critical,
					format!("High Disk Usage - Broker {}", id),
					format!(
						"Disk usage on broker {} reached {:.1}%, exceeding 80% threshold. Risk of broker failures.",
						id, stats.max
					),
				)
			} else if stats.max >= DISK_WARNING_PERCENT {
				let mut description = format!(
					"Disk usage on broker {} at {:.1}%. Consider increasing storage capacity.",
					id, stats.max
				);
				if let Some(note) = growth.projection_note() {
					description.push_str(&note);
				}
				(
					Severity::Warning,
					format!("Elevated Disk Usage - Broker {}", id),
					description,
				)
			} else {
				continue;
			};

			findings.push(
				Finding::new(
					names::KAFKA_DATA_LOGS_DISK_USED,
					severity,
					Category::Reliability,
					title,
					description,
				)
				.with_current_value(stats.max)
				.with_threshold(DISK_CRITICAL_PERCENT)
				.with_evidence("broker_id", id)
				.with_evidence("statistics", statistics_evidence(stats))
				.with_evidence("growth_rate_per_day", growth.rate_per_day)
				.with_evidence("days_until_full", growth.days_until_full),
			);
		}

		if !findings.is_empty() {
			return findings;
		}

		let peak = brokers
			.iter()
			.map(|s| s.statistics().max)
			.fold(f64::NEG_INFINITY, f64::max);
		// The broker that fills up first sets the cluster projection
		let soonest = brokers
			.iter()
			.map(|s| DiskGrowth::of(s))
			.filter(|g| g.days_until_full.is_some())
			.min_by(|a, b| {
				a.days_until_full
					.unwrap_or(f64::INFINITY)
					.total_cmp(&b.days_until_full.unwrap_or(f64::INFINITY))
			});

		let mut description = format!("Disk usage at {:.1}%, well below 80% threshold.", peak);
		if let Some(note) = soonest.and_then(|g| g.projection_note()) {
			description.push_str(&note);
		}

		vec![Finding::new(
			names::KAFKA_DATA_LOGS_DISK_USED,
			Severity::Healthy,
			Category::Reliability,
			"Disk Usage Normal",
			description,
		)
		.with_current_value(peak)
		.with_threshold(DISK_CRITICAL_PERCENT)
		.with_evidence("broker_count", brokers.len())
		.with_evidence("growth_rate_per_day", soonest.and_then(|g| g.rate_per_day))
		.with_evidence("days_until_full", soonest.and_then(|g| g.days_until_full))]
	}
}

/// Host memory in use against used plus free, per broker; silent when healthy
///
/// Peak used memory is compared to the sum of the window means.
#[derive(Debug, Default)]
pub struct MemoryUtilizationRule;

impl Rule for MemoryUtilizationRule {
	fn name(&self) -> &str {
		"memory_utilization"
	}

	fn requirement(&self) -> Requirement {
		Requirement::AllEntitySeries(&[names::MEMORY_USED, names::MEMORY_FREE])
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		ctx.entity_series(names::MEMORY_USED)
			.into_iter()
			.filter_map(|used| {
				let id = broker_id(used);
				let free = ctx.collection.series_for_entity(names::MEMORY_FREE, id)?;
				let (used_stats, free_stats) = (used.statistics(), free.statistics());

				let total = used_stats.mean + free_stats.mean;
				if total <= 0.0 {
					return None;
				}
				let peak = utilization_pct(used_stats.max, total);
				if peak < MEMORY_WARNING_PERCENT {
					return None;
				}

				Some(
					Finding::new(
						"MemoryUsage",
						Severity::Warning,
						Category::Performance,
						format!("High Memory Usage - Broker {}", id),
						format!(
							"Memory utilization on broker {} reached {:.1}%, exceeding 85% threshold.",
							id, peak
						),
					)
					.with_current_value(peak)
					.with_threshold(MEMORY_WARNING_PERCENT)
					.with_evidence("broker_id", id)
					.with_evidence("memory_used_stats", statistics_evidence(used_stats))
					.with_evidence("memory_free_stats", statistics_evidence(free_stats))
					.with_evidence("avg_utilization", utilization_pct(used_stats.mean, total)),
				)
			})
			.collect()
	}
}

/// Heap still in use after garbage collection; silent when healthy
#[derive(Debug, Default)]
pub struct HeapMemoryRule;

impl Rule for HeapMemoryRule {
	fn name(&self) -> &str {
		"heap_memory_after_gc"
	}

	fn requirement(&self) -> Requirement {
		Requirement::EntitySeries(names::HEAP_MEMORY_AFTER_GC)
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		ctx.entity_series(names::HEAP_MEMORY_AFTER_GC)
			.into_iter()
			.filter(|s| s.statistics().max >= HEAP_WARNING_PERCENT)
			.map(|s| {
				let stats = s.statistics();
				let id = broker_id(s);
				Finding::new(
					names::HEAP_MEMORY_AFTER_GC,
					Severity::Warning,
					Category::Performance,
					format!("High Heap Memory After GC - Broker {}", id),
					format!(
						"Heap memory after GC on broker {} at {:.1}%, exceeding 60% threshold. Indicates memory pressure.",
						id, stats.max
					),
				)
				.with_current_value(stats.max)
				.with_threshold(HEAP_WARNING_PERCENT)
				.with_evidence("broker_id", id)
				.with_evidence("statistics", statistics_evidence(stats))
			})
			.collect()
	}
}

#[derive(Debug, Default)]
pub struct UnderMinIsrRule;

impl Rule for UnderMinIsrRule {
	fn name(&self) -> &str {
		"under_min_isr"
	}

	fn requirement(&self) -> Requirement {
		Requirement::EntitySeries(names::UNDER_MIN_ISR_PARTITION_COUNT)
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let brokers = ctx.entity_series(names::UNDER_MIN_ISR_PARTITION_COUNT);
		if brokers.is_empty() {
			return Vec::new();
		}

		let days = window_days(ctx);
		let findings: Vec<Finding> = brokers
			.iter()
			.filter_map(|s| {
				let stats = s.statistics();
				let id = broker_id(s);
				let current = s.last_value();

				let finding = if current > 0.0 {
					Finding::new(
						names::UNDER_MIN_ISR_PARTITION_COUNT,
						Severity::Critical,
						Category::Reliability,
						format!("Partitions Under Min ISR Now - Broker {}", id),
						format!(
							"Broker {} currently has {} partitions under minimum ISR. Immediate risk of data loss.",
							id, current as u64
						),
					)
					.with_current_value(current)
				} else if stats.max > 0.0 {
					Finding::new(
						names::UNDER_MIN_ISR_PARTITION_COUNT,
						Severity::Warning,
						Category::Reliability,
						format!("Partitions Under Min ISR (Historical) - Broker {}", id),
						format!(
							"Broker {} had up to {} partitions under minimum ISR in the last {} days. Monitor replication health.",
							id, stats.max as u64, days
						),
					)
					.with_current_value(stats.max)
				} else {
					return None;
				};

				Some(
					finding
						.with_threshold(0.0)
						.with_evidence("broker_id", id)
						.with_evidence("statistics", statistics_evidence(stats)),
				)
			})
			.collect();

		if !findings.is_empty() {
			return findings;
		}

		vec![Finding::new(
			names::UNDER_MIN_ISR_PARTITION_COUNT,
			Severity::Healthy,
			Category::Reliability,
			"All Partitions Meet Min ISR",
			"All partitions meet minimum in-sync replica requirements.",
		)
		.with_current_value(0.0)
		.with_threshold(0.0)
		.with_evidence("broker_count", brokers.len())]
	}
}

#[derive(Debug, Default)]
pub struct UnderReplicatedRule;

impl Rule for UnderReplicatedRule {
	fn name(&self) -> &str {
		"under_replicated_partitions"
	}

	fn requirement(&self) -> Requirement {
		Requirement::EntitySeries(names::UNDER_REPLICATED_PARTITIONS)
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let brokers = ctx.entity_series(names::UNDER_REPLICATED_PARTITIONS);
		if brokers.is_empty() {
			return Vec::new();
		}

		let findings: Vec<Finding> = brokers
			.iter()
			.filter(|s| s.statistics().max > 0.0)
			.map(|s| {
				let stats = s.statistics();
				let id = broker_id(s);
				Finding::new(
					names::UNDER_REPLICATED_PARTITIONS,
					Severity::Warning,
					Category::Reliability,
					format!("Under-Replicated Partitions Detected - Broker {}", id),
					format!(
						"Broker {} had up to {} under-replicated partitions. Replication is lagging.",
						id, stats.max as u64
					),
				)
				.with_current_value(stats.max)
				.with_threshold(0.0)
				.with_evidence("broker_id", id)
				.with_evidence("statistics", statistics_evidence(stats))
			})
			.collect();

		if !findings.is_empty() {
			return findings;
		}

		vec![Finding::new(
			names::UNDER_REPLICATED_PARTITIONS,
			Severity::Healthy,
			Category::Reliability,
			"All Partitions Fully Replicated",
			"All partitions are fully replicated.",
		)
		.with_current_value(0.0)
		.with_threshold(0.0)
		.with_evidence("broker_count", brokers.len())]
	}
}

/// Busiest broker's current partition count against the per-broker limit
///
/// Silent below 90% of the limit; the imbalance rule covers the healthy case.
#[derive(Debug, Default)]
pub struct PartitionCapacityRule;

impl Rule for PartitionCapacityRule {
	fn name(&self) -> &str {
		"broker_partition_capacity"
	}

	fn requirement(&self) -> Requirement {
		Requirement::EntitySeries(names::PARTITION_COUNT)
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let brokers = ctx.entity_series(names::PARTITION_COUNT);
		let Some(m) = ImbalanceMeasurement::from_series(names::PARTITION_COUNT, &brokers) else {
			return Vec::new();
		};

		let limit = ctx.partition_limit();
		let max_partitions = m.max.max(0.0) as u64;
		let utilization = utilization_pct(max_partitions as f64, f64::from(limit));
		let instance_class = ctx.descriptor.instance_class.as_str();

		let (severity, title, description) = if utilization > 100.0 {
			(
				Severity::Critical,
				"Broker Partition Count Exceeded",
				format!(
					"At least one broker has {} partitions, exceeding the {} limit for {}.",
					max_partitions, limit, instance_class
				),
			)
		} else if utilization >= 90.0 {
			(
				Severity::Warning,
				"Broker Partition Count Near Limit",
				format!(
					"At least one broker has {} partitions ({:.1}% of {} limit for {}).",
					max_partitions, utilization, limit, instance_class
				),
			)
		} else {
			return Vec::new();
		};

		vec![Finding::new(
			names::PARTITION_COUNT,
			severity,
			Category::Performance,
			title,
			description,
		)
		.with_current_value(max_partitions as f64)
		.with_threshold(f64::from(limit))
		.with_evidence("max_partitions", max_partitions)
		.with_evidence("limit", limit)
		.with_evidence("instance_type", instance_class)]
	}
}

/// New connections per second across the cluster
///
/// IAM authentication caps the cluster at 100 new connections per second,
/// so its thresholds are looser relative to that cap.
#[derive(Debug, Default)]
pub struct CreationRateRule;

impl Rule for CreationRateRule {
	fn name(&self) -> &str {
		"connection_creation_rate"
	}

	fn requirement(&self) -> Requirement {
		Requirement::EntitySeries(names::CONNECTION_CREATION_RATE)
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let brokers = ctx.entity_series(names::CONNECTION_CREATION_RATE);
		if brokers.is_empty() {
			return Vec::new();
		}

		let cluster_avg: f64 = brokers.iter().map(|s| s.statistics().mean).sum();
		let cluster_p95: f64 = brokers.iter().map(|s| s.statistics().p95).sum();
		let cluster_max: f64 = brokers.iter().map(|s| s.statistics().max).sum();

		let iam = ctx.descriptor.has_auth_method(AuthMethod::Iam);
		let (critical, warning) = if iam { (80.0, 50.0) } else { (50.0, 20.0) };
		let rates = format!(
			"P95={:.1} conn/sec, avg={:.1} conn/sec, max={:.1} conn/sec",
			cluster_p95, cluster_avg, cluster_max
		);

		let finding = if cluster_p95 >= critical {
			let auth_note = if iam {
				" (approaching IAM auth limit of 100/sec)"
			} else {
				""
			};
			Finding::new(
				names::CONNECTION_CREATION_RATE,
				Severity::Critical,
				Category::Performance,
				"Excessive Connection Creation Rate",
				format!(
					"High connection creation rate detected: {}{}. This indicates missing connection pooling, short timeouts, or client instability. New connections are expensive and impact CPU performance.",
					rates, auth_note
				),
			)
			.with_current_value(cluster_p95)
			.with_threshold(critical)
		} else if cluster_p95 >= warning {
			let auth_note = if iam { " (IAM auth limit is 100/sec)" } else { "" };
			Finding::new(
				names::CONNECTION_CREATION_RATE,
				Severity::Warning,
				Category::Performance,
				"Elevated Connection Creation Rate",
				format!(
					"Elevated connection creation rate: {}{}. Consider implementing connection pooling and reviewing client timeout configurations.",
					rates, auth_note
				),
			)
			.with_current_value(cluster_p95)
			.with_threshold(warning)
		} else if cluster_avg >= CREATION_RATE_NOTABLE {
			Finding::new(
				names::CONNECTION_CREATION_RATE,
				Severity::Informational,
				Category::Performance,
				"Moderate Connection Creation Rate",
				format!(
					"Connection creation rate: {}. Rate is within acceptable range. Monitor for increases that may indicate client issues.",
					rates
				),
			)
			.with_current_value(cluster_avg)
		} else {
			Finding::new(
				names::CONNECTION_CREATION_RATE,
				Severity::Healthy,
				Category::Performance,
				"Low Connection Creation Rate",
				format!(
					"Connection creation rate is low: P95={:.1} conn/sec, avg={:.1} conn/sec. This indicates stable client connections.",
					cluster_p95, cluster_avg
				),
			)
			.with_current_value(cluster_avg)
		};

		vec![finding
			.with_evidence("cluster_avg", cluster_avg)
			.with_evidence("cluster_p95", cluster_p95)
			.with_evidence("cluster_max", cluster_max)
			.with_evidence("broker_count", brokers.len())
			.with_evidence("iam_auth_enabled", iam)]
	}
}

/// Cross-broker balance of one metric
#[derive(Debug)]
pub struct ImbalanceRule {
	metric: &'static str,
	name: String,
}

impl ImbalanceRule {
	pub fn new(metric: &'static str) -> Self {
		Self {
			metric,
			name: format!("{}_imbalance", metric),
		}
	}

	pub fn metric(&self) -> &'static str {
		self.metric
	}
}

impl Rule for ImbalanceRule {
	fn name(&self) -> &str {
		&self.name
	}

	fn requirement(&self) -> Requirement {
		Requirement::EntitySeries(self.metric)
	}

	fn applies_to(&self, descriptor: &ClusterDescriptor) -> bool {
		self.metric != names::KAFKA_DATA_LOGS_DISK_USED
			|| descriptor.capacity_class.has_provisioned_storage()
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let brokers = ctx.entity_series(self.metric);
		ImbalanceDetector::new(*ctx.suppression)
			.detect(self.metric, &brokers, ctx.descriptor, ctx.capacity)
			.into_iter()
			.collect()
	}
}
