//! Rules that combine several metrics

use super::utilization_pct;
use crate::analysis::{Requirement, Rule, RuleContext};
use mhc_types::constants::limits::BYTES_PER_MB;
use mhc_types::{names, Category, Finding, MetricSeries, Severity};

/// Metric name reported by the combined user + system CPU rule
pub const CPU_TOTAL: &str = "CpuTotal";
/// Metric name reported by the connection churn rule
pub const CONNECTION_CHURN: &str = "ConnectionChurn";

const CPU_TOTAL_CRITICAL_PERCENT: f64 = 60.0;
const NETWORK_WARNING_FRACTION: f64 = 0.70;
const CHURN_CRITICAL: f64 = 20.0;
const CHURN_WARNING: f64 = 10.0;
/// Creation/close ratios outside this range are noted
const CHURN_RATIO_RANGE: (f64, f64) = (0.7, 1.5);

/// Total CPU (user + system) of one broker
#[derive(Debug, Clone, Copy, PartialEq)]
struct BrokerCpu {
	broker_id: u32,
	avg_total: f64,
	max_total: f64,
	p95_total: f64,
	user_avg: f64,
	system_avg: f64,
}

/// Sustained CPU per broker, from paired user and system series
///
/// Brokers lacking either series are left out.
#[derive(Debug, Default)]
pub struct CpuTotalRule;

impl Rule for CpuTotalRule {
	fn name(&self) -> &str {
		"cpu_total"
	}

	fn requirement(&self) -> Requirement {
		Requirement::AllEntitySeries(&[names::CPU_USER, names::CPU_SYSTEM])
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let brokers: Vec<BrokerCpu> = ctx
			.entity_series(names::CPU_USER)
			.into_iter()
			.filter_map(|user| {
				let broker_id = user.entity_id()?;
				let system = ctx.collection.series_for_entity(names::CPU_SYSTEM, broker_id)?;
				let (u, s) = (user.statistics(), system.statistics());
				Some(BrokerCpu {
					broker_id,
					avg_total: u.mean + s.mean,
					max_total: u.max + s.max,
					p95_total: u.p95 + s.p95,
					user_avg: u.mean,
					system_avg: s.mean,
				})
			})
			.collect();

		if brokers.is_empty() {
			return Vec::new();
		}

		let findings: Vec<Finding> = brokers
			.iter()
			.filter(|b| b.p95_total >= CPU_TOTAL_CRITICAL_PERCENT)
			.map(|b| {
				Finding::new(
					CPU_TOTAL,
					Severity::Critical,
					Category::Performance,
					format!("High CPU Usage - Broker {}", b.broker_id),
					format!(
						"Total CPU (User+System) P95 at {:.1}%, exceeding 60% threshold. Avg: {:.1}%, Max: {:.1}%",
						b.p95_total, b.avg_total, b.max_total
					),
				)
				.with_current_value(b.p95_total)
				.with_threshold(CPU_TOTAL_CRITICAL_PERCENT)
				.with_evidence("broker_id", b.broker_id)
				.with_evidence("avg_total", b.avg_total)
				.with_evidence("max_total", b.max_total)
				.with_evidence("p95_total", b.p95_total)
				.with_evidence("cpu_user_avg", b.user_avg)
				.with_evidence("cpu_system_avg", b.system_avg)
			})
			.collect();

		if !findings.is_empty() {
			return findings;
		}

		let cluster_avg_total =
			brokers.iter().map(|b| b.avg_total).sum::<f64>() / brokers.len() as f64;
		let cluster_max_p95 = brokers
			.iter()
			.map(|b| b.p95_total)
			.fold(f64::NEG_INFINITY, f64::max);

		vec![Finding::new(
			CPU_TOTAL,
			Severity::Healthy,
			Category::Performance,
			"CPU Usage Normal",
			format!(
				"Total CPU usage (User+System) below 60% threshold. Cluster average: {:.1}%, Max P95: {:.1}%",
				cluster_avg_total, cluster_max_p95
			),
		)
		.with_current_value(cluster_avg_total)
		.with_threshold(CPU_TOTAL_CRITICAL_PERCENT)
		.with_evidence("cluster_avg_total", cluster_avg_total)
		.with_evidence("cluster_max_p95", cluster_max_p95)]
	}
}

#[derive(Debug, Clone, Copy)]
enum Direction {
	Inbound,
	Outbound,
}

impl Direction {
	fn metric(self) -> &'static str {
		match self {
			Direction::Inbound => names::BYTES_IN_PER_SEC,
			Direction::Outbound => names::BYTES_OUT_PER_SEC,
		}
	}

	fn label(self) -> (&'static str, &'static str) {
		match self {
			Direction::Inbound => ("Inbound", "inbound"),
			Direction::Outbound => ("Outbound", "outbound"),
		}
	}
}

/// Peak throughput against the instance network bandwidth
///
/// A cluster series is compared with the bandwidth of all brokers together;
/// otherwise the broker with the highest peak is compared with one broker's
/// bandwidth. Inbound and outbound are judged independently.
#[derive(Debug, Default)]
pub struct ThroughputRule;

impl ThroughputRule {
	fn evaluate_direction(
		&self,
		ctx: &RuleContext<'_>,
		direction: Direction,
		per_broker_limit_mb: f64,
	) -> Option<Finding> {
		let metric = direction.metric();
		let (series, limit_mb): (&MetricSeries, f64) = match ctx.cluster_series(metric) {
			Some(series) => (
				series,
				per_broker_limit_mb * f64::from(ctx.descriptor.entity_count.max(1)),
			),
			None => {
				let busiest = ctx
					.entity_series(metric)
					.into_iter()
					.max_by(|a, b| a.statistics().max.total_cmp(&b.statistics().max))?;
				(busiest, per_broker_limit_mb)
			},
		};

		let stats = series.statistics();
		let max_mb = stats.max / BYTES_PER_MB;
		let avg_mb = stats.mean / BYTES_PER_MB;
		let utilization = utilization_pct(max_mb, limit_mb);
		let (title_label, text_label) = direction.label();

		let finding = if max_mb >= limit_mb * NETWORK_WARNING_FRACTION {
			Finding::new(
				metric,
				Severity::Warning,
				Category::Performance,
				format!("High {} Network Utilization", title_label),
				format!(
					"Peak {} throughput at {:.1}% of network capacity ({:.1} MB/s / {} MB/s). Consider upgrading instance type to avoid throttling.",
					text_label, utilization, max_mb, limit_mb
				),
			)
			.with_current_value(max_mb)
			.with_threshold(limit_mb)
		} else {
			Finding::new(
				metric,
				Severity::Healthy,
				Category::Performance,
				format!("{} Throughput OK", title_label),
				format!(
					"{} throughput: Avg {:.2} MB/s, Peak {:.2} MB/s ({:.1}% of {} MB/s capacity)",
					title_label, avg_mb, max_mb, utilization, limit_mb
				),
			)
			.with_current_value(avg_mb)
		};

		let mut finding = finding
			.with_evidence("max_mb_per_sec", max_mb)
			.with_evidence("avg_mb_per_sec", avg_mb)
			.with_evidence("limit_mb_per_sec", limit_mb)
			.with_evidence("utilization_pct", utilization);
		if let Some(id) = series.entity_id() {
			finding = finding.with_evidence("broker_id", id);
		}
		Some(finding)
	}
}

impl Rule for ThroughputRule {
	fn name(&self) -> &str {
		"throughput"
	}

	fn requirement(&self) -> Requirement {
		Requirement::AnySeries(&[names::BYTES_IN_PER_SEC, names::BYTES_OUT_PER_SEC])
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let limit = ctx.capacity.network_limit(&ctx.descriptor.instance_class);
		[
			self.evaluate_direction(ctx, Direction::Inbound, limit.ingress_mb_per_sec),
			self.evaluate_direction(ctx, Direction::Outbound, limit.egress_mb_per_sec),
		]
		.into_iter()
		.flatten()
		.collect()
	}
}

/// Connections opened and closed per second across the cluster
///
/// Emits nothing when churn is low and creation and close rates match.
#[derive(Debug, Default)]
pub struct ConnectionChurnRule;

impl Rule for ConnectionChurnRule {
	fn name(&self) -> &str {
		"connection_churn"
	}

	fn requirement(&self) -> Requirement {
		Requirement::AllEntitySeries(&[names::CONNECTION_CREATION_RATE, names::CONNECTION_CLOSE_RATE])
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let creation = ctx.entity_series(names::CONNECTION_CREATION_RATE);
		let close = ctx.entity_series(names::CONNECTION_CLOSE_RATE);
		if creation.is_empty() || close.is_empty() {
			return Vec::new();
		}

		let avg_creation: f64 = creation.iter().map(|s| s.statistics().mean).sum();
		let avg_close: f64 = close.iter().map(|s| s.statistics().mean).sum();
		let max_creation: f64 = creation.iter().map(|s| s.statistics().max).sum();
		let max_close: f64 = close.iter().map(|s| s.statistics().max).sum();
		let churn = (avg_creation + avg_close) / 2.0;

		let mut findings = Vec::new();

		let level = if churn >= CHURN_CRITICAL {
			Some((
				Severity::Critical,
				"Excessive Connection Churn",
				format!(
					"High connection churn rate ({:.1} connections/sec). This may indicate missing connection pooling, short timeouts, or network issues. Note: Connection patterns vary by workload - batch jobs and serverless applications naturally have higher churn.",
					churn
				),
				CHURN_CRITICAL,
			))
		} else if churn >= CHURN_WARNING {
			Some((
				Severity::Warning,
				"Elevated Connection Churn",
				format!(
					"Moderate connection churn rate ({:.1} connections/sec). Monitor for patterns - this may be normal for your workload or indicate optimization opportunities. Consider connection pooling if using short-lived clients.",
					churn
				),
				CHURN_WARNING,
			))
		} else {
			None
		};

		if let Some((severity, title, description, threshold)) = level {
			findings.push(
				Finding::new(CONNECTION_CHURN, severity, Category::Performance, title, description)
					.with_current_value(churn)
					.with_threshold(threshold)
					.with_evidence("avg_creation_rate", avg_creation)
					.with_evidence("avg_close_rate", avg_close)
					.with_evidence("max_creation_rate", max_creation)
					.with_evidence("max_close_rate", max_close)
					.with_evidence("churn_rate", churn),
			);
		}

		if avg_close > 0.0 {
			let ratio = avg_creation / avg_close;
			let (low, high) = CHURN_RATIO_RANGE;
			if ratio < low || ratio > high {
				findings.push(
					Finding::new(
						CONNECTION_CHURN,
						Severity::Informational,
						Category::Performance,
						"Imbalanced Connection Creation/Close Ratio",
						format!(
							"Connection creation/close ratio is {:.2} (creation: {:.1}/sec, close: {:.1}/sec). Ratio should be close to 1.0 for stable workloads. Variations are normal for dynamic workloads and should be monitored in context.",
							ratio, avg_creation, avg_close
						),
					)
					.with_current_value(ratio)
					.with_threshold(1.0)
					.with_evidence("avg_creation_rate", avg_creation)
					.with_evidence("avg_close_rate", avg_close)
					.with_evidence("ratio", ratio),
				);
			}
		}

		findings
	}
}
