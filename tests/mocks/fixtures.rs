//! Fixture builders for descriptors, responses and whole clusters

use msk_health_check::chrono::{DateTime, Duration, TimeZone, Utc};
use msk_health_check::models::{names, AuthMethod, DataPoint, LogDestination};
use msk_health_check::{ClusterDescriptor, MetricCatalog, TelemetryResponse};

use super::sources::ScriptedTelemetrySource;

/// Hours of samples in generated series
const SAMPLE_HOURS: usize = 48;

pub struct Fixtures;

impl Fixtures {
	pub fn start() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
	}

	/// Hourly samples starting at [`Fixtures::start`]
	pub fn response(values: &[f64]) -> TelemetryResponse {
		let datapoints = values
			.iter()
			.enumerate()
			.map(|(i, v)| DataPoint::new(Self::start() + Duration::hours(i as i64), *v))
			.collect();
		TelemetryResponse::new("Count", datapoints)
	}

	/// Well-configured Graviton cluster on the recommended version
	pub fn provisioned_descriptor(entity_count: u32) -> ClusterDescriptor {
		ClusterDescriptor::new("orders", "kafka.m7g.large", entity_count, "3.8.1")
			.with_arn("arn:aws:kafka:us-east-1:123456789012:cluster/orders/abc")
			.with_auth_methods([AuthMethod::Iam, AuthMethod::Mtls])
			.with_storage_autoscaling(true)
			.with_logging(vec![LogDestination::CloudWatch])
	}

	pub fn express_descriptor(entity_count: u32) -> ClusterDescriptor {
		ClusterDescriptor::new("events", "express.m7g.large", entity_count, "3.8.1")
			.with_auth_methods([AuthMethod::Iam, AuthMethod::Mtls])
			.with_logging(vec![LogDestination::S3])
	}

	/// Steady value of a metric on a comfortably sized cluster
	pub fn healthy_value(metric: &str) -> f64 {
		match metric {
			names::ACTIVE_CONTROLLER_COUNT => 1.0,
			names::GLOBAL_PARTITION_COUNT => 300.0,
			names::GLOBAL_TOPIC_COUNT => 40.0,
			names::CPU_USER => 20.0,
			names::CPU_SYSTEM => 5.0,
			names::CPU_IDLE => 75.0,
			names::MEMORY_USED | names::MEMORY_FREE => 4_000_000_000.0,
			names::HEAP_MEMORY_AFTER_GC => 30.0,
			names::KAFKA_DATA_LOGS_DISK_USED => 40.0,
			names::LEADER_COUNT => 100.0,
			names::PARTITION_COUNT => 200.0,
			names::CLIENT_CONNECTION_COUNT | names::CONNECTION_COUNT => 50.0,
			names::BYTES_IN_PER_SEC | names::BYTES_OUT_PER_SEC => 1_048_576.0,
			names::MESSAGES_IN_PER_SEC => 500.0,
			names::CONNECTION_CREATION_RATE | names::CONNECTION_CLOSE_RATE => 1.0,
			_ => 0.0,
		}
	}

	/// Source answering every catalog query for `descriptor` with steady values
	pub fn healthy_source(descriptor: &ClusterDescriptor) -> ScriptedTelemetrySource {
		let catalog = MetricCatalog::for_capacity_class(descriptor.capacity_class);
		let mut source = ScriptedTelemetrySource::new();

		for definition in catalog.cluster_level() {
			let values = vec![Self::healthy_value(&definition.name); SAMPLE_HOURS];
			source = source.with_series(&definition.name, None, &values);
		}
		for definition in catalog.entity_level() {
			let values = vec![Self::healthy_value(&definition.name); SAMPLE_HOURS];
			for broker in 1..=descriptor.entity_count {
				source = source.with_series(&definition.name, Some(broker), &values);
			}
		}
		source
	}
}
