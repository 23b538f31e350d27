//! Catalog of metrics retrieved for a cluster

use serde::{Deserialize, Serialize};

use crate::cluster::CapacityClass;

/// Namespace every broker metric is published under
pub const DEFAULT_NAMESPACE: &str = "AWS/Kafka";

/// Metric names referenced by the collector and the rules
pub mod names {
	pub const ACTIVE_CONTROLLER_COUNT: &str = "ActiveControllerCount";
	pub const GLOBAL_PARTITION_COUNT: &str = "GlobalPartitionCount";
	pub const GLOBAL_TOPIC_COUNT: &str = "GlobalTopicCount";
	pub const OFFLINE_PARTITIONS_COUNT: &str = "OfflinePartitionsCount";

	pub const CPU_USER: &str = "CpuUser";
	pub const CPU_SYSTEM: &str = "CpuSystem";
	pub const CPU_IDLE: &str = "CpuIdle";
	pub const MEMORY_USED: &str = "MemoryUsed";
	pub const MEMORY_FREE: &str = "MemoryFree";
	pub const HEAP_MEMORY_AFTER_GC: &str = "HeapMemoryAfterGC";
	pub const KAFKA_DATA_LOGS_DISK_USED: &str = "KafkaDataLogsDiskUsed";
	pub const LEADER_COUNT: &str = "LeaderCount";
	pub const PARTITION_COUNT: &str = "PartitionCount";
	pub const CLIENT_CONNECTION_COUNT: &str = "ClientConnectionCount";
	pub const CONNECTION_COUNT: &str = "ConnectionCount";
	pub const UNDER_MIN_ISR_PARTITION_COUNT: &str = "UnderMinIsrPartitionCount";
	pub const UNDER_REPLICATED_PARTITIONS: &str = "UnderReplicatedPartitions";
	pub const BYTES_IN_PER_SEC: &str = "BytesInPerSec";
	pub const BYTES_OUT_PER_SEC: &str = "BytesOutPerSec";
	pub const MESSAGES_IN_PER_SEC: &str = "MessagesInPerSec";
	pub const CONNECTION_CREATION_RATE: &str = "ConnectionCreationRate";
	pub const CONNECTION_CLOSE_RATE: &str = "ConnectionCloseRate";
}

/// Whether a metric is published once per cluster or once per broker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MetricLevel {
	Cluster,
	Entity,
}

/// Aggregation statistic requested from the telemetry source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Statistic {
	Average,
	Maximum,
	Minimum,
	Sum,
	SampleCount,
}

impl Statistic {
	pub fn as_str(&self) -> &'static str {
		match self {
			Statistic::Average => "Average",
			Statistic::Maximum => "Maximum",
			Statistic::Minimum => "Minimum",
			Statistic::Sum => "Sum",
			Statistic::SampleCount => "SampleCount",
		}
	}
}

impl std::fmt::Display for Statistic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One entry of the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricDefinition {
	pub name: String,
	pub namespace: String,
	pub statistic: Statistic,
	pub level: MetricLevel,
}

impl MetricDefinition {
	pub fn cluster(name: &str, statistic: Statistic) -> Self {
		Self {
			name: name.to_string(),
			namespace: DEFAULT_NAMESPACE.to_string(),
			statistic,
			level: MetricLevel::Cluster,
		}
	}

	pub fn entity(name: &str, statistic: Statistic) -> Self {
		Self {
			name: name.to_string(),
			namespace: DEFAULT_NAMESPACE.to_string(),
			statistic,
			level: MetricLevel::Entity,
		}
	}

	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = namespace.into();
		self
	}

	pub fn is_cluster_level(&self) -> bool {
		self.level == MetricLevel::Cluster
	}
}

/// Ordered set of metric definitions
///
/// Iteration order is the declaration order, which the analysis engine relies
/// on for its per-entity block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricCatalog {
	definitions: Vec<MetricDefinition>,
}

impl MetricCatalog {
	pub fn new(definitions: Vec<MetricDefinition>) -> Self {
		Self { definitions }
	}

	/// Catalog for clusters with provisioned broker storage
	pub fn standard() -> Self {
		let mut definitions = Self::cluster_definitions();
		definitions.extend(Self::entity_definitions(true));
		Self { definitions }
	}

	/// Catalog for express clusters, which expose no data-log disk metric
	pub fn express() -> Self {
		let mut definitions = Self::cluster_definitions();
		definitions.extend(Self::entity_definitions(false));
		Self { definitions }
	}

	pub fn for_capacity_class(class: CapacityClass) -> Self {
		match class {
			CapacityClass::Provisioned => Self::standard(),
			CapacityClass::Express => Self::express(),
		}
	}

	/// Override the namespace of every definition
	pub fn with_namespace(self, namespace: &str) -> Self {
		Self {
			definitions: self
				.definitions
				.into_iter()
				.map(|d| d.with_namespace(namespace))
				.collect(),
		}
	}

	fn cluster_definitions() -> Vec<MetricDefinition> {
		use names::*;
		vec![
			MetricDefinition::cluster(ACTIVE_CONTROLLER_COUNT, Statistic::Maximum),
			MetricDefinition::cluster(GLOBAL_PARTITION_COUNT, Statistic::Average),
			MetricDefinition::cluster(GLOBAL_TOPIC_COUNT, Statistic::Average),
			MetricDefinition::cluster(OFFLINE_PARTITIONS_COUNT, Statistic::Sum),
		]
	}

	fn entity_definitions(with_disk: bool) -> Vec<MetricDefinition> {
		use names::*;
		let mut definitions = vec![
			MetricDefinition::entity(CPU_USER, Statistic::Average),
			MetricDefinition::entity(CPU_SYSTEM, Statistic::Average),
			MetricDefinition::entity(CPU_IDLE, Statistic::Average),
			MetricDefinition::entity(MEMORY_USED, Statistic::Average),
			MetricDefinition::entity(MEMORY_FREE, Statistic::Average),
			MetricDefinition::entity(HEAP_MEMORY_AFTER_GC, Statistic::Average),
		];
		if with_disk {
			definitions.push(MetricDefinition::entity(
				KAFKA_DATA_LOGS_DISK_USED,
				Statistic::Average,
			));
		}
		definitions.extend([
			MetricDefinition::entity(LEADER_COUNT, Statistic::Average),
			MetricDefinition::entity(PARTITION_COUNT, Statistic::Average),
			MetricDefinition::entity(CLIENT_CONNECTION_COUNT, Statistic::Average),
			MetricDefinition::entity(CONNECTION_COUNT, Statistic::Average),
			MetricDefinition::entity(UNDER_MIN_ISR_PARTITION_COUNT, Statistic::Sum),
			MetricDefinition::entity(UNDER_REPLICATED_PARTITIONS, Statistic::Sum),
			MetricDefinition::entity(BYTES_IN_PER_SEC, Statistic::Average),
			MetricDefinition::entity(BYTES_OUT_PER_SEC, Statistic::Average),
			MetricDefinition::entity(MESSAGES_IN_PER_SEC, Statistic::Average),
			MetricDefinition::entity(CONNECTION_CREATION_RATE, Statistic::Average),
			MetricDefinition::entity(CONNECTION_CLOSE_RATE, Statistic::Average),
		]);
		definitions
	}

	pub fn iter(&self) -> impl Iterator<Item = &MetricDefinition> {
		self.definitions.iter()
	}

	pub fn cluster_level(&self) -> impl Iterator<Item = &MetricDefinition> {
		self.definitions.iter().filter(|d| d.level == MetricLevel::Cluster)
	}

	pub fn entity_level(&self) -> impl Iterator<Item = &MetricDefinition> {
		self.definitions.iter().filter(|d| d.level == MetricLevel::Entity)
	}

	pub fn get(&self, name: &str) -> Option<&MetricDefinition> {
		self.definitions.iter().find(|d| d.name == name)
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}

	/// Number of queries a collection issues for `entity_count` brokers
	pub fn query_count(&self, entity_count: u32) -> usize {
		let clusters = self.cluster_level().count();
		let entities = self.entity_level().count();
		clusters + entities * entity_count as usize
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_express_catalog_has_no_disk_metric() {
		let standard = MetricCatalog::standard();
		let express = MetricCatalog::express();

		assert!(standard.get(names::KAFKA_DATA_LOGS_DISK_USED).is_some());
		assert!(express.get(names::KAFKA_DATA_LOGS_DISK_USED).is_none());
		assert_eq!(standard.len(), express.len() + 1);
	}

	#[test]
	fn test_statistics_follow_metric_semantics() {
		let catalog = MetricCatalog::standard();
		let controller = catalog.get(names::ACTIVE_CONTROLLER_COUNT).unwrap();
		assert_eq!(controller.statistic, Statistic::Maximum);
		assert!(controller.is_cluster_level());

		let isr = catalog.get(names::UNDER_MIN_ISR_PARTITION_COUNT).unwrap();
		assert_eq!(isr.statistic, Statistic::Sum);
		assert_eq!(isr.level, MetricLevel::Entity);
		assert!(catalog.iter().all(|d| d.namespace == DEFAULT_NAMESPACE));
	}

	#[test]
	fn test_query_count() {
		let catalog = MetricCatalog::standard();
		assert_eq!(catalog.cluster_level().count(), 4);
		assert_eq!(catalog.query_count(3), 4 + 3 * catalog.entity_level().count());
	}
}
