//! Per-instance-class capacity limits
//!
//! One table consulted by every capacity-aware rule: network bandwidth,
//! partitions per broker and client connections per broker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::limits::{
	DEFAULT_CONNECTION_LIMIT, DEFAULT_NETWORK_LIMIT_MB_PER_SEC, DEFAULT_PARTITION_LIMIT,
};

/// Ingress and egress bandwidth of one broker in MB/s
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NetworkLimit {
	pub ingress_mb_per_sec: f64,
	pub egress_mb_per_sec: f64,
}

impl NetworkLimit {
	pub const fn new(ingress_mb_per_sec: f64, egress_mb_per_sec: f64) -> Self {
		Self {
			ingress_mb_per_sec,
			egress_mb_per_sec,
		}
	}
}

const NETWORK_LIMITS: &[(&str, f64, f64)] = &[
	("kafka.m5.large", 9.0, 9.0),
	("kafka.m5.xlarge", 16.0, 16.0),
	("kafka.m5.2xlarge", 31.0, 31.0),
	("kafka.m5.4xlarge", 63.0, 63.0),
	("kafka.m5.8xlarge", 106.0, 106.0),
	("kafka.m5.12xlarge", 125.0, 125.0),
	("kafka.m5.16xlarge", 125.0, 125.0),
	("kafka.m5.24xlarge", 125.0, 125.0),
	("kafka.m7g.large", 10.0, 10.0),
	("kafka.m7g.xlarge", 20.0, 20.0),
	("kafka.m7g.2xlarge", 39.0, 39.0),
	("kafka.m7g.4xlarge", 78.0, 78.0),
	("kafka.m7g.8xlarge", 125.0, 125.0),
	("kafka.m7g.12xlarge", 125.0, 125.0),
	("kafka.m7g.16xlarge", 125.0, 125.0),
	("express.m7g.large", 23.4, 58.5),
	("express.m7g.xlarge", 46.8, 117.0),
	("express.m7g.2xlarge", 93.7, 234.2),
	("express.m7g.4xlarge", 187.5, 468.7),
	("express.m7g.8xlarge", 375.0, 937.5),
	("express.m7g.12xlarge", 562.5, 1406.2),
	("express.m7g.16xlarge", 750.0, 1875.0),
];

const BROKER_LIMITS: &[(&str, u32)] = &[
	("kafka.t3.small", 300),
	("kafka.m5.large", 1_000),
	("kafka.m5.xlarge", 1_500),
	("kafka.m5.2xlarge", 2_000),
	("kafka.m5.4xlarge", 4_000),
	("kafka.m5.8xlarge", 8_000),
	("kafka.m5.12xlarge", 12_000),
	("kafka.m5.16xlarge", 16_000),
	("kafka.m5.24xlarge", 24_000),
	("kafka.m7g.large", 1_000),
	("kafka.m7g.xlarge", 1_500),
	("kafka.m7g.2xlarge", 2_000),
	("kafka.m7g.4xlarge", 4_000),
	("kafka.m7g.8xlarge", 8_000),
	("kafka.m7g.12xlarge", 12_000),
	("kafka.m7g.16xlarge", 16_000),
];

const EXPRESS_PARTITION_LIMITS: &[(&str, u32)] = &[
	("express.m7g.large", 1_500),
	("express.m7g.xlarge", 2_000),
	("express.m7g.2xlarge", 4_000),
	("express.m7g.4xlarge", 8_000),
	("express.m7g.8xlarge", 16_000),
	("express.m7g.12xlarge", 24_000),
	("express.m7g.16xlarge", 32_000),
];

/// Capacity limits keyed by instance class string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapacityTable {
	network: BTreeMap<String, NetworkLimit>,
	partitions: BTreeMap<String, u32>,
	connections: BTreeMap<String, u32>,
	default_network: NetworkLimit,
	default_partitions: u32,
	default_connections: u32,
}

impl Default for CapacityTable {
	fn default() -> Self {
		let network = NETWORK_LIMITS
			.iter()
			.map(|(class, ingress, egress)| (class.to_string(), NetworkLimit::new(*ingress, *egress)))
			.collect();
		let partitions = BROKER_LIMITS
			.iter()
			.chain(EXPRESS_PARTITION_LIMITS)
			.map(|(class, limit)| (class.to_string(), *limit))
			.collect();
		let connections = BROKER_LIMITS
			.iter()
			.map(|(class, limit)| (class.to_string(), *limit))
			.collect();

		Self {
			network,
			partitions,
			connections,
			default_network: NetworkLimit::new(
				DEFAULT_NETWORK_LIMIT_MB_PER_SEC,
				DEFAULT_NETWORK_LIMIT_MB_PER_SEC,
			),
			default_partitions: DEFAULT_PARTITION_LIMIT,
			default_connections: DEFAULT_CONNECTION_LIMIT,
		}
	}
}

impl CapacityTable {
	/// Per-broker network bandwidth; unknown classes fall back to 10/10 MB/s
	pub fn network_limit(&self, instance_class: &str) -> NetworkLimit {
		self.network
			.get(instance_class)
			.copied()
			.unwrap_or(self.default_network)
	}

	/// Recommended partitions per broker, including replicas
	pub fn partition_limit(&self, instance_class: &str) -> u32 {
		self.partitions
			.get(instance_class)
			.copied()
			.unwrap_or(self.default_partitions)
	}

	/// Client connections per broker
	pub fn connection_limit(&self, instance_class: &str) -> u32 {
		self.connections
			.get(instance_class)
			.copied()
			.unwrap_or(self.default_connections)
	}

	pub fn with_network_limit(mut self, instance_class: &str, limit: NetworkLimit) -> Self {
		self.network.insert(instance_class.to_string(), limit);
		self
	}

	pub fn with_partition_limit(mut self, instance_class: &str, limit: u32) -> Self {
		self.partitions.insert(instance_class.to_string(), limit);
		self
	}

	pub fn with_connection_limit(mut self, instance_class: &str, limit: u32) -> Self {
		self.connections.insert(instance_class.to_string(), limit);
		self
	}
}
