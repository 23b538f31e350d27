//! Cluster descriptor and its attribute types
//!
//! The descriptor is fetched once before collection starts and is read-only
//! afterwards: the collector takes the entity count from it and most rules
//! consult its capacity and configuration attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod version;

pub use version::{SoftwareVersion, VersionParseError};

/// Processor families built on ARM (Graviton) cores
const GRAVITON_FAMILIES: [&str; 7] = ["m6g", "m7g", "c6g", "c7g", "r6g", "r7g", "t4g"];

/// Provisioning mode of a cluster
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapacityClass {
	/// Brokers with explicitly provisioned storage volumes
	#[default]
	Provisioned,
	/// Brokers without provisioned storage
	Express,
}

impl CapacityClass {
	/// Infer the class from an instance class string such as `express.m7g.large`
	pub fn from_instance_class(instance_class: &str) -> Self {
		if instance_class.to_ascii_lowercase().contains("express") {
			CapacityClass::Express
		} else {
			CapacityClass::Provisioned
		}
	}

	pub fn has_provisioned_storage(&self) -> bool {
		matches!(self, CapacityClass::Provisioned)
	}
}

impl std::fmt::Display for CapacityClass {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CapacityClass::Provisioned => write!(f, "PROVISIONED"),
			CapacityClass::Express => write!(f, "EXPRESS"),
		}
	}
}

/// Client authentication mechanisms
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuthMethod {
	#[serde(rename = "IAM")]
	Iam,
	#[serde(rename = "SASL/SCRAM")]
	SaslScram,
	#[serde(rename = "mTLS")]
	Mtls,
	#[serde(rename = "unauthenticated")]
	Unauthenticated,
}

impl AuthMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			AuthMethod::Iam => "IAM",
			AuthMethod::SaslScram => "SASL/SCRAM",
			AuthMethod::Mtls => "mTLS",
			AuthMethod::Unauthenticated => "unauthenticated",
		}
	}
}

impl std::fmt::Display for AuthMethod {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Processor family of the broker instances
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InstanceFamily {
	Graviton,
	Intel,
}

impl InstanceFamily {
	/// Detect the family from `kafka.m7g.large` or `express.m7g.large` style names
	pub fn from_instance_class(instance_class: &str) -> Self {
		let is_graviton = GRAVITON_FAMILIES.iter().any(|family| {
			instance_class.contains(&format!(".{}.", family))
				|| instance_class.ends_with(&format!(".{}", family))
		});
		if is_graviton {
			InstanceFamily::Graviton
		} else {
			InstanceFamily::Intel
		}
	}
}

/// Broker log delivery targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogDestination {
	CloudWatch,
	S3,
	Firehose,
}

impl std::fmt::Display for LogDestination {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			LogDestination::CloudWatch => write!(f, "CloudWatch"),
			LogDestination::S3 => write!(f, "S3"),
			LogDestination::Firehose => write!(f, "Firehose"),
		}
	}
}

/// Capacity and configuration attributes of one cluster
///
/// When `capacity_class` is absent from serialized input it is inferred from
/// `instance_class`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "RawClusterDescriptor")]
pub struct ClusterDescriptor {
	pub cluster_name: String,
	pub cluster_arn: Option<String>,
	pub capacity_class: CapacityClass,
	pub instance_class: String,
	pub entity_count: u32,
	pub availability_zones: u32,
	pub authentication_methods: BTreeSet<AuthMethod>,
	pub storage_autoscaling_enabled: bool,
	pub logging_enabled: bool,
	pub logging_destinations: Vec<LogDestination>,
	pub software_version: String,
	/// Only meaningful for [`CapacityClass::Express`]
	pub intelligent_rebalancing_enabled: bool,
}

/// Wire form of [`ClusterDescriptor`] with optional fields left open
#[derive(Deserialize)]
struct RawClusterDescriptor {
	cluster_name: String,
	#[serde(default)]
	cluster_arn: Option<String>,
	#[serde(default)]
	capacity_class: Option<CapacityClass>,
	instance_class: String,
	entity_count: u32,
	availability_zones: u32,
	#[serde(default)]
	authentication_methods: BTreeSet<AuthMethod>,
	#[serde(default)]
	storage_autoscaling_enabled: bool,
	#[serde(default)]
	logging_enabled: bool,
	#[serde(default)]
	logging_destinations: Vec<LogDestination>,
	software_version: String,
	#[serde(default)]
	intelligent_rebalancing_enabled: bool,
}

impl From<RawClusterDescriptor> for ClusterDescriptor {
	fn from(raw: RawClusterDescriptor) -> Self {
		let capacity_class = raw
			.capacity_class
			.unwrap_or_else(|| CapacityClass::from_instance_class(&raw.instance_class));
		Self {
			cluster_name: raw.cluster_name,
			cluster_arn: raw.cluster_arn,
			capacity_class,
			instance_class: raw.instance_class,
			entity_count: raw.entity_count,
			availability_zones: raw.availability_zones,
			authentication_methods: raw.authentication_methods,
			storage_autoscaling_enabled: raw.storage_autoscaling_enabled,
			logging_enabled: raw.logging_enabled,
			logging_destinations: raw.logging_destinations,
			software_version: raw.software_version,
			intelligent_rebalancing_enabled: raw.intelligent_rebalancing_enabled,
		}
	}
}

impl ClusterDescriptor {
	/// Descriptor with the capacity class inferred from `instance_class`
	pub fn new(
		cluster_name: impl Into<String>,
		instance_class: impl Into<String>,
		entity_count: u32,
		software_version: impl Into<String>,
	) -> Self {
		let instance_class = instance_class.into();
		Self {
			cluster_name: cluster_name.into(),
			cluster_arn: None,
			capacity_class: CapacityClass::from_instance_class(&instance_class),
			instance_class,
			entity_count,
			availability_zones: 3,
			authentication_methods: BTreeSet::new(),
			storage_autoscaling_enabled: false,
			logging_enabled: false,
			logging_destinations: Vec::new(),
			software_version: software_version.into(),
			intelligent_rebalancing_enabled: false,
		}
	}

	pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
		self.cluster_arn = Some(arn.into());
		self
	}

	pub fn with_availability_zones(mut self, zones: u32) -> Self {
		self.availability_zones = zones;
		self
	}

	pub fn with_auth_methods(mut self, methods: impl IntoIterator<Item = AuthMethod>) -> Self {
		self.authentication_methods = methods.into_iter().collect();
		self
	}

	pub fn with_storage_autoscaling(mut self, enabled: bool) -> Self {
		self.storage_autoscaling_enabled = enabled;
		self
	}

	/// Enable logging to the given destinations; an empty list disables it
	pub fn with_logging(mut self, destinations: Vec<LogDestination>) -> Self {
		self.logging_enabled = !destinations.is_empty();
		self.logging_destinations = destinations;
		self
	}

	pub fn with_intelligent_rebalancing(mut self, enabled: bool) -> Self {
		self.intelligent_rebalancing_enabled = enabled;
		self
	}

	pub fn instance_family(&self) -> InstanceFamily {
		InstanceFamily::from_instance_class(&self.instance_class)
	}

	pub fn is_express(&self) -> bool {
		self.capacity_class == CapacityClass::Express
	}

	pub fn has_auth_method(&self, method: AuthMethod) -> bool {
		self.authentication_methods.contains(&method)
	}
}
