//! Seams to the external telemetry API and cluster descriptor provider
//!
//! Implementations live outside the core; the collector and builder only talk
//! to these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod errors;

pub use errors::{DescriptorError, DescriptorResult, TelemetryError, TelemetryResult};

use crate::cluster::ClusterDescriptor;
use crate::metrics::{DataPoint, MetricDefinition, Statistic, TimeWindow};

/// Dimension name carrying the cluster name
pub const CLUSTER_NAME_DIMENSION: &str = "Cluster Name";

/// Dimension name carrying the broker id
pub const BROKER_ID_DIMENSION: &str = "Broker ID";

/// Name/value pair narrowing a telemetry query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Dimension {
	pub name: String,
	pub value: String,
}

impl Dimension {
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
		}
	}
}

/// One time-series request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryQuery {
	pub namespace: String,
	pub metric_name: String,
	pub dimensions: Vec<Dimension>,
	pub window: TimeWindow,
	pub period_seconds: u32,
	pub statistic: Statistic,
}

impl TelemetryQuery {
	/// Query for a catalog entry, scoped to one broker when `entity_id` is set
	pub fn for_metric(
		definition: &MetricDefinition,
		cluster_name: &str,
		entity_id: Option<u32>,
		window: TimeWindow,
		period_seconds: u32,
	) -> Self {
		let mut dimensions = vec![Dimension::new(CLUSTER_NAME_DIMENSION, cluster_name)];
		if let Some(id) = entity_id {
			dimensions.push(Dimension::new(BROKER_ID_DIMENSION, id.to_string()));
		}

		Self {
			namespace: definition.namespace.clone(),
			metric_name: definition.name.clone(),
			dimensions,
			window,
			period_seconds,
			statistic: definition.statistic,
		}
	}

	/// Broker id carried in the dimensions, if any
	pub fn entity_id(&self) -> Option<u32> {
		self.dimensions
			.iter()
			.find(|d| d.name == BROKER_ID_DIMENSION)
			.and_then(|d| d.value.parse().ok())
	}

	/// Value of the cluster name dimension
	pub fn cluster_name(&self) -> Option<&str> {
		self.dimensions
			.iter()
			.find(|d| d.name == CLUSTER_NAME_DIMENSION)
			.map(|d| d.value.as_str())
	}
}

/// Samples returned for one query, in whatever order the source produced them
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TelemetryResponse {
	/// Unit or label reported by the source
	#[serde(default)]
	pub label: String,
	#[serde(default)]
	pub datapoints: Vec<DataPoint>,
}

impl TelemetryResponse {
	pub fn new(label: impl Into<String>, datapoints: Vec<DataPoint>) -> Self {
		Self {
			label: label.into(),
			datapoints,
		}
	}

	pub fn empty() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.datapoints.is_empty()
	}
}

/// Fallible, rate-limited time-series API
#[async_trait]
pub trait TelemetrySource: Send + Sync + Debug {
	/// Fetch the samples for one query
	async fn query(&self, query: &TelemetryQuery) -> TelemetryResult<TelemetryResponse>;
}

/// Supplies the cluster descriptor once before analysis
#[async_trait]
pub trait ClusterDescriptorProvider: Send + Sync + Debug {
	async fn describe_cluster(&self) -> DescriptorResult<ClusterDescriptor>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::metrics::{names, MetricCatalog};
	use chrono::Utc;

	#[test]
	fn test_entity_query_carries_broker_dimension() {
		let catalog = MetricCatalog::standard();
		let definition = catalog.get(names::CPU_USER).unwrap();
		let query = TelemetryQuery::for_metric(
			definition,
			"orders",
			Some(2),
			TimeWindow::ending_at(Utc::now(), 1),
			3_600,
		);

		assert_eq!(query.dimensions.len(), 2);
		assert_eq!(query.entity_id(), Some(2));
		assert_eq!(query.cluster_name(), Some("orders"));
		assert_eq!(query.statistic, Statistic::Average);
	}

	#[test]
	fn test_cluster_query_has_single_dimension() {
		let catalog = MetricCatalog::standard();
		let definition = catalog.get(names::ACTIVE_CONTROLLER_COUNT).unwrap();
		let query = TelemetryQuery::for_metric(
			definition,
			"orders",
			None,
			TimeWindow::ending_at(Utc::now(), 1),
			3_600,
		);

		assert_eq!(query.dimensions.len(), 1);
		assert_eq!(query.entity_id(), None);
	}
}
