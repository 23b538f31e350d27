//! Rule seam and the inputs every rule reads

use mhc_types::{
	CapacityTable, ClusterDescriptor, Finding, MetricSeries, MetricsCollection,
	SuppressionThresholds,
};
use std::fmt::Debug;

/// Series a rule needs before it is worth running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
	/// Reads only the descriptor
	Descriptor,
	/// The cluster-wide series of one metric
	ClusterSeries(&'static str),
	/// At least one entity series of one metric
	EntitySeries(&'static str),
	/// A cluster or an entity series of any of the listed metrics
	AnySeries(&'static [&'static str]),
	/// Entity series for every listed metric
	AllEntitySeries(&'static [&'static str]),
}

impl Requirement {
	pub fn is_satisfied(&self, collection: &MetricsCollection) -> bool {
		match self {
			Requirement::Descriptor => true,
			Requirement::ClusterSeries(name) => collection.cluster_series(name).is_some(),
			Requirement::EntitySeries(name) => has_entity_series(collection, name),
			Requirement::AnySeries(names) => {
				names.iter().any(|name| !collection.series(name).is_empty())
			},
			Requirement::AllEntitySeries(names) => {
				names.iter().all(|name| has_entity_series(collection, name))
			},
		}
	}
}

fn has_entity_series(collection: &MetricsCollection, name: &str) -> bool {
	collection
		.series(name)
		.iter()
		.any(|series| !series.is_cluster_level())
}

/// Read-only inputs handed to every rule
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
	pub collection: &'a MetricsCollection,
	pub descriptor: &'a ClusterDescriptor,
	pub capacity: &'a CapacityTable,
	pub suppression: &'a SuppressionThresholds,
	/// `major.minor` version clusters are compared against
	pub recommended_version: &'a str,
}

impl<'a> RuleContext<'a> {
	pub fn cluster_series(&self, metric_name: &str) -> Option<&'a MetricSeries> {
		self.collection.cluster_series(metric_name)
	}

	pub fn entity_series(&self, metric_name: &str) -> Vec<&'a MetricSeries> {
		self.collection.entity_series(metric_name)
	}

	pub fn partition_limit(&self) -> u32 {
		self.capacity.partition_limit(&self.descriptor.instance_class)
	}

	pub fn connection_limit(&self) -> u32 {
		self.capacity.connection_limit(&self.descriptor.instance_class)
	}
}

/// One entry of the rule catalog
///
/// Rules are pure: the same context always yields the same findings, and a
/// rule never observes the output of another rule.
pub trait Rule: Send + Sync + Debug {
	/// Stable identifier used in logs
	fn name(&self) -> &str;

	fn requirement(&self) -> Requirement;

	/// Whether the rule makes sense for this cluster at all
	fn applies_to(&self, _descriptor: &ClusterDescriptor) -> bool {
		true
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding>;
}
