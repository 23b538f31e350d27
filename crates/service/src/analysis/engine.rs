//! Analysis engine: runs the rule catalog over one collection

use super::rules::{
	AuthenticationRule, AvailabilityZoneRule, ConnectionChurnRule, ConnectionCountRule,
	ControllerRule, CpuTotalRule, CreationRateRule, DiskUsageRule, GlobalPartitionRule,
	HeapMemoryRule, ImbalanceRule, InstanceFamilyRule, LoggingRule, MemoryUtilizationRule,
	OfflinePartitionsRule, PartitionCapacityRule, SoftwareVersionRule, StorageAutoScalingRule,
	ThroughputRule, TopicCountRule, UnderMinIsrRule, UnderReplicatedRule,
};
use super::scoring::calculate_health_score;
use super::{Rule, RuleContext};
use mhc_types::constants::limits::DEFAULT_RECOMMENDED_VERSION;
use mhc_types::{
	names, AnalysisResult, CapacityTable, ClusterDescriptor, Finding, MetricsCollection,
	SuppressionThresholds,
};
use tracing::{debug, info};

/// Ordered set of rules, built once and iterated in declaration order
#[derive(Debug, Default)]
pub struct RuleRegistry {
	rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
	pub fn empty() -> Self {
		Self::default()
	}

	/// The full catalog in its documented evaluation order
	pub fn standard() -> Self {
		let mut registry = Self::empty();

		registry
			.register(ControllerRule)
			.register(GlobalPartitionRule)
			.register(TopicCountRule)
			.register(OfflinePartitionsRule)
			.register(ConnectionCountRule);

		// Per-broker block, in catalog order
		for metric in [
			names::CPU_USER,
			names::CPU_SYSTEM,
			names::CPU_IDLE,
			names::MEMORY_USED,
			names::MEMORY_FREE,
		] {
			registry.register(ImbalanceRule::new(metric));
		}
		registry
			.register(MemoryUtilizationRule)
			.register(HeapMemoryRule)
			.register(ImbalanceRule::new(names::HEAP_MEMORY_AFTER_GC))
			.register(DiskUsageRule)
			.register(ImbalanceRule::new(names::KAFKA_DATA_LOGS_DISK_USED))
			.register(ImbalanceRule::new(names::LEADER_COUNT))
			.register(PartitionCapacityRule)
			.register(ImbalanceRule::new(names::PARTITION_COUNT))
			.register(UnderMinIsrRule)
			.register(UnderReplicatedRule);
		for metric in [
			names::BYTES_IN_PER_SEC,
			names::BYTES_OUT_PER_SEC,
			names::MESSAGES_IN_PER_SEC,
			names::CONNECTION_COUNT,
		] {
			registry.register(ImbalanceRule::new(metric));
		}
		registry.register(CreationRateRule);

		registry
			.register(CpuTotalRule)
			.register(ThroughputRule)
			.register(ConnectionChurnRule)
			.register(AuthenticationRule)
			.register(InstanceFamilyRule)
			.register(SoftwareVersionRule)
			.register(AvailabilityZoneRule)
			.register(StorageAutoScalingRule)
			.register(LoggingRule);

		registry
	}

	/// Append a rule; it runs after every rule registered before it
	pub fn register<R: Rule + 'static>(&mut self, rule: R) -> &mut Self {
		self.rules.push(Box::new(rule));
		self
	}

	pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
		self.rules.iter().map(|rule| rule.as_ref())
	}

	pub fn names(&self) -> Vec<&str> {
		self.iter().map(|rule| rule.name()).collect()
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}

/// Evaluates every applicable rule and scores the result
///
/// The engine holds no per-run state; one instance can analyze any number of
/// clusters.
#[derive(Debug)]
pub struct AnalysisEngine {
	registry: RuleRegistry,
	capacity: CapacityTable,
	suppression: SuppressionThresholds,
	recommended_version: String,
}

impl Default for AnalysisEngine {
	fn default() -> Self {
		Self::new(DEFAULT_RECOMMENDED_VERSION)
	}
}

impl AnalysisEngine {
	/// Engine with the standard catalog and default capacity tables
	pub fn new(recommended_version: impl Into<String>) -> Self {
		Self {
			registry: RuleRegistry::standard(),
			capacity: CapacityTable::default(),
			suppression: SuppressionThresholds::default(),
			recommended_version: recommended_version.into(),
		}
	}

	pub fn with_capacity_table(mut self, capacity: CapacityTable) -> Self {
		self.capacity = capacity;
		self
	}

	pub fn with_suppression(mut self, suppression: SuppressionThresholds) -> Self {
		self.suppression = suppression;
		self
	}

	pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
		self.registry = registry;
		self
	}

	pub fn registry(&self) -> &RuleRegistry {
		&self.registry
	}

	pub fn recommended_version(&self) -> &str {
		&self.recommended_version
	}

	/// Findings of every rule whose inputs are present, in registry order
	pub fn evaluate(
		&self,
		descriptor: &ClusterDescriptor,
		collection: &MetricsCollection,
	) -> Vec<Finding> {
		let ctx = RuleContext {
			collection,
			descriptor,
			capacity: &self.capacity,
			suppression: &self.suppression,
			recommended_version: &self.recommended_version,
		};

		let mut findings = Vec::new();
		for rule in self.registry.iter() {
			if !rule.applies_to(descriptor) {
				debug!(
					"Skipping rule {} for {} cluster",
					rule.name(),
					descriptor.capacity_class
				);
				continue;
			}
			if !rule.requirement().is_satisfied(collection) {
				debug!("Skipping rule {}: inputs not collected", rule.name());
				continue;
			}

			let produced = rule.evaluate(&ctx);
			debug!("Rule {} produced {} findings", rule.name(), produced.len());
			findings.extend(produced);
		}
		findings
	}

	/// Run the catalog, score the findings and package everything as a result
	pub fn analyze(
		&self,
		descriptor: ClusterDescriptor,
		collection: MetricsCollection,
	) -> AnalysisResult {
		let findings = self.evaluate(&descriptor, &collection);
		let health_score = calculate_health_score(&findings);

		info!(
			"Analysis complete: {} findings, health score: {}",
			findings.len(),
			health_score
		);

		AnalysisResult::new(descriptor, collection, findings, health_score)
	}
}
