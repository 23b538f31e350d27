//! End-to-end tests: scripted telemetry collected and analyzed

use std::sync::Arc;

use msk_health_check::models::names;
use msk_health_check::{
	AnalysisEngine, AnalysisResult, Category, ClusterDescriptor, CollectorConfig, MetricCatalog,
	Severity, TelemetryCollector, TelemetrySource, TimeWindow,
};

mod mocks;
use mocks::{Fixtures, ScriptedTelemetrySource};

async fn analyze(descriptor: ClusterDescriptor, source: ScriptedTelemetrySource) -> AnalysisResult {
	let collector = TelemetryCollector::new(
		Arc::new(source) as Arc<dyn TelemetrySource>,
		CollectorConfig::default(),
	);
	let catalog = MetricCatalog::for_capacity_class(descriptor.capacity_class);
	let window = TimeWindow::ending_at(Fixtures::start(), 30);

	let collection = collector
		.collect(
			window,
			&descriptor.cluster_name,
			descriptor.entity_count,
			&catalog,
		)
		.await;
	AnalysisEngine::default().analyze(descriptor, collection)
}

fn titles(result: &AnalysisResult, severity: Severity) -> Vec<&str> {
	result
		.findings_with_severity(severity)
		.map(|f| f.title.as_str())
		.collect()
}

#[tokio::test]
async fn test_healthy_cluster_scores_high() {
	let descriptor = Fixtures::provisioned_descriptor(3);
	let source = Fixtures::healthy_source(&descriptor);

	let result = analyze(descriptor, source).await;

	assert!(titles(&result, Severity::Critical).is_empty());
	assert!(titles(&result, Severity::Warning).is_empty());
	assert!(result.health_score() >= 90.0, "score {}", result.health_score());
	assert!(result.health_score() <= 100.0);
	assert!(result.collection().missing().is_empty());
}

#[tokio::test]
async fn test_degraded_cluster_reports_per_broker_findings() {
	let descriptor = Fixtures::provisioned_descriptor(3);
	let source = Fixtures::healthy_source(&descriptor)
		.with_series(names::ACTIVE_CONTROLLER_COUNT, None, &[1.0, 0.0, 1.0])
		.with_series(names::KAFKA_DATA_LOGS_DISK_USED, Some(1), &[85.0, 86.0])
		.with_series(names::UNDER_REPLICATED_PARTITIONS, Some(2), &[0.0, 4.0, 0.0]);

	let result = analyze(descriptor, source).await;
	let critical = titles(&result, Severity::Critical);

	assert!(critical.contains(&"Active Controller Count Dropped Below 1"));
	assert!(critical.iter().any(|t| t.ends_with("- Broker 1") && t.contains("Disk")));
	assert!(result
		.findings()
		.iter()
		.any(|f| f.metric_name == names::UNDER_REPLICATED_PARTITIONS
			&& f.title.ends_with("- Broker 2")
			&& !f.is_healthy()));

	// Rule order: the controller check always comes first
	assert_eq!(result.findings()[0].metric_name, names::ACTIVE_CONTROLLER_COUNT);
	assert!(result.health_score() < 90.0);
	assert!(result
		.findings_in_category(Category::Reliability)
		.any(|f| f.severity == Severity::Critical));
}

#[tokio::test]
async fn test_missing_metrics_skip_their_rules() {
	let descriptor = Fixtures::provisioned_descriptor(3);
	let source = ScriptedTelemetrySource::new()
		.with_series(names::CPU_USER, Some(1), &[10.0, 12.0])
		.with_series(names::CPU_USER, Some(2), &[11.0, 12.0]);

	let result = analyze(descriptor, source).await;

	// Every cluster-level metric came back empty
	assert_eq!(result.collection().missing().len(), 4);
	assert!(result
		.findings()
		.iter()
		.all(|f| f.metric_name != names::ACTIVE_CONTROLLER_COUNT
			&& f.metric_name != names::GLOBAL_PARTITION_COUNT));
	// CPU total needs both user and system series
	assert!(result.findings().iter().all(|f| f.metric_name != "CpuTotal"));
	assert!(result
		.findings()
		.iter()
		.any(|f| f.title == "CpuUser - Balanced Across Brokers"));
}

#[tokio::test]
async fn test_express_cluster_has_no_storage_findings() {
	let descriptor = Fixtures::express_descriptor(3);
	let source = Fixtures::healthy_source(&descriptor);

	let result = analyze(descriptor, source).await;

	assert!(result
		.findings()
		.iter()
		.all(|f| f.metric_name != names::KAFKA_DATA_LOGS_DISK_USED
			&& f.metric_name != "StorageAutoScaling"));
	assert!(titles(&result, Severity::Critical).is_empty());
}

#[tokio::test]
async fn test_outdated_unauthenticated_cluster() {
	let descriptor = ClusterDescriptor::new("legacy", "kafka.m5.large", 3, "2.8.1")
		.with_availability_zones(2)
		.with_auth_methods([msk_health_check::models::AuthMethod::Unauthenticated]);
	let source = Fixtures::healthy_source(&descriptor);

	let result = analyze(descriptor, source).await;
	let critical = titles(&result, Severity::Critical);

	assert!(critical.contains(&"Unauthenticated Access Enabled"));
	assert!(critical.contains(&"Kafka Version Severely Outdated"));
	assert!(titles(&result, Severity::Warning).contains(&"Two AZ Deployment"));
	assert!(titles(&result, Severity::Informational).contains(&"Graviton Migration Opportunity"));

	let actionable = result.actionable_findings();
	assert_eq!(actionable[0].severity, Severity::Critical);
}
