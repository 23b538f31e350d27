//! Tests for the HealthCheckBuilder and full runs

use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use msk_health_check::adapters::{SnapshotFile, SnapshotSeries};
use msk_health_check::models::names;
use msk_health_check::{
	ClusterDescriptorProvider, ConfigValidationError, DescriptorError, HealthCheckBuilder,
	HealthCheckError, RuleRegistry, Settings, Severity, SnapshotTelemetrySource, TelemetrySource,
};

mod mocks;
use mocks::{FixedDescriptorProvider, Fixtures};

fn fast_settings() -> Settings {
	let mut settings = Settings::default();
	settings.collection.days_back = 7;
	settings.collection.base_backoff_ms = 10;
	settings
}

fn snapshot_file(serverless: bool) -> SnapshotFile {
	let descriptor = Fixtures::provisioned_descriptor(2);
	let mut series = vec![SnapshotSeries {
		metric: names::ACTIVE_CONTROLLER_COUNT.to_string(),
		entity: None,
		label: "Count".to_string(),
		datapoints: Fixtures::response(&[1.0, 1.0]).datapoints,
	}];
	for broker in 1..=2 {
		series.push(SnapshotSeries {
			metric: names::KAFKA_DATA_LOGS_DISK_USED.to_string(),
			entity: Some(broker),
			label: "Percent".to_string(),
			datapoints: Fixtures::response(&[91.0, 92.0]).datapoints,
		});
	}
	SnapshotFile {
		descriptor,
		serverless,
		series,
	}
}

#[test]
fn test_builder_new() {
	let builder = HealthCheckBuilder::new();
	assert!(builder.settings().is_none());
}

#[test]
fn test_builder_with_settings() {
	let builder = HealthCheckBuilder::new().with_settings(fast_settings());
	assert_eq!(builder.settings().map(|s| s.collection.days_back), Some(7));
}

#[test]
fn test_build_without_source_fails() {
	let err = HealthCheckBuilder::new().build().err().unwrap();
	assert!(matches!(err, HealthCheckError::MissingSource));
}

#[test]
fn test_build_without_descriptor_provider_fails() {
	let descriptor = Fixtures::provisioned_descriptor(3);
	let source = Arc::new(Fixtures::healthy_source(&descriptor));

	let err = HealthCheckBuilder::new()
		.with_source(source as Arc<dyn TelemetrySource>)
		.build()
		.err()
		.unwrap();
	assert!(matches!(err, HealthCheckError::MissingDescriptorProvider));
}

#[test]
fn test_build_rejects_invalid_settings() {
	let mut settings = fast_settings();
	settings.collection.max_concurrency = 0;

	let err = HealthCheckBuilder::new()
		.with_settings(settings)
		.build()
		.err()
		.unwrap();
	assert!(matches!(
		err,
		HealthCheckError::InvalidSettings(ConfigValidationError::InvalidConcurrency { .. })
	));
}

#[tokio::test]
async fn test_run_with_injected_collaborators() {
	let descriptor = Fixtures::provisioned_descriptor(3);
	let source = Arc::new(Fixtures::healthy_source(&descriptor));
	let provider = Arc::new(FixedDescriptorProvider::new(descriptor));

	let health_check = HealthCheckBuilder::new()
		.with_settings(fast_settings())
		.with_source(Arc::clone(&source) as Arc<dyn TelemetrySource>)
		.with_descriptor_provider(Arc::clone(&provider) as Arc<dyn ClusterDescriptorProvider>)
		.build()
		.unwrap();

	let first = health_check.run().await.unwrap();
	let second = health_check.run().await.unwrap();

	assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
	assert_eq!(source.total_calls(), 2 * 58);
	assert_eq!(first.findings(), second.findings());
	assert_eq!(first.health_score(), second.health_score());
	assert_eq!(first.descriptor().cluster_name, "orders");
}

#[tokio::test]
async fn test_serverless_cluster_is_rejected() {
	let descriptor = Fixtures::provisioned_descriptor(3);
	let source = Arc::new(Fixtures::healthy_source(&descriptor));
	let provider = Arc::new(FixedDescriptorProvider::serverless(descriptor));

	let err = HealthCheckBuilder::new()
		.with_settings(fast_settings())
		.with_source(Arc::clone(&source) as Arc<dyn TelemetrySource>)
		.with_descriptor_provider(provider as Arc<dyn ClusterDescriptorProvider>)
		.run()
		.await
		.unwrap_err();

	assert!(matches!(
		err,
		HealthCheckError::Descriptor(DescriptorError::UnsupportedServerless { .. })
	));
	// Nothing is collected for a cluster that cannot be analyzed
	assert_eq!(source.total_calls(), 0);
}

#[tokio::test]
async fn test_run_from_snapshot_path() {
	let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
	write!(file, "{}", serde_json::to_string(&snapshot_file(false)).unwrap()).unwrap();

	let mut settings = fast_settings();
	settings.source.snapshot_path = Some(file.path().to_path_buf());

	let result = HealthCheckBuilder::new()
		.with_settings(settings)
		.run()
		.await
		.unwrap();

	let disk_critical: Vec<&str> = result
		.findings_with_severity(Severity::Critical)
		.filter(|f| f.metric_name == names::KAFKA_DATA_LOGS_DISK_USED)
		.map(|f| f.title.as_str())
		.collect();
	assert_eq!(
		disk_critical,
		vec!["High Disk Usage - Broker 1", "High Disk Usage - Broker 2"]
	);
	// Only the controller was recorded among the cluster-level metrics
	assert_eq!(result.collection().missing().len(), 3);
	assert!(result.health_score() < 100.0);
}

#[tokio::test]
async fn test_run_with_snapshot_and_custom_registry() {
	let snapshot = SnapshotTelemetrySource::from_snapshot(snapshot_file(false)).unwrap();
	let mut registry = RuleRegistry::empty();
	registry.register(msk_health_check::service::analysis::rules::ControllerRule);

	let result = HealthCheckBuilder::new()
		.with_settings(fast_settings())
		.with_snapshot(snapshot)
		.with_registry(registry)
		.run()
		.await
		.unwrap();

	assert_eq!(result.findings().len(), 1);
	assert_eq!(result.findings()[0].title, "Active Controller Count Normal");
	assert_eq!(result.health_score(), 100.0);
}

#[tokio::test]
async fn test_missing_snapshot_file_fails_build() {
	let dir = tempfile::tempdir().unwrap();
	let mut settings = fast_settings();
	settings.source.snapshot_path = Some(dir.path().join("absent.json"));

	let err = HealthCheckBuilder::new()
		.with_settings(settings)
		.build()
		.err()
		.unwrap();
	assert!(matches!(err, HealthCheckError::Snapshot(_)));
}
