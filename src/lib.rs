//! MSK Health Check Library
//!
//! Automated health assessment for managed Kafka clusters: collects historical
//! telemetry concurrently, evaluates a fixed catalog of rules and rolls the
//! findings up into a weighted 0-100 health score.

use std::sync::Arc;
use std::time::Duration;

use mhc_config::{log_analysis_complete, log_run_parameters, ConfigLoadError};
use thiserror::Error;
use tracing::info;

// Core domain types - the most commonly used types
pub use mhc_types::{
	// External dependencies for convenience
	chrono,
	serde_json,
	// Primary domain entities
	AnalysisResult,
	CapacityClass,
	CapacityTable,
	Category,
	ClusterDescriptor,
	// Collaborator traits
	ClusterDescriptorProvider,
	// Error types
	DescriptorError,
	Finding,
	MetricCatalog,
	MetricSeries,
	MetricsCollection,
	Severity,
	SuppressionThresholds,
	TelemetryError,
	TelemetryQuery,
	TelemetryResponse,
	TelemetrySource,
	TimeWindow,
};

// Service layer
pub use mhc_service::{
	calculate_health_score, AnalysisEngine, CollectionOutcome, CollectionStats, CollectorConfig,
	RetryPolicy, Rule, RuleRegistry, TelemetryCollector,
};

// Adapters
pub use mhc_adapters::{SnapshotError, SnapshotTelemetrySource};

// Config
pub use mhc_config::{load_config, log_service_info, ConfigValidationError, Settings};

pub mod models {
	pub use mhc_types::*;
}

pub mod config {
	pub use mhc_config::*;
}

pub mod adapters {
	pub use mhc_adapters::*;
}

pub mod service {
	pub use mhc_service::*;
}

// Re-export for custom telemetry sources
pub use async_trait;

/// Fatal errors while assembling or starting a health check
#[derive(Error, Debug)]
pub enum HealthCheckError {
	#[error("No telemetry source configured; set source.snapshot_path or call with_source")]
	MissingSource,

	#[error("No cluster descriptor provider configured")]
	MissingDescriptorProvider,

	#[error("Invalid settings: {0}")]
	InvalidSettings(#[from] ConfigValidationError),

	#[error("Failed to load configuration: {0}")]
	Config(#[from] ConfigLoadError),

	#[error("Failed to load snapshot: {0}")]
	Snapshot(#[from] SnapshotError),

	#[error("Failed to describe cluster: {0}")]
	Descriptor(#[from] DescriptorError),

	#[error("Failed to initialize logging: {0}")]
	Logging(String),
}

/// Collector tuning derived from the collection settings
pub fn collector_config(settings: &mhc_config::CollectionSettings) -> CollectorConfig {
	CollectorConfig {
		max_concurrency: settings.max_concurrency,
		period_seconds: settings.period_seconds,
		retry: RetryPolicy::new(
			settings.max_retries,
			Duration::from_millis(settings.base_backoff_ms),
		),
	}
}

/// Builder pattern for configuring a health check run
#[derive(Default)]
pub struct HealthCheckBuilder {
	settings: Option<Settings>,
	source: Option<Arc<dyn TelemetrySource>>,
	descriptor_provider: Option<Arc<dyn ClusterDescriptorProvider>>,
	capacity: Option<CapacityTable>,
	registry: Option<RuleRegistry>,
}

impl HealthCheckBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set custom settings
	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Get the current settings
	pub fn settings(&self) -> Option<&Settings> {
		self.settings.as_ref()
	}

	/// Telemetry source queried by the collector
	pub fn with_source(mut self, source: Arc<dyn TelemetrySource>) -> Self {
		self.source = Some(source);
		self
	}

	pub fn with_descriptor_provider(mut self, provider: Arc<dyn ClusterDescriptorProvider>) -> Self {
		self.descriptor_provider = Some(provider);
		self
	}

	/// Use one snapshot as both telemetry source and descriptor provider
	pub fn with_snapshot(self, snapshot: SnapshotTelemetrySource) -> Self {
		let snapshot = Arc::new(snapshot);
		self.with_source(Arc::clone(&snapshot) as Arc<dyn TelemetrySource>)
			.with_descriptor_provider(snapshot as Arc<dyn ClusterDescriptorProvider>)
	}

	/// Override the per-instance-class capacity limits
	pub fn with_capacity_table(mut self, capacity: CapacityTable) -> Self {
		self.capacity = Some(capacity);
		self
	}

	/// Replace the standard rule catalog
	pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
		self.registry = Some(registry);
		self
	}

	/// Validate the settings and wire the collector and the engine
	///
	/// A snapshot named in `source.snapshot_path` fills whichever of the source
	/// and the descriptor provider was not set explicitly.
	pub fn build(self) -> Result<HealthCheck, HealthCheckError> {
		let settings = self.settings.unwrap_or_default();
		settings.validate()?;

		let mut source = self.source;
		let mut descriptor_provider = self.descriptor_provider;
		if source.is_none() || descriptor_provider.is_none() {
			if let Some(path) = &settings.source.snapshot_path {
				let snapshot = Arc::new(SnapshotTelemetrySource::from_path(path)?);
				source.get_or_insert_with(|| Arc::clone(&snapshot) as Arc<dyn TelemetrySource>);
				descriptor_provider
					.get_or_insert_with(|| snapshot as Arc<dyn ClusterDescriptorProvider>);
			}
		}
		let source = source.ok_or(HealthCheckError::MissingSource)?;
		let descriptor_provider =
			descriptor_provider.ok_or(HealthCheckError::MissingDescriptorProvider)?;

		let collector = TelemetryCollector::new(source, collector_config(&settings.collection));

		let mut engine = AnalysisEngine::new(settings.analysis.recommended_version.clone())
			.with_suppression(settings.analysis.suppression);
		if let Some(capacity) = self.capacity {
			engine = engine.with_capacity_table(capacity);
		}
		if let Some(registry) = self.registry {
			engine = engine.with_registry(registry);
		}

		Ok(HealthCheck {
			settings,
			collector,
			descriptor_provider,
			engine,
		})
	}

	/// Build and run once
	pub async fn run(self) -> Result<AnalysisResult, HealthCheckError> {
		self.build()?.run().await
	}

	/// Run with the full startup sequence used by the binary
	///
	/// Loads `.env`, reads configuration unless settings were provided,
	/// initializes tracing and logs the service banner before running.
	pub async fn run_with_defaults(mut self) -> Result<AnalysisResult, HealthCheckError> {
		dotenvy::dotenv().ok();

		let settings = match self.settings.take() {
			Some(settings) => settings,
			None => load_config()?,
		};

		init_tracing_from_settings(&settings)?;
		log_service_info();
		info!("Configuration loaded successfully");

		self.settings = Some(settings);
		self.run().await
	}
}

/// Initialize tracing with configuration-based settings
///
/// `RUST_LOG` takes precedence over `logging.level`.
pub fn init_tracing_from_settings(settings: &Settings) -> Result<(), HealthCheckError> {
	use mhc_config::LogFormat;

	let log_level = &settings.logging.level;
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	let result = match settings.logging.format {
		LogFormat::Json => {
			let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);

			if settings.logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
		LogFormat::Pretty => {
			let subscriber = tracing_subscriber::fmt()
				.pretty()
				.with_env_filter(env_filter);

			if settings.logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
		LogFormat::Compact => {
			let subscriber = tracing_subscriber::fmt()
				.compact()
				.with_env_filter(env_filter);

			if settings.logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
	};
	result.map_err(|e| HealthCheckError::Logging(e.to_string()))?;

	info!(
		"Logging configuration applied: level={}, format={:?}, structured={}",
		settings.logging.level, settings.logging.format, settings.logging.structured
	);

	Ok(())
}

/// A wired health check: describe, collect, analyze
///
/// Reusable; every [`run`](Self::run) describes the cluster again and collects
/// a fresh window ending now.
pub struct HealthCheck {
	settings: Settings,
	collector: TelemetryCollector,
	descriptor_provider: Arc<dyn ClusterDescriptorProvider>,
	engine: AnalysisEngine,
}

impl HealthCheck {
	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn engine(&self) -> &AnalysisEngine {
		&self.engine
	}

	pub fn collector(&self) -> &TelemetryCollector {
		&self.collector
	}

	/// Describe the cluster, collect its telemetry and analyze it
	///
	/// Only a descriptor failure aborts the run; telemetry gaps surface as
	/// missing metrics and skipped rules.
	pub async fn run(&self) -> Result<AnalysisResult, HealthCheckError> {
		let descriptor = self.descriptor_provider.describe_cluster().await?;
		log_run_parameters(
			&descriptor.cluster_name,
			descriptor.entity_count,
			&self.settings,
		);

		let collection_settings = &self.settings.collection;
		let catalog = MetricCatalog::for_capacity_class(descriptor.capacity_class)
			.with_namespace(&collection_settings.namespace);
		let window = TimeWindow::last_days(collection_settings.days_back);

		let collection = self
			.collector
			.collect(
				window,
				&descriptor.cluster_name,
				descriptor.entity_count,
				&catalog,
			)
			.await;

		let result = self.engine.analyze(descriptor, collection);
		log_analysis_complete(
			result.findings().len(),
			result.actionable_findings().len(),
			result.health_score(),
		);

		Ok(result)
	}
}
